//! The processor collection.

pub mod android;
pub mod build;
pub mod chef;
pub mod files;
pub mod pkginfo;
pub mod providers;
pub mod versioners;
pub mod xcode;

use crate::core::Processor;
use crate::error::{ProcessorError, Result};
use std::fs;
use std::path::Path;

/// Every processor, in registry order.
pub fn all() -> Vec<Box<dyn Processor>> {
    vec![
        // URL and version discovery
        Box::new(providers::AcrolinxURLProvider),
        Box::new(providers::AdoptOpenJDKURLProvider),
        Box::new(providers::IntellijURLProvider),
        Box::new(xcode::AppleURLSearcher),
        Box::new(xcode::AppleDataGatherer),
        Box::new(xcode::AppleCookieDownloader),
        // version extraction
        Box::new(versioners::ConfigHeaderVersioner),
        Box::new(versioners::DateVersioner),
        Box::new(versioners::SQLDeveloperVersioner),
        Box::new(versioners::AndroidNDKVersioner),
        Box::new(pkginfo::PackageInfoVersioner),
        Box::new(pkginfo::MasterVersioner),
        Box::new(pkginfo::MoshVersioner),
        Box::new(android::AndroidSDKVersioner),
        Box::new(android::AndroidXMLParser),
        Box::new(android::AndroidExtraXMLParser),
        Box::new(xcode::XcodeVersioner),
        Box::new(xcode::XcodeFileNamer),
        Box::new(xcode::XcodeVersionEmitter),
        Box::new(xcode::XcodeBuildNumberEmitter),
        // unpacking and building
        Box::new(xcode::XcodeXIPUnpacker),
        Box::new(build::LinuxBinExtractor),
        Box::new(build::ConfigureMakeInstaller),
        // files and checksums
        Box::new(files::DirectoryList),
        Box::new(files::SubDirectoryList),
        Box::new(files::FileAppender),
        Box::new(files::HashOfFile),
        Box::new(files::SHAChecksum),
        Box::new(files::Rsync),
        Box::new(files::InstallsArrayFineTuning),
        // Chef blocks
        Box::new(chef::ChefFile),
        Box::new(chef::ChefCookbookFile),
        Box::new(chef::ChefLaunchd),
        Box::new(chef::ChefMacOSXUserDefaults),
        Box::new(chef::ChefRemotePackage),
        Box::new(chef::ChefTemplate),
        Box::new(chef::ChefRemoteDirectory),
        Box::new(chef::ChefArray),
        Box::new(chef::ChefAttributeList),
        Box::new(chef::ChefAttributeHash),
    ]
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ProcessorError::io(path, e))
}
