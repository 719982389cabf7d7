//! Xcode acquisition: Apple developer login, download discovery, naming and
//! `.xip` unpacking.

mod apple_auth;
mod naming;
mod url_searcher;
mod xip;

pub use apple_auth::{AppleCookieDownloader, AppleDataGatherer};
pub use naming::{
    XcodeBuildNumberEmitter, XcodeFileNamer, XcodeNameInput, XcodeVersionEmitter, XcodeVersioner,
    derived_filename, split_version, xcode_filename,
};
pub use url_searcher::{AppleURLSearcher, Candidate, beta_link, matching_candidates, select_newest};
pub use xip::{XcodeXIPUnpacker, decode_pbzx};
