//! Chef text rendering.

mod attributes;
mod resource;

pub use attributes::{
    ChefArray, ChefAttributeHash, ChefAttributeList, array_block, attribute_hash, attribute_list,
};
pub use resource::{
    BlockStyle, ChefCookbookFile, ChefFile, ChefLaunchd, ChefMacOSXUserDefaults,
    ChefRemoteDirectory, ChefRemotePackage, ChefTemplate, render_block,
};
