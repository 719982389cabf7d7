pub mod machine_output;
pub mod paths;
pub mod properties;
pub mod regex_cache;
pub mod versioning;
pub mod xml;
