pub mod config;
pub mod logging;

pub mod archive;
pub mod asset;
pub mod checksum;
pub mod control;
pub mod error;
pub mod fetch;
pub mod link;
pub mod manifest;
pub mod provision;
