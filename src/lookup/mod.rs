pub mod catalog_client;
pub mod stub_catalog;

pub use catalog_client::*;
pub use stub_catalog::*;
