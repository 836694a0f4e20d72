pub mod csv_upload;

pub use csv_upload::*;
