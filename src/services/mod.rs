pub mod admission_service;
pub mod catalog_service;
pub mod report_service;

pub use admission_service::*;
pub use catalog_service::*;
pub use report_service::*;
