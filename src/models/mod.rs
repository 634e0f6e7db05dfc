pub mod catalog;
pub mod common;
pub mod pagination;
pub mod report;
pub mod ticket;

pub use catalog::*;
pub use common::*;
pub use pagination::*;
pub use report::*;
pub use ticket::*;
