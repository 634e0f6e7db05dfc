mod catalog;
mod ledger;

pub use catalog::PostgresCatalog;
pub use ledger::PostgresLedger;
