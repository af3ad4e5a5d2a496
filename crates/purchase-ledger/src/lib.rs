pub mod db;
pub mod ledger;
pub mod models;

pub use db::LedgerDb;
pub use ledger::SqliteLedger;
pub use models::PurchaseRow;
