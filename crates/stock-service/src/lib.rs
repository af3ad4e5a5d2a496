pub mod builder;
pub mod cache;
pub mod purchase;
pub mod service;

#[cfg(test)]
mod test_support;

pub use builder::PayloadBuilder;
pub use cache::{ResultCache, DEFAULT_CACHE_TTL};
pub use purchase::{parse_amount, AmountError, PurchaseError, PurchaseReceipt};
pub use service::StockService;
