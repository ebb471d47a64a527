//! Record management

pub mod cache;
pub mod manager;

pub use cache::RecordCache;
pub use manager::{parse_content, DataManager, DataPageState, DeleteOutcome, RecordForm};
