pub mod contract;
pub mod envelope;
pub mod query;
pub mod transaction;
pub mod ui;
