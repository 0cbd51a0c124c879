pub mod check;
pub mod config;
pub mod error;
pub mod filter;
pub mod histogram;
pub mod stations;
pub mod stats;
pub mod subset;
pub mod summarize;
pub mod table;
pub mod trip;

pub use error::SummaryError;
