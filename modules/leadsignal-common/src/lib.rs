pub mod config;
pub mod enrichment;
pub mod error;
pub mod freshness;
pub mod lead;
pub mod types;

pub use config::Config;
pub use enrichment::enrich;
pub use error::{LeadSignalError, Result};
pub use freshness::compute_freshness;
pub use lead::{Lead, LeadField};
pub use types::*;
