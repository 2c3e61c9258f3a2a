pub mod analyst;
pub mod proof;
pub mod prompt;
pub mod reply;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analyst::{Analyst, BatchItem};
pub use proof::ProofFetcher;
pub use prompt::{build_prompt, SYSTEM_INSTRUCTION};
pub use reply::ModelReply;
pub use traits::{ApifyPostScraper, OpenAiVerdictModel, PostScraper, VerdictModel};
