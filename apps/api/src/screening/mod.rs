// Candidate screening pipeline.
// Extraction → fit scoring (online, per application) and batch classification
// (bulk); the view engine and status machine operate on the merged records.
// Provider access goes through `crate::providers` traits only.

pub mod category;
pub mod error;
pub mod estimator;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod status;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;
