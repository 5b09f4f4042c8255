//! Lead pipeline workflows.
//!
//! Defines the [`Lead`](lead::Lead) table schema and the two workflows that
//! drive it: [`merge_prospects`](merge::merge_prospects) imports new
//! prospects, and [`run_stage`](enrich::run_stage) applies an enrichment
//! stage to candidate leads with per-record failure isolation.

pub mod batch;
pub mod enrich;
pub mod lead;
pub mod merge;
pub mod progress;
pub mod prompts;
pub mod scratch;
pub mod text;
pub mod youtube;

pub use enrich::{EnrichmentReport, EnrichmentStage, NameStage, OpenerStage, run_stage};
pub use lead::{Lead, LeadStatus};
pub use merge::{MergeReport, merge_prospects};
pub use progress::{Progress, SilentProgress};

#[cfg(test)]
pub(crate) fn test_table(server: &wiremock::MockServer) -> leadpipe_table::Table<Lead> {
    use std::sync::Arc;

    let options = leadpipe_http::ClientOptions::new()
        .with_host(&server.uri())
        .expect("mock server uri")
        .with_rate_limit(Arc::new(
            leadpipe_shared::RateLimiter::per_second(1000).expect("limiter"),
        ));
    let client = leadpipe_http::Client::new("key", options).expect("client");
    leadpipe_table::Table::new(client, "app1", "tbl1")
}
