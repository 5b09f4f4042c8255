//! Clients for the external services the pipeline reads from.
//!
//! Each service sits behind a trait so workflows can be driven by
//! in-memory fakes:
//! - [`ProspectSource`]: saved searches and their prospects
//! - [`VideoSource`]: a channel's uploads, newest first
//! - [`TranscriptSource`]: captions for a video
//! - [`CompletionSource`]: single-turn chat completions
//!
//! The concrete clients are thin adapters over [`leadpipe_http::Client`].

pub mod completion;
pub mod media;
pub mod prospects;
pub mod transcript;

pub use completion::{CompletionSource, OpenAiClient};
pub use media::{ChannelRef, MediaClient, Video, VideoSource};
pub use prospects::{Prospect, ProspectSource, ProspetyClient, Search, all_prospects};
pub use transcript::{Segment, Transcript, TranscriptClient, TranscriptSource};

#[cfg(test)]
pub(crate) fn test_client(server: &wiremock::MockServer) -> leadpipe_http::Client {
    use std::sync::Arc;

    let options = leadpipe_http::ClientOptions::new()
        .with_host(&server.uri())
        .expect("mock server uri")
        .with_rate_limit(Arc::new(
            leadpipe_shared::RateLimiter::per_second(1000).expect("limiter"),
        ));
    leadpipe_http::Client::new("key", options).expect("client")
}
