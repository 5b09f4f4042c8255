//! Video transcripts.

use std::future::Future;

use serde::{Deserialize, Serialize};

use leadpipe_http::Client;
use leadpipe_shared::Result;

/// One timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

/// Captions of one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Flatten the captions into one line of text.
    pub fn to_plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Fetches captions for a video.
pub trait TranscriptSource: Send + Sync {
    fn transcript(&self, video_id: &str) -> impl Future<Output = Result<Transcript>> + Send;
}

/// REST client for the transcript service.
#[derive(Debug, Clone)]
pub struct TranscriptClient {
    client: Client,
}

impl TranscriptClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl TranscriptSource for TranscriptClient {
    async fn transcript(&self, video_id: &str) -> Result<Transcript> {
        self.client
            .get_json(&["transcript"], &[("video_id", video_id)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_client;

    #[test]
    fn plain_text_joins_and_skips_blank_segments() {
        let transcript = Transcript {
            segments: vec![
                Segment { text: " hey everyone ".into(), start: 0.0, duration: 1.2 },
                Segment { text: "".into(), start: 1.2, duration: 0.4 },
                Segment { text: "welcome back".into(), start: 1.6, duration: 2.0 },
            ],
        };
        assert_eq!(transcript.to_plain_text(), "hey everyone welcome back");
    }

    #[test]
    fn empty_transcript_flattens_to_empty_string() {
        assert!(Transcript::default().to_plain_text().is_empty());
    }

    #[tokio::test]
    async fn fetches_by_video_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript"))
            .and(query_param("video_id", "vid1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "segments": [{"text": "first", "start": 0.0, "duration": 1.0}]
            })))
            .mount(&server)
            .await;

        let client = TranscriptClient::new(test_client(&server));
        let transcript = client.transcript("vid1").await.unwrap();
        assert_eq!(transcript.to_plain_text(), "first");
    }
}
