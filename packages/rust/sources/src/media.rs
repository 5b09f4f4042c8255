//! Channel video listings.

use std::future::Future;

use serde::{Deserialize, Serialize};

use leadpipe_http::Client;
use leadpipe_shared::{LeadPipeError, Result};

/// How a channel is addressed: by its stable id or by its `@handle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelRef {
    Id(String),
    Handle(String),
}

impl ChannelRef {
    /// The bare id or handle, without any prefix.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Handle(handle) => handle,
        }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Handle(handle) => write!(f, "@{handle}"),
        }
    }
}

/// One uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Lists a channel's uploads, most recent first.
pub trait VideoSource: Send + Sync {
    fn channel_videos(&self, channel: &ChannelRef) -> impl Future<Output = Result<Vec<Video>>> + Send;

    /// The most recent upload. An empty channel is an error.
    fn latest_video(&self, channel: &ChannelRef) -> impl Future<Output = Result<Video>> + Send {
        async move {
            self.channel_videos(channel)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| LeadPipeError::enrichment(format!("no videos found for {channel}")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<Video>,
}

/// REST client for the media listing service.
#[derive(Debug, Clone)]
pub struct MediaClient {
    client: Client,
}

impl MediaClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl VideoSource for MediaClient {
    async fn channel_videos(&self, channel: &ChannelRef) -> Result<Vec<Video>> {
        let param = match channel {
            ChannelRef::Id(id) => ("channel_id", id.as_str()),
            ChannelRef::Handle(handle) => ("handle", handle.as_str()),
        };
        let list: VideoList = self.client.get_json(&["channel", "videos"], &[param]).await?;
        Ok(list.items)
    }
}
