//! Lead-sourcing service: saved searches and the prospects they found.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use leadpipe_http::Client;
use leadpipe_shared::{LeadPipeError, Result};

/// A saved search on the lead-sourcing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A channel found by a search. Fields the pipeline does not use are kept in
/// `extra` so the full payload survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subscribers: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only access to saved searches and their prospects.
pub trait ProspectSource: Send + Sync {
    fn searches(&self) -> impl Future<Output = Result<Vec<Search>>> + Send;

    fn prospects(&self, search_id: &str) -> impl Future<Output = Result<Vec<Prospect>>> + Send;
}

/// Concatenate the prospects of every saved search, in search order.
///
/// Any failing request aborts the whole fetch.
#[instrument(skip_all)]
pub async fn all_prospects<S: ProspectSource>(source: &S) -> Result<Vec<Prospect>> {
    let searches = source
        .searches()
        .await
        .map_err(|e| LeadPipeError::context("get searches", e))?;

    let mut prospects = Vec::new();
    for search in &searches {
        let found = source
            .prospects(&search.id)
            .await
            .map_err(|e| LeadPipeError::context(format!("get prospects for search {}", search.id), e))?;
        debug!(search = %search.name, count = found.len(), "fetched prospects");
        prospects.extend(found);
    }

    Ok(prospects)
}

/// REST client for the lead-sourcing service.
#[derive(Debug, Clone)]
pub struct ProspetyClient {
    client: Client,
}

impl ProspetyClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ProspectSource for ProspetyClient {
    async fn searches(&self) -> Result<Vec<Search>> {
        self.client.get_json(&["searches"], &[]).await
    }

    async fn prospects(&self, search_id: &str) -> Result<Vec<Prospect>> {
        self.client
            .get_json(&["searches", search_id, "prospects"], &[])
            .await
    }
}
