//! Batch enrichment of leads.
//!
//! A stage picks candidate leads, runs an externally-dependent
//! transformation on each one concurrently and writes the outcomes back in
//! two cohorts: successful deltas first, then failure-status deltas. A
//! failing record never blocks the others; its cause is logged and only its
//! stage-specific failure status is persisted.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use leadpipe_shared::{LeadPipeError, Result};
use leadpipe_sources::{CompletionSource, TranscriptSource, VideoSource};
use leadpipe_table::{Record, ShortText, Table};

use crate::batch::partition_concurrent;
use crate::lead::{Lead, LeadStatus};
use crate::progress::Progress;
use crate::scratch::decode_prospect;
use crate::text::{postprocess_opener, truncate_chars};
use crate::{prompts, youtube};

// ---------------------------------------------------------------------------
// Stage contract
// ---------------------------------------------------------------------------

/// One enrichment step applied to a subset of leads.
pub trait EnrichmentStage: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this lead should be processed by the stage.
    fn is_candidate(&self, lead: &Lead) -> bool;

    /// Status written for records whose enrichment failed.
    fn failure_status(&self) -> LeadStatus;

    /// Produce the fields delta for one lead.
    fn enrich(&self, record_id: &str, lead: &Lead) -> impl Future<Output = Result<Lead>> + Send;
}

/// Outcome counts of one stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub stage: &'static str,
    /// Leads fetched from the table.
    pub scanned: usize,
    pub candidates: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run `stage` over every candidate lead in `table`.
///
/// Listing failures abort before any work starts. Both cohorts are always
/// written, one after the other; if either write fails the error is
/// returned once both have been attempted.
#[instrument(skip_all, fields(stage = stage.name()))]
pub async fn run_stage<S: EnrichmentStage>(
    table: &Table<Lead>,
    stage: Arc<S>,
    max_in_flight: Option<usize>,
    progress: Arc<dyn Progress>,
) -> Result<EnrichmentReport> {
    progress.phase("Fetching leads");
    let records = table
        .list()
        .await
        .map_err(|failure| LeadPipeError::context("list leads", failure.into()))?;
    let scanned = records.len();

    let candidates: Vec<Record<Lead>> = records
        .into_iter()
        .filter(|record| stage.is_candidate(&record.fields))
        .collect();
    info!(scanned, candidates = candidates.len(), "selected candidates");
    progress.planned(candidates.len());

    let mut report = EnrichmentReport {
        stage: stage.name(),
        scanned,
        candidates: candidates.len(),
        ..Default::default()
    };
    if candidates.is_empty() {
        return Ok(report);
    }

    progress.phase("Enriching leads");
    let (successes, failures) = partition_concurrent(candidates, max_in_flight, |record| {
        let stage = Arc::clone(&stage);
        let progress = Arc::clone(&progress);
        async move { enrich_one(stage.as_ref(), record, progress.as_ref()).await }
    })
    .await;

    report.succeeded = successes.len();
    report.failed = failures.len();
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "enrichment finished"
    );

    progress.phase("Writing results");
    let success_write = write_cohort(table, "success", &successes).await;
    let failure_write = write_cohort(table, "failure", &failures).await;
    success_write.and(failure_write)?;

    Ok(report)
}

async fn enrich_one<S: EnrichmentStage>(
    stage: &S,
    record: Record<Lead>,
    progress: &dyn Progress,
) -> std::result::Result<Record<Lead>, Record<Lead>> {
    let outcome = stage.enrich(&record.id, &record.fields).await;
    progress.record_done(&record.id, outcome.is_ok());

    match outcome {
        Ok(delta) => Ok(Record::existing(record.id, delta)),
        Err(error) => {
            let status = stage.failure_status();
            warn!(record_id = %record.id, %status, %error, "lead enrichment failed");
            Err(Record::existing(record.id, Lead::with_status(status)))
        }
    }
}

async fn write_cohort(table: &Table<Lead>, cohort: &str, records: &[Record<Lead>]) -> Result<()> {
    match table.update(records).await {
        Ok(written) => {
            info!(cohort, written = written.len(), "cohort written");
            Ok(())
        }
        Err(failure) => {
            let (written, error) = failure.into_parts();
            error!(cohort, written = written.len(), total = records.len(), %error, "cohort write failed");
            Err(LeadPipeError::context(format!("write {cohort} cohort"), error))
        }
    }
}

// ---------------------------------------------------------------------------
// Name stage
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChannelProfile<'a> {
    youtube_name: &'a str,
    youtube_keywords: String,
    youtube_email: &'a str,
}

#[derive(Debug, Deserialize)]
struct NameInference {
    inferred_name: String,
    inferred_main_niche: String,
    #[serde(default)]
    detected_foreign_youtube_channel: bool,
}

/// Infers a creator's real name and niche for leads in `ready-name`.
///
/// Channels detected as non-English are written with `failed-foreign` as
/// part of the success cohort.
pub struct NameStage<C> {
    ai: C,
    assignee: Option<String>,
}

impl<C: CompletionSource> NameStage<C> {
    pub fn new(ai: C, assignee: Option<String>) -> Self {
        Self { ai, assignee }
    }
}

impl<C: CompletionSource + 'static> EnrichmentStage for NameStage<C> {
    fn name(&self) -> &'static str {
        "name"
    }

    fn is_candidate(&self, lead: &Lead) -> bool {
        lead.status_is(&LeadStatus::ReadyName) && lead.assigned_to(self.assignee.as_deref())
    }

    fn failure_status(&self) -> LeadStatus {
        LeadStatus::FailedName
    }

    async fn enrich(&self, _record_id: &str, lead: &Lead) -> Result<Lead> {
        let blob = lead
            .gob
            .as_ref()
            .filter(|g| !g.is_empty())
            .ok_or_else(|| LeadPipeError::enrichment("lead has no prospect snapshot"))?;
        let prospect = decode_prospect(blob.as_str())?;

        let profile = ChannelProfile {
            youtube_name: &prospect.name,
            youtube_keywords: prospect.keywords.join(","),
            youtube_email: &prospect.email,
        };
        let profile_json = serde_json::to_string(&profile).map_err(|source| {
            LeadPipeError::Encode {
                what: "channel profile",
                source,
            }
        })?;

        let reply = self.ai.complete(&prompts::name_inference(&profile_json)).await?;
        let inferred: NameInference =
            serde_json::from_str(reply.trim()).map_err(|source| LeadPipeError::Decode {
                what: "name inference reply",
                source,
            })?;

        let status = if inferred.detected_foreign_youtube_channel {
            LeadStatus::FailedForeign
        } else {
            LeadStatus::SuccessName
        };

        Ok(Lead {
            inferred_name: Some(ShortText::from(inferred.inferred_name)),
            inferred_niche: Some(ShortText::from(inferred.inferred_main_niche.to_lowercase())),
            status: Some(status),
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Opener stage
// ---------------------------------------------------------------------------

/// Writes a personalised opener from the lead's latest video for leads in
/// `ready` that do not have one yet.
pub struct OpenerStage<V, T, C> {
    videos: V,
    transcripts: T,
    ai: C,
    assignee: Option<String>,
    transcript_budget: usize,
}

impl<V, T, C> OpenerStage<V, T, C>
where
    V: VideoSource,
    T: TranscriptSource,
    C: CompletionSource,
{
    pub fn new(
        videos: V,
        transcripts: T,
        ai: C,
        assignee: Option<String>,
        transcript_budget: usize,
    ) -> Self {
        Self {
            videos,
            transcripts,
            ai,
            assignee,
            transcript_budget,
        }
    }
}

impl<V, T, C> EnrichmentStage for OpenerStage<V, T, C>
where
    V: VideoSource + 'static,
    T: TranscriptSource + 'static,
    C: CompletionSource + 'static,
{
    fn name(&self) -> &'static str {
        "opener"
    }

    fn is_candidate(&self, lead: &Lead) -> bool {
        lead.status_is(&LeadStatus::Ready)
            && !lead.has_opener()
            && lead.assigned_to(self.assignee.as_deref())
    }

    fn failure_status(&self) -> LeadStatus {
        LeadStatus::FailedOpener
    }

    async fn enrich(&self, record_id: &str, lead: &Lead) -> Result<Lead> {
        let link = lead
            .link
            .as_ref()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| LeadPipeError::enrichment("lead has no link"))?;
        let channel = youtube::parse_channel(link.as_str())?;

        let video = self
            .videos
            .latest_video(&channel)
            .await
            .map_err(|e| LeadPipeError::context(format!("get latest video for {channel}"), e))?;

        let transcript = self
            .transcripts
            .transcript(&video.id)
            .await
            .map_err(|e| LeadPipeError::context(format!("get transcript for video {}", video.id), e))?
            .to_plain_text();
        if transcript.is_empty() {
            return Err(LeadPipeError::enrichment(format!(
                "transcript for video {} is empty",
                video.id
            )));
        }

        let excerpt = truncate_chars(&transcript, self.transcript_budget);
        if excerpt.len() < transcript.len() {
            info!(record_id, video_id = %video.id, budget = self.transcript_budget, "truncated transcript");
        }

        let analysis = self.ai.complete(&prompts::video_analysis(excerpt)).await?;
        let raw = self.ai.complete(&prompts::opener(&analysis)).await?;
        let opener = postprocess_opener(&raw);
        if opener.is_empty() {
            return Err(LeadPipeError::enrichment("model returned an empty opener"));
        }

        Ok(Lead {
            opener: Some(ShortText::from(opener)),
            status: Some(LeadStatus::GeneratedOpener),
            ..Default::default()
        })
    }
}
