//! Import new prospects into the leads table without duplicating existing
//! leads.

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, warn};

use leadpipe_shared::{LeadPipeError, MergeSettings, Result};
use leadpipe_sources::{ProspectSource, all_prospects};
use leadpipe_table::{Record, Table, User};

use crate::lead::Lead;
use crate::progress::Progress;
use crate::youtube::parse_channel;

/// Counts from one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Prospects returned by all searches.
    pub fetched: usize,
    /// Prospects dropped because their URL is not a channel URL.
    pub skipped: usize,
    /// Prospects collapsed into another with the same email.
    pub duplicates: usize,
    /// Prospects whose email is already in the table.
    pub existing: usize,
    pub created: usize,
}

/// Create a lead for every sourced prospect whose email is not yet in
/// `table`.
///
/// Prospects sharing an email collapse into one lead: the last one wins and
/// keeps the position of the first. Any fetch failure aborts the merge
/// before anything is created.
#[instrument(skip_all)]
pub async fn merge_prospects<S: ProspectSource>(
    source: &S,
    table: &Table<Lead>,
    settings: &MergeSettings,
    progress: &dyn Progress,
) -> Result<MergeReport> {
    let mut report = MergeReport::default();

    progress.phase("Fetching prospects");
    let prospects = all_prospects(source)
        .await
        .map_err(|e| LeadPipeError::context("fetch prospects", e))?;
    report.fetched = prospects.len();

    let mut candidates: Vec<Lead> = Vec::new();
    let mut by_email: HashMap<String, usize> = HashMap::new();
    for prospect in &prospects {
        if let Err(error) = parse_channel(&prospect.url) {
            warn!(name = %prospect.name, url = %prospect.url, %error, "skipping prospect");
            report.skipped += 1;
            continue;
        }

        let mut lead = Lead::from_prospect(prospect, &settings.platform)?;
        if let Some(id) = &settings.assignee_id {
            lead.assignee = Some(User::with_id(id.as_str()));
        }

        match by_email.get(lead.email_key()) {
            Some(&index) => {
                candidates[index] = lead;
                report.duplicates += 1;
            }
            None => {
                by_email.insert(lead.email_key().to_string(), candidates.len());
                candidates.push(lead);
            }
        }
    }

    progress.phase("Fetching existing leads");
    let existing: HashSet<String> = table
        .list()
        .await
        .map_err(|failure| LeadPipeError::context("list existing leads", failure.into()))?
        .into_iter()
        .map(|record| record.fields.email_key().to_string())
        .collect();

    let new_leads: Vec<Record<Lead>> = candidates
        .into_iter()
        .filter(|lead| !existing.contains(lead.email_key()))
        .map(Record::new)
        .collect();
    report.existing = by_email.len() - new_leads.len();
    progress.planned(new_leads.len());

    if new_leads.is_empty() {
        info!(fetched = report.fetched, "no new leads to create");
        return Ok(report);
    }

    progress.phase("Creating leads");
    let created = table
        .create_many(&new_leads)
        .await
        .map_err(|e| LeadPipeError::context("create leads", e))?;
    for record in &created {
        progress.record_done(&record.id, true);
    }
    report.created = created.len();

    info!(
        fetched = report.fetched,
        skipped = report.skipped,
        duplicates = report.duplicates,
        existing = report.existing,
        created = report.created,
        "merge finished"
    );
    Ok(report)
}
