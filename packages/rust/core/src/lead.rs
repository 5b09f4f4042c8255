//! The lead table schema and the mapping from sourced prospects.

use std::fmt;

use serde::{Deserialize, Serialize};

use leadpipe_shared::Result;
use leadpipe_sources::Prospect;
use leadpipe_table::{Email, Number, Phone, ShortText, SingleSelect, Url, User};

use crate::scratch;

/// Pipeline position of a lead, stored as free text in the `Status` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    /// Waiting for an opener.
    Ready,
    /// Waiting for name and niche inference.
    ReadyName,
    GeneratedOpener,
    FailedOpener,
    SuccessName,
    FailedName,
    /// The channel does not publish in English.
    FailedForeign,
    /// Any value set by hand in the table.
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::ReadyName => "ready-name",
            Self::GeneratedOpener => "generated-opener",
            Self::FailedOpener => "failed-opener",
            Self::SuccessName => "success-name",
            Self::FailedName => "failed-name",
            Self::FailedForeign => "failed-foreign",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for LeadStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ready" => Self::Ready,
            "ready-name" => Self::ReadyName,
            "generated-opener" => Self::GeneratedOpener,
            "failed-opener" => Self::FailedOpener,
            "success-name" => Self::SuccessName,
            "failed-name" => Self::FailedName,
            "failed-foreign" => Self::FailedForeign,
            _ => Self::Other(value),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(value: LeadStatus) -> Self {
        match value {
            LeadStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the leads table.
///
/// Every column is optional so the same type doubles as a partial update:
/// unset columns are left out of the request body and keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "Topic", default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<SingleSelect>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ShortText>,
    #[serde(rename = "Followers (K)", default, skip_serializing_if = "Option::is_none")]
    pub followers_k: Option<Number>,
    #[serde(rename = "Platform", default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<SingleSelect>,
    #[serde(rename = "Link", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(rename = "Phone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,

    /// Encoded snapshot of the source prospect, see [`crate::scratch`].
    #[serde(rename = "Gob", default, skip_serializing_if = "Option::is_none")]
    pub gob: Option<ShortText>,
    #[serde(rename = "Opener", default, skip_serializing_if = "Option::is_none")]
    pub opener: Option<ShortText>,

    #[serde(rename = "Assignee", default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,

    #[serde(rename = "Inferred Name", default, skip_serializing_if = "Option::is_none")]
    pub inferred_name: Option<ShortText>,
    #[serde(rename = "Inferred Niche", default, skip_serializing_if = "Option::is_none")]
    pub inferred_niche: Option<ShortText>,
}

impl Lead {
    /// A delta that only sets the status column.
    pub fn with_status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Map a sourced prospect onto a new lead, embedding the full prospect
    /// in the scratch column.
    pub fn from_prospect(prospect: &Prospect, platform: &str) -> Result<Self> {
        Ok(Self {
            topic: prospect
                .keywords
                .first()
                .map(|k| capitalize_first(k.trim()))
                .filter(|k| !k.is_empty())
                .map(SingleSelect::from),
            name: non_empty(&prospect.name).map(ShortText::from),
            followers_k: Some(Number((prospect.subscribers / 1000) as f64)),
            platform: non_empty(platform).map(SingleSelect::from),
            link: non_empty(&prospect.url).map(Url::from),
            email: non_empty(&prospect.email).map(Email::from),
            phone: non_empty(&prospect.phone).map(Phone::from),
            gob: Some(ShortText::from(scratch::encode_prospect(prospect)?)),
            ..Default::default()
        })
    }

    /// Natural identity used to deduplicate leads. Missing emails share the
    /// empty key.
    pub fn email_key(&self) -> &str {
        self.email.as_ref().map(Email::as_str).unwrap_or_default()
    }

    pub fn status_is(&self, status: &LeadStatus) -> bool {
        self.status.as_ref() == Some(status)
    }

    pub fn has_opener(&self) -> bool {
        self.opener.as_ref().is_some_and(|o| !o.is_empty())
    }

    /// Whether the lead is assigned to `name`. `None` matches every lead.
    pub fn assigned_to(&self, name: Option<&str>) -> bool {
        match name {
            None => true,
            Some(name) => self.assignee.as_ref().is_some_and(|u| u.name == name),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn prospect() -> Prospect {
        Prospect {
            name: "Trail Notes".into(),
            subscribers: 48_750,
            url: "https://www.youtube.com/@TrailNotes".into(),
            email: "hello@trailnotes.tv".into(),
            phone: String::new(),
            keywords: vec!["hiking".into(), "camping".into()],
            ..Default::default()
        }
    }

    #[test]
    fn status_round_trips_known_and_custom_values() {
        let status: LeadStatus = serde_json::from_value(json!("ready-name")).unwrap();
        assert_eq!(status, LeadStatus::ReadyName);

        let custom: LeadStatus = serde_json::from_value(json!("contacted")).unwrap();
        assert_eq!(custom, LeadStatus::Other("contacted".into()));
        assert_eq!(serde_json::to_value(&custom).unwrap(), json!("contacted"));
        assert_eq!(LeadStatus::FailedForeign.to_string(), "failed-foreign");
    }

    #[test]
    fn from_prospect_maps_columns() {
        let lead = Lead::from_prospect(&prospect(), "YouTube").unwrap();
        assert_eq!(lead.topic.as_ref().unwrap().as_str(), "Hiking");
        assert_eq!(lead.followers_k, Some(Number(48.0)));
        assert_eq!(lead.platform.as_ref().unwrap().as_str(), "YouTube");
        assert_eq!(lead.email_key(), "hello@trailnotes.tv");
        assert!(lead.phone.is_none());
        assert!(lead.status.is_none());

        let snapshot = scratch::decode_prospect(lead.gob.as_ref().unwrap().as_str()).unwrap();
        assert_eq!(snapshot, prospect());
    }

    #[test]
    fn missing_keywords_leave_topic_unset() {
        let mut p = prospect();
        p.keywords.clear();
        assert!(Lead::from_prospect(&p, "YouTube").unwrap().topic.is_none());
    }

    #[test]
    fn unicode_topic_is_capitalized() {
        let mut p = prospect();
        p.keywords = vec!["ébénisterie".into()];
        let lead = Lead::from_prospect(&p, "YouTube").unwrap();
        assert_eq!(lead.topic.unwrap().as_str(), "Ébénisterie");
    }

    #[test]
    fn status_delta_serializes_only_status() {
        let delta = Lead::with_status(LeadStatus::FailedOpener);
        assert_eq!(
            serde_json::to_value(&delta).unwrap(),
            json!({"Status": "failed-opener"})
        );
    }

    #[test]
    fn reads_table_row() {
        let row = json!({
            "Name": "Trail Notes",
            "Followers (K)": 48,
            "Assignee": {"id": "usr1", "email": "sam@agency.io", "name": "Sam Reyes"},
            "Status": "ready",
            "Inferred Name": "Sam"
        });
        let lead: Lead = serde_json::from_value(row).unwrap();
        assert!(lead.status_is(&LeadStatus::Ready));
        assert!(lead.assigned_to(Some("Sam Reyes")));
        assert!(!lead.assigned_to(Some("Someone Else")));
        assert!(lead.assigned_to(None));
        assert!(!lead.has_opener());
        assert_eq!(lead.email_key(), "");
    }
}
