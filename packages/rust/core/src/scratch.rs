//! Prospect snapshots stored in the lead's `Gob` column.
//!
//! The snapshot is the prospect's JSON encoding, base64 encoded with the
//! standard alphabet so it fits a single-line text cell.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use leadpipe_shared::{LeadPipeError, Result};
use leadpipe_sources::Prospect;

pub fn encode_prospect(prospect: &Prospect) -> Result<String> {
    let json = serde_json::to_vec(prospect).map_err(|source| LeadPipeError::Encode {
        what: "prospect snapshot",
        source,
    })?;
    Ok(STANDARD.encode(json))
}

pub fn decode_prospect(blob: &str) -> Result<Prospect> {
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|e| LeadPipeError::scratch(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| LeadPipeError::scratch(format!("invalid prospect snapshot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_unknown_fields() {
        let prospect: Prospect = serde_json::from_value(serde_json::json!({
            "name": "Trail Notes",
            "keywords": ["hiking"],
            "country": "NZ"
        }))
        .unwrap();

        let blob = encode_prospect(&prospect).unwrap();
        assert!(blob.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
        assert_eq!(decode_prospect(&blob).unwrap(), prospect);
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_prospect("not base64!").unwrap_err();
        assert!(matches!(err, LeadPipeError::Scratch { .. }));

        let not_json = STANDARD.encode("plain text");
        let err = decode_prospect(&not_json).unwrap_err();
        assert!(err.to_string().contains("invalid prospect snapshot"));
    }
}
