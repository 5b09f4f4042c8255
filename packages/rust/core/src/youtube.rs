//! Channel references from YouTube channel URLs.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use leadpipe_shared::{LeadPipeError, Result};
use leadpipe_sources::ChannelRef;

const HOST: &str = "www.youtube.com";

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/channel/([a-zA-Z0-9_-]+)$").expect("valid regex"));
static CHANNEL_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/@([a-zA-Z0-9_-]+)$").expect("valid regex"));

/// Parse `https://www.youtube.com/channel/<id>` or
/// `https://www.youtube.com/@<handle>`.
///
/// Any other host or path shape is an error.
pub fn parse_channel(link: &str) -> Result<ChannelRef> {
    let url = Url::parse(link.trim()).map_err(|source| LeadPipeError::InvalidUrl {
        url: link.to_string(),
        source,
    })?;

    if url.host_str() != Some(HOST) {
        return Err(LeadPipeError::enrichment(format!(
            "{link:?} is not a {HOST} URL"
        )));
    }

    if let Some(caps) = CHANNEL_ID.captures(url.path()) {
        return Ok(ChannelRef::Id(caps[1].to_string()));
    }
    if let Some(caps) = CHANNEL_HANDLE.captures(url.path()) {
        return Ok(ChannelRef::Handle(caps[1].to_string()));
    }

    Err(LeadPipeError::enrichment(format!(
        "no channel id or handle in {link:?}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_ids() {
        assert_eq!(
            parse_channel("https://www.youtube.com/channel/UCxyz").unwrap(),
            ChannelRef::Id("UCxyz".into())
        );
        assert_eq!(
            parse_channel("https://www.youtube.com/channel/UCe0TLA0_s-Mj").unwrap(),
            ChannelRef::Id("UCe0TLA0_s-Mj".into())
        );
    }

    #[test]
    fn parses_handles() {
        assert_eq!(
            parse_channel("https://www.youtube.com/@Handle").unwrap(),
            ChannelRef::Handle("Handle".into())
        );
    }

    #[test]
    fn rejects_other_hosts_and_paths() {
        for link in [
            "https://youtube.com/@Handle",
            "https://www.vimeo.com/channel/UCxyz",
            "https://www.youtube.com/watch?v=abc",
            "https://www.youtube.com/channel/UCxyz/videos",
            "https://www.youtube.com/@",
        ] {
            assert!(parse_channel(link).is_err(), "{link} should not parse");
        }
    }

    #[test]
    fn malformed_urls_are_invalid_url_errors() {
        let err = parse_channel("not a url").unwrap_err();
        assert!(matches!(err, LeadPipeError::InvalidUrl { .. }));
    }
}
