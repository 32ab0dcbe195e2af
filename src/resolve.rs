//! Turn a channel ID, `@handle`, bare name or channel URL into a canonical channel ID.

use log::debug;
use serde_json::Value;

use crate::innertube::InnerTube;
use crate::{find_channel_id, is_channel_id};

const HANDLE_BASE_URL: &str = "https://www.youtube.com/";

/// Where `navigation/resolve_url` puts the browse ID, primary first
const RESOLVE_ID_POINTERS: &[&str] = &[
    "/endpoint/browseEndpoint/browseId",
    "/endpoint/innertubeCommand/browseEndpoint/browseId",
];

/// Fields of a `browse` reply that hold the ID itself
const BROWSE_ID_POINTERS: &[&str] = &[
    "/metadata/channelMetadataRenderer/externalId",
    "/header/c4TabbedHeaderRenderer/channelId",
];

/// Fields of a `browse` reply that hold a URL embedding the ID
const BROWSE_URL_POINTERS: &[&str] = &[
    "/metadata/channelMetadataRenderer/channelUrl",
    "/microformat/microformatDataRenderer/urlCanonical",
];

impl InnerTube {
    /// Resolve `input` to a `UC…` channel ID.
    ///
    /// Canonical IDs come back untouched without a request. Not finding a
    /// channel is an ordinary outcome: every failure along the way yields `None`.
    pub async fn resolve_channel_id(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if is_channel_id(input) {
            return Some(input.to_string());
        }

        let url = candidate_url(input);
        match self.post_web::<Value>("navigation/resolve_url", serde_json::json!({ "url": url })).await {
            Ok(resp) => {
                if let Some(id) = id_from_resolved_url(&resp) {
                    return Some(id);
                }
                debug!("resolve_url gave no channel for {url}");
            }
            Err(e) => debug!("resolve_url failed for {url}: {e}"),
        }

        match self.post_web::<Value>("browse", serde_json::json!({ "browseId": input })).await {
            Ok(resp) => {
                let id = id_from_browse(&resp);
                if id.is_none() {
                    debug!("browse gave no channel metadata for {input}");
                }
                id
            }
            Err(e) => {
                debug!("browse failed for {input}: {e}");
                None
            }
        }
    }
}

/// URLs pass through, `@handle` and bare names become handle profile URLs
fn candidate_url(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else if input.starts_with('@') {
        format!("{HANDLE_BASE_URL}{input}")
    } else {
        format!("{HANDLE_BASE_URL}@{input}")
    }
}

fn id_from_resolved_url(resp: &Value) -> Option<String> {
    RESOLVE_ID_POINTERS
        .iter()
        .filter_map(|p| resp.pointer(p).and_then(Value::as_str))
        .find(|id| is_channel_id(id))
        .map(str::to_string)
}

/// First field that yields a canonical ID; these shapes drift, so this is best-effort
fn id_from_browse(resp: &Value) -> Option<String> {
    let str_at = move |p: &&str| resp.pointer(p).and_then(Value::as_str);

    let direct = BROWSE_ID_POINTERS.iter().filter_map(str_at).find(|id| is_channel_id(id));
    let from_url = || BROWSE_URL_POINTERS.iter().filter_map(str_at).find_map(find_channel_id);

    direct.or_else(from_url).map(str::to_string)
}
