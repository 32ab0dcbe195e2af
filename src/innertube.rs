use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const WEB_CLIENT_NAME: &str = "WEB";
const WEB_CLIENT_VERSION: &str = "2.20241126.01.00";

/// Caller-owned client for the key-less www.youtube.com endpoints: InnerTube
/// (player, resolve_url, browse), the channel feed and timed-text downloads.
///
/// Construct once and pass it around; it wraps a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct InnerTube {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
}

impl InnerTube {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, YOUTUBE_BASE_URL)
    }

    /// Point every endpoint at another origin (a local fixture server, a proxy)
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/youtubei/v1/{path}?prettyPrint=false", self.base_url)
    }

    /// POST a JSON body to an InnerTube endpoint, returning the raw response
    pub(crate) async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> reqwest::Result<reqwest::Response> {
        let url = self.endpoint(path);
        debug!("POST {url}");
        self.http
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .json(body)
            .send()
            .await
    }

    /// POST with the WEB client context and decode a 2xx JSON reply
    pub(crate) async fn post_web<T: DeserializeOwned>(
        &self,
        path: &str,
        mut body: serde_json::Value,
    ) -> reqwest::Result<T> {
        body["context"] = web_context();
        self.post(path, &body).await?.error_for_status()?.json().await
    }
}

fn web_context() -> serde_json::Value {
    serde_json::json!({
        "client": {
            "hl": "en",
            "gl": "US",
            "clientName": WEB_CLIENT_NAME,
            "clientVersion": WEB_CLIENT_VERSION
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let yt = InnerTube::new(reqwest::Client::new());
        assert_eq!(
            yt.endpoint("player"),
            "https://www.youtube.com/youtubei/v1/player?prettyPrint=false"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let yt = InnerTube::with_base_url(reqwest::Client::new(), "http://127.0.0.1:8080/");
        assert_eq!(yt.base_url(), "http://127.0.0.1:8080");
        assert_eq!(
            yt.endpoint("browse"),
            "http://127.0.0.1:8080/youtubei/v1/browse?prettyPrint=false"
        );
    }
}
