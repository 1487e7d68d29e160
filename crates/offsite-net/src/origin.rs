use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum OriginError {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, OriginError>;

/// What came back from the origin, fully buffered
///
/// `final_url` is where the response actually came from after redirects,
/// which is what same-origin checks have to look at.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub final_url: Url,
}

/// HTTP client pinned to one site origin
pub struct OriginClient {
    client: reqwest::Client,
    origin: Url,
}

impl OriginClient {
    pub fn new(origin: Url) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("offsite/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, origin }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Turn a site-relative path into a full URL on this origin
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| OriginError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Perform one request and buffer the whole response.
    ///
    /// Any status counts as success here; deciding what a 404 means is the
    /// caller's business. Only transport failures surface as errors.
    pub async fn fetch(&self, method: &str, url: &Url) -> Result<OriginResponse> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| OriginError::InvalidMethod(method.to_string()))?;

        debug!("{} {}", method, url);
        let response = self.client.request(method, url.clone()).send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(OriginResponse {
            status: status.as_u16(),
            status_text,
            headers,
            body,
            final_url,
        })
    }
}
