use crate::request::FetchRequest;
use crate::response::{Resource, ResponseKind};
use crate::Result;
use offsite_net::OriginClient;

/// Trait for fetching resources - makes testing easier and keeps things flexible
///
/// The worker only ever talks to the network through this, so tests can
/// swap in a canned origin.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Resource>;
}

/// Production fetcher backed by the origin HTTP client
pub struct OriginFetcher {
    client: OriginClient,
}

impl OriginFetcher {
    pub fn new(client: OriginClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Fetcher for OriginFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Resource> {
        let response = self.client.fetch(&request.method, &request.url).await?;

        // Redirects can walk off the origin, so classify by where the
        // response actually came from
        let kind = if response.final_url.origin() == self.client.origin().origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cross
        };

        Ok(Resource {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            body: response.body,
            kind,
            url: response.final_url,
        })
    }
}
