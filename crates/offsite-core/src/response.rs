use chrono::Utc;
use offsite_cache::StoredResponse;
use url::Url;

/// Where a response sits relative to the site origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin; the only kind the cache will admit at runtime
    Basic,
    /// Crossed an origin boundary somewhere (CDN, redirect off-site)
    Cross,
}

/// How a served response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Network,
    OfflinePage,
    PlaceholderImage,
    Synthetic,
}

/// A response moving through the worker
///
/// Deliberately not Clone: the body models a one-shot stream, so consuming
/// it twice takes an explicit `duplicate`.
#[derive(Debug)]
pub struct Resource {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub kind: ResponseKind,
    pub url: Url,
}

impl Resource {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Split into two identical copies, one to serve and one to store
    pub fn duplicate(self) -> (Resource, Resource) {
        let twin = Resource {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: self.kind,
            url: self.url.clone(),
        };
        (self, twin)
    }

    /// Rehydrate a cached entry. Everything in the store was same-origin
    /// when it was admitted, so it comes back Basic.
    pub fn from_stored(url: Url, stored: StoredResponse) -> Self {
        Resource {
            status: stored.status,
            status_text: stored.status_text,
            headers: stored.headers,
            body: stored.body,
            kind: ResponseKind::Basic,
            url,
        }
    }

    /// Freeze this copy for the cache, stamping it with now
    pub fn into_stored(self) -> StoredResponse {
        StoredResponse {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body: self.body,
            stored_at: Utc::now(),
        }
    }

    /// The empty 408 we hand out when nothing better exists offline
    pub fn synthetic_offline(url: Url) -> Self {
        Resource {
            status: 408,
            status_text: "Offline".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            kind: ResponseKind::Basic,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(body: &str) -> Resource {
        Resource {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: body.as_bytes().to_vec(),
            kind: ResponseKind::Basic,
            url: Url::parse("https://example.com/").unwrap(),
        }
    }

    #[test]
    fn test_duplicate_yields_two_equal_copies() {
        let (a, b) = resource("hello").duplicate();
        assert_eq!(a.status, b.status);
        assert_eq!(a.body, b.body);
        assert_eq!(a.headers, b.headers);
        assert_eq!(a.url, b.url);
    }

    #[test]
    fn test_stored_roundtrip_keeps_the_payload() {
        let original = resource("page body");
        let url = original.url.clone();
        let stored = original.into_stored();
        let back = Resource::from_stored(url, stored);

        assert_eq!(back.status, 200);
        assert_eq!(back.body, b"page body");
        assert_eq!(back.kind, ResponseKind::Basic);
    }

    #[test]
    fn test_synthetic_offline_is_an_empty_408() {
        let synthetic = Resource::synthetic_offline(Url::parse("https://example.com/api").unwrap());
        assert_eq!(synthetic.status, 408);
        assert_eq!(synthetic.status_text, "Offline");
        assert!(synthetic.body.is_empty());
    }
}
