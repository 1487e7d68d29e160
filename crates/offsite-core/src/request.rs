use serde::{Deserialize, Serialize};
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico"];
const FONT_EXTENSIONS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf"];

/// What kind of resource a request is after
///
/// Only Document and Image change routing (they get dedicated offline
/// fallbacks); the rest exist so logs and admission read sensibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Other => "other",
        }
    }

    /// Best-effort guess from the request path. Pages ask for documents,
    /// anything with a recognized extension maps to its type, the rest
    /// is Other.
    pub fn guess(path: &str) -> Self {
        let path = path.to_lowercase();
        if path.ends_with(".css") {
            Destination::Style
        } else if path.ends_with(".js") {
            Destination::Script
        } else if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            Destination::Image
        } else if FONT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            Destination::Font
        } else if path.ends_with(".html") || !last_segment(&path).contains('.') {
            Destination::Document
        } else {
            Destination::Other
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A single intercepted request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl FetchRequest {
    /// GET request with the destination guessed from the path
    pub fn get(url: Url) -> Self {
        let destination = Destination::guess(url.path());
        Self {
            method: "GET".to_string(),
            url,
            destination,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Only http(s) traffic goes through the cache machinery;
    /// mailto:, chrome-extension: and friends pass straight through
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}
