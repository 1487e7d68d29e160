use crate::manifest::AssetManifest;
use crate::request::{Destination, FetchRequest};
use url::Url;

/// Path suffixes that are always worth keeping offline
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".woff", ".woff2",
];

/// Decide whether a successful response for this request belongs in the cache.
///
/// Pure function of the request: static assets by extension, same-origin
/// documents, and anything on the external-asset list. Evaluate it as often
/// as you like, the answer doesn't move.
pub fn should_cache(request: &FetchRequest, manifest: &AssetManifest, origin: &Url) -> bool {
    let path = request.url.path().to_lowercase();

    if STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    if request.destination == Destination::Document && request.is_same_origin(origin) {
        return true;
    }

    manifest.matches_external(request.url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://business-consulting.example").unwrap()
    }

    fn request(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_static_extensions_are_admitted() {
        let manifest = AssetManifest::default();
        assert!(should_cache(
            &request("https://business-consulting.example/css/style.css"),
            &manifest,
            &origin()
        ));
        assert!(should_cache(
            &request("https://business-consulting.example/images/team.jpg"),
            &manifest,
            &origin()
        ));
        // Extension matching ignores case
        assert!(should_cache(
            &request("https://business-consulting.example/images/LOGO.SVG"),
            &manifest,
            &origin()
        ));
    }

    #[test]
    fn test_same_origin_documents_are_admitted() {
        let manifest = AssetManifest::default();
        assert!(should_cache(
            &request("https://business-consulting.example/services"),
            &manifest,
            &origin()
        ));
        assert!(!should_cache(
            &request("https://elsewhere.example/services"),
            &manifest,
            &origin()
        ));
    }

    #[test]
    fn test_external_assets_are_admitted_by_substring() {
        let manifest = AssetManifest::default();
        assert!(should_cache(
            &request("https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css"),
            &manifest,
            &origin()
        ));
    }

    #[test]
    fn test_api_calls_are_not_admitted() {
        let manifest = AssetManifest::default();
        assert!(!should_cache(
            &request("https://business-consulting.example/api/quotes.json"),
            &manifest,
            &origin()
        ));
    }

    #[test]
    fn test_decision_is_stable_across_evaluations() {
        let manifest = AssetManifest::default();
        let req = request("https://business-consulting.example/css/style.css");
        let first = should_cache(&req, &manifest, &origin());
        for _ in 0..3 {
            assert_eq!(should_cache(&req, &manifest, &origin()), first);
        }
    }
}
