use serde::{Deserialize, Serialize};

/// The asset lists driving install and admission
///
/// Core assets are precached at install, all or nothing, and revalidated in
/// the background whenever a stale copy is served. External assets are
/// third-party URLs we recognize but never pre-fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default = "default_core_assets")]
    pub core: Vec<String>,

    #[serde(default = "default_external_assets")]
    pub external: Vec<String>,
}

impl AssetManifest {
    /// Is this site-relative path one of the precached core assets?
    pub fn is_core(&self, path: &str) -> bool {
        self.core.iter().any(|asset| asset == path)
    }

    /// Does this URL belong to a known external asset?
    /// Substring match, so query-string variants still count.
    pub fn matches_external(&self, url: &str) -> bool {
        self.external.iter().any(|asset| url.contains(asset.as_str()))
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            core: default_core_assets(),
            external: default_external_assets(),
        }
    }
}

fn default_core_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/css/style.css",
        "/css/responsive.css",
        "/css/themes.css",
        "/js/main.js",
        "/js/language.js",
        "/js/theme.js",
        "/js/animations.js",
        "/favicon.ico",
        "/offline.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_external_assets() -> Vec<String> {
    [
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
        "https://cdn.jsdelivr.net/npm/@fortawesome/fontawesome-free@6.4.0/css/all.min.css",
        "https://fonts.googleapis.com/css2?family=Cairo:wght@300;400;500;600;700&display=swap",
        "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
