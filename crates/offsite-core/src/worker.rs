use crate::admission::should_cache;
use crate::config::SiteConfig;
use crate::fetch::Fetcher;
use crate::manifest::AssetManifest;
use crate::registry::Clients;
use crate::request::{Destination, FetchRequest};
use crate::response::{Resource, ResponseKind, ServeSource};
use crate::{Error, Result};
use futures::future::join_all;
use offsite_cache::{CacheStorage, CacheStore};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle states, entered in order and never revisited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    New,
    Installing,
    Waiting,
    Activating,
    Active,
    /// Install went wrong; a fresh worker makes the next attempt
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Installing => "installing",
            Phase::Waiting => "waiting",
            Phase::Activating => "activating",
            Phase::Active => "active",
            Phase::Failed => "failed",
        }
    }
}

/// The worker's answer for one intercepted request
pub enum FetchOutcome {
    /// Not http(s); pass it through untouched
    Ignored,
    /// A response was produced, one way or another
    Served(Served),
}

pub struct Served {
    pub resource: Resource,
    pub source: ServeSource,
    /// Present when a stale core asset went out and a refresh is due
    pub revalidation: Option<Revalidation>,
}

/// Deferred refresh for a core asset that was served stale.
///
/// The worker hands these back instead of spawning them itself, so the host
/// decides where they run; tests just run them inline.
pub struct Revalidation {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    request: FetchRequest,
}

impl Revalidation {
    /// Fetch the asset again and overwrite the cached copy on a 200.
    /// Anything else is dropped quietly and the stale entry stays.
    pub async fn run(self) {
        match self.fetcher.fetch(&self.request).await {
            Ok(resource) if resource.is_ok() => {
                let fresh = resource.into_stored();
                if let Err(e) = self.store.put(&self.request.method, self.request.url.as_str(), &fresh) {
                    debug!("Revalidation store failed for {}: {}", self.request.url, e);
                }
            }
            Ok(resource) => {
                debug!(
                    "Revalidation for {} answered {}, keeping stale copy",
                    self.request.url, resource.status
                );
            }
            Err(e) => {
                debug!("Revalidation fetch failed for {}: {}", self.request.url, e);
            }
        }
    }

    /// Run on the runtime's background executor
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// One versioned worker: owns the store for its version and answers
/// intercepted requests from it
pub struct CacheWorker {
    storage: CacheStorage,
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    manifest: AssetManifest,
    origin: Url,
    offline_page: String,
    placeholder_image: String,
    phase: Mutex<Phase>,
}

impl CacheWorker {
    pub fn new(site: &SiteConfig, storage: CacheStorage, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let origin = Url::parse(&site.origin)?;
        let store = storage.open(&site.store_name())?;

        Ok(Self {
            storage,
            store,
            fetcher,
            manifest: site.assets.clone(),
            origin,
            offline_page: site.offline_page.clone(),
            placeholder_image: site.placeholder_image.clone(),
            phase: Mutex::new(Phase::New),
        })
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, next: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Precache every core asset, all or nothing.
    ///
    /// Fetches run concurrently; a single failure (transport error or
    /// non-200) aborts the whole install and nothing is persisted. Failures
    /// are logged, never retried automatically.
    pub async fn install(&self) -> Result<()> {
        {
            let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
            if *phase != Phase::New {
                return Err(Error::LifecycleError(format!(
                    "install is not allowed from the {} phase",
                    phase.as_str()
                )));
            }
            *phase = Phase::Installing;
        }

        info!(
            "Installing {} ({} core assets)",
            self.store.name(),
            self.manifest.core.len()
        );

        match self.precache().await {
            Ok(count) => {
                self.set_phase(Phase::Waiting);
                info!("{} installed, {} assets precached", self.store.name(), count);
                Ok(())
            }
            Err(e) => {
                self.set_phase(Phase::Failed);
                warn!("Install of {} failed: {}", self.store.name(), e);
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize> {
        let mut requests = Vec::with_capacity(self.manifest.core.len());
        for path in &self.manifest.core {
            requests.push(FetchRequest::get(self.origin.join(path)?));
        }

        let fetches = requests.iter().map(|request| self.fetcher.fetch(request));
        let results = join_all(fetches).await;

        let mut entries = Vec::with_capacity(requests.len());
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(resource) if resource.is_ok() => {
                    entries.push((request.url.to_string(), resource.into_stored()));
                }
                Ok(resource) => {
                    return Err(Error::InstallError(format!(
                        "{} answered {} {}",
                        request.url, resource.status, resource.status_text
                    )));
                }
                Err(e) => {
                    return Err(Error::InstallError(format!("{}: {}", request.url, e)));
                }
            }
        }

        self.store.put_all(&entries)?;
        Ok(entries.len())
    }

    /// Tear down every stale store, then take over all open clients so the
    /// new version governs requests without a reload
    pub fn activate(&self, clients: &Clients) -> Result<()> {
        {
            let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
            if *phase != Phase::Waiting {
                return Err(Error::LifecycleError(format!(
                    "activate is not allowed from the {} phase",
                    phase.as_str()
                )));
            }
            *phase = Phase::Activating;
        }

        let stale = self.storage.delete_except(self.store.name())?;
        for name in &stale {
            info!("Deleted stale store {}", name);
        }

        clients.claim(self.store.name());
        self.set_phase(Phase::Active);
        info!(
            "{} active, controlling {} clients",
            self.store.name(),
            clients.len()
        );
        Ok(())
    }

    /// Adopt an already-installed store after a process restart.
    /// A restart is not a version bump, so nothing is refetched.
    pub fn resume(&self) -> Result<()> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase != Phase::New {
            return Err(Error::LifecycleError(format!(
                "resume is not allowed from the {} phase",
                phase.as_str()
            )));
        }
        if self.store.is_empty()? {
            return Err(Error::CacheError(format!(
                "store {} has never been installed",
                self.store.name()
            )));
        }
        *phase = Phase::Active;
        Ok(())
    }

    /// Drop every store except this version's, on demand
    pub fn clean_old_caches(&self) -> Result<Vec<String>> {
        let deleted = self.storage.delete_except(self.store.name())?;
        if deleted.is_empty() {
            debug!("No old stores to clean");
        } else {
            info!("Cleaned {} old stores", deleted.len());
        }
        Ok(deleted)
    }

    /// Answer one intercepted request.
    ///
    /// Cache first. A hit on a core asset also hands back a revalidation job
    /// so the stale copy gets refreshed off the serving path. A miss goes to
    /// the network and, when the response qualifies, into the cache. Network
    /// failure falls back to whatever offline answer fits the request; the
    /// caller never sees a raw error.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if !request.is_http() {
            debug!("Ignoring {} scheme request", request.url.scheme());
            return FetchOutcome::Ignored;
        }

        let cached = match self.store.lookup(&request.method, request.url.as_str()) {
            Ok(found) => found,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", request.url, e);
                None
            }
        };

        if let Some(stored) = cached {
            debug!("Cache hit for {}", request.url);
            let resource = Resource::from_stored(request.url.clone(), stored);
            let revalidation = if self.manifest.is_core(request.url.path()) {
                Some(Revalidation {
                    store: self.store.clone(),
                    fetcher: Arc::clone(&self.fetcher),
                    request: request.clone(),
                })
            } else {
                None
            };
            return FetchOutcome::Served(Served {
                resource,
                source: ServeSource::Cache,
                revalidation,
            });
        }

        debug!("Cache miss for {}", request.url);
        match self.fetcher.fetch(request).await {
            Ok(resource) => {
                let admit = resource.status == 200
                    && resource.kind == ResponseKind::Basic
                    && should_cache(request, &self.manifest, &self.origin);

                let resource = if admit {
                    let (serve, keep) = resource.duplicate();
                    if let Err(e) =
                        self.store
                            .put(&request.method, request.url.as_str(), &keep.into_stored())
                    {
                        // The caller still gets the response; the cache just
                        // stays stale
                        warn!("Failed to cache {}: {}", request.url, e);
                    }
                    serve
                } else {
                    resource
                };

                FetchOutcome::Served(Served {
                    resource,
                    source: ServeSource::Network,
                    revalidation: None,
                })
            }
            Err(e) => {
                debug!("Network failure for {}: {}", request.url, e);
                self.offline_fallback(request)
            }
        }
    }

    /// Best offline answer for a request the network could not serve:
    /// documents get the offline page, images get the placeholder, and
    /// everything else (or a missing fallback) gets an empty 408
    fn offline_fallback(&self, request: &FetchRequest) -> FetchOutcome {
        let (path, source) = match request.destination {
            Destination::Document => (self.offline_page.as_str(), ServeSource::OfflinePage),
            Destination::Image => (
                self.placeholder_image.as_str(),
                ServeSource::PlaceholderImage,
            ),
            _ => return self.synthetic(request),
        };

        let fallback_url = match self.origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                warn!("Bad fallback path {}: {}", path, e);
                return self.synthetic(request);
            }
        };

        match self.store.lookup("GET", fallback_url.as_str()) {
            Ok(Some(stored)) => FetchOutcome::Served(Served {
                resource: Resource::from_stored(fallback_url, stored),
                source,
                revalidation: None,
            }),
            Ok(None) => {
                debug!("Fallback {} not cached, serving synthetic 408", path);
                self.synthetic(request)
            }
            Err(e) => {
                warn!("Fallback lookup failed for {}: {}", path, e);
                self.synthetic(request)
            }
        }
    }

    fn synthetic(&self, request: &FetchRequest) -> FetchOutcome {
        FetchOutcome::Served(Served {
            resource: Resource::synthetic_offline(request.url.clone()),
            source: ServeSource::Synthetic,
            revalidation: None,
        })
    }
}
