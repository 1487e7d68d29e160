use crate::worker::CacheWorker;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// One open page, remembered by id along with the version controlling it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub id: String,
    /// Store name of the governing worker, None until a worker claims it
    pub controller: Option<String>,
}

/// The set of open clients. Claiming rewires all of them to a new version
/// at once, without anyone reloading.
#[derive(Clone, Default)]
pub struct Clients {
    sessions: Arc<Mutex<Vec<ClientSession>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ClientSession>> {
        // A poisoned list of sessions is still a list of sessions
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn connect(&self, id: &str) {
        let mut sessions = self.lock();
        if sessions.iter().any(|s| s.id == id) {
            return;
        }
        sessions.push(ClientSession {
            id: id.to_string(),
            controller: None,
        });
    }

    /// Point every open session at the given version
    pub fn claim(&self, version: &str) {
        for session in self.lock().iter_mut() {
            session.controller = Some(version.to_string());
        }
    }

    pub fn controller_of(&self, id: &str) -> Option<String> {
        self.lock()
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.controller.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Out-of-band commands for the registry, sent from the page side
pub enum ControlMessage {
    /// Promote the waiting worker right now instead of at the natural handoff
    ForceActivate,
    /// Ask which version currently governs; the answer comes back on the channel
    GetVersion { reply: oneshot::Sender<String> },
    /// Delete every store except the governing one
    CleanOldCaches,
}

/// Tracks which worker governs requests and which one is waiting its turn.
///
/// At most one of each: a freshly installed worker activates immediately when
/// nothing governs yet, otherwise it parks in the waiting slot until the old
/// version steps down or a ForceActivate arrives.
pub struct WorkerRegistry {
    active: Option<Arc<CacheWorker>>,
    waiting: Option<Arc<CacheWorker>>,
    clients: Clients,
}

impl WorkerRegistry {
    pub fn new(clients: Clients) -> Self {
        Self {
            active: None,
            waiting: None,
            clients,
        }
    }

    /// Install a new worker and slot it in.
    ///
    /// Same version as the governing worker is a no-op. A failed install
    /// leaves the registry untouched; the old version keeps serving.
    pub async fn register(&mut self, worker: Arc<CacheWorker>) -> Result<()> {
        if let Some(active) = &self.active {
            if active.store_name() == worker.store_name() {
                info!("{} is already active, nothing to install", worker.store_name());
                return Ok(());
            }
        }

        worker.install().await?;

        match &self.active {
            None => {
                worker.activate(&self.clients)?;
                self.active = Some(worker);
            }
            Some(active) => {
                info!(
                    "{} installed, waiting behind {}",
                    worker.store_name(),
                    active.store_name()
                );
                self.waiting = Some(worker);
            }
        }
        Ok(())
    }

    /// Adopt an already-installed worker after a restart
    pub fn resume(&mut self, worker: Arc<CacheWorker>) -> Result<()> {
        worker.resume()?;
        self.clients.claim(worker.store_name());
        self.active = Some(worker);
        Ok(())
    }

    /// Promote the waiting worker, if there is one
    pub fn skip_waiting(&mut self) -> Result<()> {
        match self.waiting.take() {
            Some(worker) => {
                if let Err(e) = worker.activate(&self.clients) {
                    self.waiting = Some(worker);
                    return Err(e);
                }
                info!("{} promoted to active", worker.store_name());
                self.active = Some(worker);
                Ok(())
            }
            None => {
                debug!("No waiting worker to promote");
                Ok(())
            }
        }
    }

    /// Version name that answers GetVersion: the governing worker's store,
    /// or the waiting one's when nothing governs yet
    pub fn current_version(&self) -> Option<String> {
        self.active
            .as_ref()
            .or(self.waiting.as_ref())
            .map(|w| w.store_name().to_string())
    }

    pub fn handle_message(&mut self, message: ControlMessage) -> Result<()> {
        match message {
            ControlMessage::ForceActivate => self.skip_waiting(),
            ControlMessage::GetVersion { reply } => {
                // Receiver may be gone; that's the sender's problem
                let _ = reply.send(self.current_version().unwrap_or_default());
                Ok(())
            }
            ControlMessage::CleanOldCaches => match &self.active {
                Some(worker) => {
                    worker.clean_old_caches()?;
                    Ok(())
                }
                None => Err(Error::LifecycleError(
                    "no active worker to clean caches for".to_string(),
                )),
            },
        }
    }

    pub fn active(&self) -> Option<&Arc<CacheWorker>> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&Arc<CacheWorker>> {
        self.waiting.as_ref()
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_is_idempotent_per_id() {
        let clients = Clients::new();
        clients.connect("tab-1");
        clients.connect("tab-1");
        clients.connect("tab-2");
        assert_eq!(clients.len(), 2);
    }

    #[test]
    fn test_claim_rewires_every_session() {
        let clients = Clients::new();
        clients.connect("tab-1");
        clients.connect("tab-2");
        assert_eq!(clients.controller_of("tab-1"), None);

        clients.claim("site-v2.0.0");
        assert_eq!(
            clients.controller_of("tab-1").as_deref(),
            Some("site-v2.0.0")
        );
        assert_eq!(
            clients.controller_of("tab-2").as_deref(),
            Some("site-v2.0.0")
        );
    }

    #[test]
    fn test_controller_of_unknown_client_is_none() {
        let clients = Clients::new();
        clients.claim("site-v1.0.0");
        assert_eq!(clients.controller_of("tab-9"), None);
    }

    #[test]
    fn test_empty_registry_has_no_version() {
        let registry = WorkerRegistry::new(Clients::new());
        assert_eq!(registry.current_version(), None);
    }

    #[test]
    fn test_skip_waiting_without_a_waiting_worker_is_a_no_op() {
        let mut registry = WorkerRegistry::new(Clients::new());
        registry.skip_waiting().unwrap();
        assert!(registry.active().is_none());
    }

    #[test]
    fn test_clean_without_active_worker_is_an_error() {
        let mut registry = WorkerRegistry::new(Clients::new());
        let err = registry.handle_message(ControlMessage::CleanOldCaches).unwrap_err();
        assert!(matches!(err, Error::LifecycleError(_)));
    }
}
