// Worker lifecycle, fetch routing and the page-side layer - the brain of the operation
pub mod admission;
pub mod app;
pub mod config;
pub mod contact;
pub mod error;
pub mod events;
pub mod fetch;
pub mod language;
pub mod manifest;
pub mod portfolio;
pub mod prefs;
pub mod push;
pub mod registry;
pub mod request;
pub mod response;
pub mod theme;
pub mod worker;

pub use app::App;
pub use config::Config;
pub use error::Error;
pub use registry::{Clients, ControlMessage, WorkerRegistry};
pub use worker::{CacheWorker, FetchOutcome, Served};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
