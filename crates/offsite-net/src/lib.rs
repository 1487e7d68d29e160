// HTTP plumbing for talking to the site origin
pub mod origin;

pub use origin::{OriginClient, OriginError, OriginResponse};
