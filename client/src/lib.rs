// exported modules
pub mod error;
pub mod lang;
pub mod model;

// client impls
pub mod piston;

// re-exports
pub use error::*;
pub use model::*;
pub use piston::{Deployment, Executor, PistonClient, DEFAULT_API_URL, PUBLIC_API_URL};
pub use reqwest::StatusCode;
pub use url::Url;

// internal modules
mod util;
