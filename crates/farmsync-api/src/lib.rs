//! Async client for the PestScout farm API.
//!
//! Thin transport layer: bearer-token session handling, JSON decoding of the
//! farm list, and mapping of HTTP failures into [`Error`]. Higher layers
//! (`farmsync-core`) translate [`FarmDto`] wire records into their own types
//! and never see `reqwest` directly.

pub mod auth;
pub mod client;
pub mod error;
mod farms;
pub mod models;
pub mod transport;

pub use auth::{Credentials, TokenPair};
pub use client::PestScoutClient;
pub use error::Error;
pub use models::{FarmDto, LoginRequest, LoginResponse};
pub use transport::{TlsMode, TransportConfig};
