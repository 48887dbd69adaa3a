//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the upload core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISessionNegotiator`] - Opens/queries upload sessions, looks up existing files
//! - [`IRequestExecutor`] - Sends raw HTTP requests against the upload URL

pub mod request_executor;
pub mod session_negotiator;

pub use request_executor::{HttpRequest, HttpResponse, IRequestExecutor, RequestMethod};
pub use session_negotiator::ISessionNegotiator;
