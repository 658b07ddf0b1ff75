//! Client-side boundary of the object-storage stack.
//!
//! This crate provides:
//! - **Transport capabilities**: [`HttpConnection`] / [`HttpResponse`], the
//!   set a connection must expose to be driven by the client
//! - **Connection opening**: [`ConnectionOpener`], the seam tests replace,
//!   and [`ParsedUrl`], the URL handling every opener goes through
//! - **Authentication boundary**: [`Authenticator`]
//! - **Retry policies**: [`retries`]
//! - **Reference client**: [`StorageClient`]

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod connection;
pub mod errors;
pub mod retries;
pub mod transport;

pub use auth::{AuthCredentials, AuthRequest, Authenticator};
pub use client::StorageClient;
pub use connection::{ConnectionOpener, ConnectionOptions, ParsedUrl};
pub use errors::{BoxedError, ClientError, TransportError};
pub use transport::{Headers, HttpConnection, HttpResponse, RequestHead};
