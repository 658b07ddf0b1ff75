//! Scriptable fake transport for exercising the storage client without a
//! live server.
//!
//! This crate provides:
//! - **Scripts**: ordered [`Outcome`]s, one per connection attempt, plus a
//!   typed [`ScriptConfig`] (body, slow mode, header overrides, hooks)
//! - **Fake connections**: [`FakeConnection`], one per attempt, playing both
//!   the connection and the response, including expect/continue and slow I/O
//! - **Connection factory**: [`ConnectionFactory`], issuing attempts in
//!   script order and failing fast once the script is exhausted
//! - **Connection wrapper**: [`ConnectionWrapper`], a drop-in
//!   [`foundation_storage::ConnectionOpener`] that validates what the client
//!   sent
//! - **Collaborator stubs**: [`FakeKeystoneAuth`] and [`CaptureOutput`]
//!
//! # Examples
//!
//! ```rust
//! use foundation_harness::{ConnectionFactory, AttemptArgs, HarnessError, ScriptConfig};
//! use foundation_storage::HttpResponse;
//!
//! let factory = ConnectionFactory::new(
//!     [200, 200],
//!     ScriptConfig::new().etags(["a", "b"]).timestamps(["1", "2"]),
//! );
//!
//! let first = factory.connect(&AttemptArgs::new()).unwrap();
//! assert_eq!(first.get_header("etag").as_deref(), Some("a"));
//!
//! let second = factory.connect(&AttemptArgs::new()).unwrap();
//! assert_eq!(second.get_header("x-timestamp").as_deref(), Some("2"));
//!
//! assert!(matches!(
//!     factory.connect(&AttemptArgs::new()),
//!     Err(HarnessError::ScriptExhausted { scripted: 2 })
//! ));
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Common for testing crates

pub mod attempt;
pub mod auth;
pub mod capture;
pub mod errors;
pub mod factory;
pub mod script;
pub mod wrapper;

pub use attempt::FakeConnection;
pub use auth::FakeKeystoneAuth;
pub use capture::{CaptureOutput, CaptureStream};
pub use errors::{ConfigError, HarnessError, HarnessResult};
pub use factory::{AttemptArgs, ConnectionFactory};
pub use script::{MissingContainer, Outcome, Script, ScriptConfig, ScriptFile};
pub use wrapper::{ConnectionWrapper, WrappedConnection};
