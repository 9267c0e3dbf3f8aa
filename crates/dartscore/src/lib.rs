//! `dartscore` - An HTTP service for tracking darts game scores
//!
//! This library provides the record types, `SQLite` storage, configuration and
//! the axum router behind the `dartscore` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod darts;
pub mod error;
pub mod logging;
pub mod server;
pub mod storage;

pub use api::{router, AppState};
pub use config::Config;
pub use darts::{Dart, DartPatch, NewDart, Page};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
