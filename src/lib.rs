//! judge-core — the sandboxed run engine, submission scheduler, and
//! verdict classifier behind an online judge.
//!
//! This crate is the Judge Core only: compiling/running a submission
//! inside a disposable container, classifying the outcome, and
//! persisting a verdict. The HTTP API, auth, and problem/test-case CRUD
//! that sit around it are out of scope and expected to depend on this
//! crate, not the other way around.
//!
//! # Architecture
//!
//! - **Runner** (`runner`) — one-shot sandboxed execution for a single
//!   (language, code, test, limits) tuple.
//! - **Classifier** (`classifier`) — maps a raw outcome to a verdict.
//! - **Dispatcher** (`dispatcher`) — orchestrates one submission
//!   end-to-end.
//! - **Scheduler** (`scheduler`) — bounded worker pool over the
//!   dispatcher.
//! - **Warmer** (`warmer`) — background image pre-pull at startup.
//! - **Lifecycle** (`lifecycle`) — submission state-transition guard.
//!
//! [`core::JudgeCore`] wires all of the above into the crate's public
//! facade: `schedule(uuid)` and `stop()`.

pub mod cancel;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod core;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod runner;
pub mod scheduler;
pub mod utils;
pub mod warmer;

pub use config::Config;
pub use core::JudgeCore;
pub use error::{CoreError, CoreResult};
