//! byline-core - Core library for Byline
//!
//! This crate contains the durable subsystems of the Byline publishing
//! platform: the draft autosave/recovery engine and the engagement-counter
//! storage model. Presentational layers (pages, routing, auth) live in the
//! interface crates and consume this one.

pub mod autosave;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod snapshot;
pub mod util;

pub use autosave::{AutosaveSession, RecoveryManager, SessionMode, SessionPhase, SessionStart};
pub use config::AutosaveConfig;
pub use error::{Error, Result};
pub use models::{DraftFields, DraftId, DraftPatch, DraftSnapshot};
