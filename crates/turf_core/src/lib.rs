//! # turf_core - Tactics board and playbook engine
//!
//! Domain core of a football tactics board:
//! - formations with snap / free slot binding and role-aware formation switching
//! - pairwise player chemistry and rendered chemistry links
//! - the slot action menu (swap / replace / bench / captain / loan)
//! - playbooks: step editing, timed playback and motion trails
//! - versioned JSON snapshots and named save slots
//!
//! All state lives in one immutable [`RootState`] tree. [`reduce`] is the
//! only way to move it forward; [`Session`] adds timers and autosave.

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Large enum variants - actions are moved, not stored in bulk
#![allow(clippy::large_enum_variant)]

pub mod config;
pub mod data;
pub mod error;
pub mod franchise;
pub mod geometry;
pub mod models;
pub mod playbook;
pub mod save;
pub mod state;
pub mod tactics;

pub use config::{TurfConfig, APP_VERSION};
pub use error::CoreError;
pub use geometry::{PitchPos, Team, TeamView};
pub use save::{SaveError, SaveManager, Snapshot};
pub use state::{reduce, Action, RootState, Session, TacticsState};
