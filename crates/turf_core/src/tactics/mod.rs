//! Tactics sub-models
//!
//! - [`chemistry`]: pairwise compatibility scores and link tiers
//! - [`slots`]: slot bindings under snap / free positioning
//! - [`slot_action`]: swap / replace / bench / captain / loan menu

pub mod chemistry;
pub mod slot_action;
pub mod slots;

pub use chemistry::{chemistry_links, ChemistryLink, ChemistryTable, LinkTier};
pub use slot_action::SlotDecision;
