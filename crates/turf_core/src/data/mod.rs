//! Embedded seed data

pub mod seed;

pub use seed::{library_play, role_category, seed, SeedData};
