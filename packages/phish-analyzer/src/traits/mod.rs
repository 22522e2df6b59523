//! Core trait abstractions for the analysis pipeline.
//!
//! The pipeline only talks to the network through these traits, so
//! applications and tests can swap the HTTP fetcher or the model backend.

pub mod fetcher;
pub mod model;
