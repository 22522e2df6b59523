//! Model client implementations for the analysis pipeline.
//!
//! This module provides the reference implementation of the `ModelClient`
//! trait. Users can use it directly or implement their own.

#[cfg(feature = "ollama")]
mod ollama;
