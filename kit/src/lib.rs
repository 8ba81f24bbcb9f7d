//! Public facade over [`parsekit_core`].
//!
//! This crate re-exports the engine's surface unchanged; it exists as the
//! stable, semver-versioned entry point for downstream crates, keeping the
//! internal implementation crate free to evolve underneath it.

#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub use parsekit_core::*;
