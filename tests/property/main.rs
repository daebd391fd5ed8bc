//! Property-based soundness tests.
//!
//! Run with: `cargo test --test property`

mod fairness;
mod queue_model;
