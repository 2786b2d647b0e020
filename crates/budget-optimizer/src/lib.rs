//! Engine allocating a fixed monthly income across spending categories by
//! maximizing a user-weighted utility under budget, minimum-spend, and
//! policy-specific constraints, plus the export helpers and HTTP router the
//! service surface builds on.

pub mod config;
pub mod error;
pub mod export;
pub mod optimizer;
pub mod telemetry;
