//! # Engine Module
//!
//! Orchestrates a coarse-graining run: validates the configuration, turns it into an
//! ordered list of processor invocations, and executes them over one [`System`].
//!
//! ## Overview
//!
//! A run moves through fixed macro-phases. Repair and canonicalization of the
//! atomistic graph always run, followed by at most one secondary-structure
//! annotation, the resolution mapping, and the optional decorations (elastic or
//! virtual-site network, position restraints, chain merging) before moltypes are
//! named. Every stage is a [`Processor`](processor::Processor) parameterized at
//! build time.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Typed run parameters and their builder
//! - **Validation** ([`validate`]) - Rejects incompatible or unknown options before any work
//! - **Pipeline** ([`pipeline`]) - The deterministic stage list and its execution
//! - **Stages** ([`stages`]) - The concrete processors
//! - **Diagnostics** ([`diagnostics`]) - Non-fatal records accumulated during a run
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! [`System`]: crate::core::models::system::System

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod stages;
pub mod validate;
