//! # cgforge Core Library
//!
//! Converts atomistic protein structures into coarse-grained models and writes
//! GROMACS-style topologies for them.
//!
//! ## Architectural Philosophy
//!
//! The library keeps three layers apart:
//!
//! - **[`core`]: The Foundation.** Molecule graphs (`System`, `Molecule`), the
//!   force-field and mapping registry, structure file I/O, and topology grouping
//!   and serialization.
//!
//! - **[`engine`]: The Logic Core.** Configuration and its validator, the
//!   `Processor` contract with the concrete stages, and the `PipelineBuilder`
//!   that turns a configuration into a deterministic list of stages.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together. The
//!   `coarsen` workflow is the single entry point a front end needs.

pub mod core;
pub mod engine;
pub mod workflows;
