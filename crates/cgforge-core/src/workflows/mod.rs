//! # Workflows Module
//!
//! End-to-end procedures built from the [`core`](crate::core) and
//! [`engine`](crate::engine) layers.
//!
//! - **Coarsen Workflow** ([`coarsen`]) - Reads an atomistic structure, runs the
//!   configured pipeline, and writes the coarse-grained structure with its
//!   topology files.

pub mod coarsen;
