//! # Force Field Module
//!
//! Force-field libraries and the registry that resolves them by name.
//!
//! A library describes either an atomistic residue set (used to validate and
//! repair input structures) or a coarse-grained one (beads, bonds and link
//! parameters used by the resolution mapping). Two libraries ship with the
//! crate; more can be loaded from TOML files.
//!
//! - [`library`] - The TOML schema of a force-field library
//! - [`registry`] - Name-based lookup and feature queries

pub mod library;
pub mod registry;
