//! Moltype grouping and GROMACS topology output.
//!
//! A finished system is split into runs of consecutive molecules sharing a
//! moltype. Each distinct moltype gets one `.itp` description, and the `.top`
//! document lists every run in its original order.

pub mod document;
pub mod error;
pub mod grouping;
pub mod itp;

pub use document::{TopologyOptions, TopologyReport, build_topology, write_topology};
pub use error::TopologyError;
pub use grouping::{MoltypeGroup, group_by_moltype};
