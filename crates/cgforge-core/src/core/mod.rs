//! # Core Module
//!
//! Data structures and file formats shared by every stage of the coarse-graining
//! pipeline.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Molecule graphs, nodes, edges and the owning system
//! - **Force-Field Libraries** ([`forcefield`]) - Residue templates, bead mappings and the library registry
//! - **File I/O** ([`io`]) - Reading and writing PDB and GRO structures
//! - **Topology Output** ([`topology`]) - Moltype grouping and `.top`/`.itp` serialization
//!
//! Nothing in this module knows about the pipeline itself; the [`crate::engine`]
//! layer builds on these types.

pub mod forcefield;
pub mod io;
pub mod models;
pub mod topology;
