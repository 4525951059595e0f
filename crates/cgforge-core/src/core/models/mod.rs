//! # Core Models Module
//!
//! Data structures representing a molecular system as a sequence of molecule graphs.
//!
//! ## Key Components
//!
//! - [`node`] - Particles (atoms, beads, virtual sites) with residue identity and coordinates
//! - [`topology`] - Edges between nodes and their bond parameters
//! - [`molecule`] - A molecule graph with metadata and position restraints
//! - [`system`] - The ordered molecule sequence processed by a pipeline run
//! - [`ids`] - Stable node identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use cgforge::core::models::{molecule::Molecule, node::Node, system::System};
//!
//! let mut molecule = Molecule::new();
//! let n = molecule.add_node(Node::new("N", "ALA", 1, 'A'));
//! let ca = molecule.add_node(Node::new("CA", "ALA", 1, 'A'));
//! molecule.add_edge(Edge::new(n, ca, EdgeKind::Bond))?;
//!
//! let mut system = System::with_force_field("universal");
//! system.add_molecule(molecule);
//! ```

pub mod ids;
pub mod molecule;
pub mod node;
pub mod system;
pub mod topology;
