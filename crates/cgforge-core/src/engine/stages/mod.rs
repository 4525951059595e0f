//! Concrete pipeline stages.
//!
//! Each stage is a [`Processor`](crate::engine::processor::Processor) built
//! from one [`Stage`](crate::engine::pipeline::Stage) record.

use crate::core::models::ids::NodeId;
use crate::core::models::molecule::Molecule;
use crate::core::models::node::NodeRole;
use nalgebra::Point3;

pub mod bonds;
pub mod checkpoint;
pub mod elastic;
pub mod go;
pub mod links;
pub mod mapping;
pub mod merge;
pub mod modifications;
pub mod mutate;
pub mod naming;
pub mod repair;
pub mod restraints;
pub mod secstruct;

pub use bonds::MakeBonds;
pub use checkpoint::Checkpoint;
pub use elastic::ElasticNetwork;
pub use go::VirtualSiteNetwork;
pub use links::ApplyLinks;
pub use mapping::{AverageBeads, DoMapping};
pub use merge::MergeChains;
pub use modifications::CanonicalizeModifications;
pub use mutate::MutateResidues;
pub use naming::NameMoltypes;
pub use repair::RepairGraph;
pub use restraints::PositionRestraints;
pub use secstruct::{AnnotateCollagen, AnnotateDssp, AnnotateSequence};

/// Name of the backbone bead in coarse-grained residues.
pub const BACKBONE_BEAD: &str = "BB";

#[derive(Debug, Clone, Copy)]
pub(crate) struct BackboneBead {
    pub id: NodeId,
    pub chain: char,
    pub resid: isize,
    pub secstruct: Option<char>,
    pub position: Option<Point3<f64>>,
}

/// Backbone beads of a molecule in graph order.
pub(crate) fn backbone_beads(molecule: &Molecule) -> Vec<BackboneBead> {
    molecule
        .nodes()
        .filter(|(_, n)| n.role == NodeRole::Bead && n.name == BACKBONE_BEAD)
        .map(|(id, n)| BackboneBead {
            id,
            chain: n.chain,
            resid: n.resid,
            secstruct: n.secstruct,
            position: n.position,
        })
        .collect()
}
