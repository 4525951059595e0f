use crate::core::models::ids::NodeId;
use crate::core::models::molecule::Molecule;
use crate::core::models::system::System;
use crate::core::models::topology::{Edge, EdgeKind};
use crate::engine::config::BondingStrategy;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use nalgebra::Point3;
use phf::{Map, phf_map};
use tracing::debug;

/// Single-bond covalent radii in nm.
static COVALENT_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 0.031,
    "C" => 0.076,
    "N" => 0.071,
    "O" => 0.066,
    "F" => 0.057,
    "P" => 0.107,
    "S" => 0.105,
    "CL" => 0.102,
    "SE" => 0.120,
    "BR" => 0.120,
    "I" => 0.139,
};

const FALLBACK_RADIUS: f64 = 0.075;
/// Pairs closer than this are overlapping atoms, not bonds.
const MIN_BOND_LENGTH: f64 = 0.04;

pub const NAME: &str = "make-bonds";

/// Infers covalent bonds from interatomic distances.
///
/// Only atoms of the same residue or of two residues adjacent in the molecule
/// are considered, so the cost stays linear in the number of residues.
pub struct MakeBonds {
    pub strategy: BondingStrategy,
    pub tolerance: f64,
}

impl Processor for MakeBonds {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;
        if self.strategy == BondingStrategy::None {
            ctx.diagnostics
                .info(NAME, "bond inference disabled; the graph has no bonds");
            return Ok(());
        }

        let mut total = 0;
        for molecule in system.molecules_mut() {
            total += self.bond_molecule(molecule)?;
        }
        ctx.diagnostics
            .info(NAME, format!("inferred {} bonds", total));
        Ok(())
    }
}

impl MakeBonds {
    fn bond_molecule(&self, molecule: &mut Molecule) -> Result<usize, EngineError> {
        let residues = molecule.residues();
        let mut bonds: Vec<(NodeId, NodeId)> = Vec::new();

        for (index, residue) in residues.iter().enumerate() {
            let own = self.located(molecule, &residue.nodes);
            for (i, a) in own.iter().enumerate() {
                for b in &own[i + 1..] {
                    if self.bonded(a, b) {
                        bonds.push((a.0, b.0));
                    }
                }
            }
            if let Some(next) = residues.get(index + 1) {
                for a in &own {
                    for b in self.located(molecule, &next.nodes) {
                        if self.bonded(a, &b) {
                            bonds.push((a.0, b.0));
                        }
                    }
                }
            }
        }

        let count = bonds.len();
        for (a, b) in bonds {
            molecule
                .add_edge(Edge::new(a, b, EdgeKind::Bond))
                .map_err(|e| EngineError::structural(NAME, e.to_string()))?;
        }
        debug!(bonds = count, "Bonded molecule");
        Ok(count)
    }

    fn located(&self, molecule: &Molecule, ids: &[NodeId]) -> Vec<(NodeId, Point3<f64>, f64)> {
        ids.iter()
            .filter_map(|&id| {
                let node = molecule.node(id)?;
                let position = node.position?;
                Some((id, position, covalent_radius(&node.element_or_guess())))
            })
            .collect()
    }

    fn bonded(&self, a: &(NodeId, Point3<f64>, f64), b: &(NodeId, Point3<f64>, f64)) -> bool {
        let distance = nalgebra::distance(&a.1, &b.1);
        distance > MIN_BOND_LENGTH && distance <= (a.2 + b.2) * self.tolerance
    }
}

pub(crate) fn covalent_radius(element: &str) -> f64 {
    COVALENT_RADII
        .get(element)
        .copied()
        .unwrap_or(FALLBACK_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::registry::ForceFieldRegistry;
    use crate::core::models::node::Node;

    fn atom(name: &str, resname: &str, resid: isize, x: f64) -> Node {
        Node::new(name, resname, resid, 'A').with_position(Point3::new(x, 0.0, 0.0))
    }

    fn dipeptide() -> System {
        let mut mol = Molecule::new();
        mol.add_node(atom("N", "GLY", 1, 0.000));
        mol.add_node(atom("CA", "GLY", 1, 0.146));
        mol.add_node(atom("C", "GLY", 1, 0.298));
        mol.add_node(atom("N", "GLY", 2, 0.431));
        mol.add_node(atom("CA", "GLY", 2, 0.577));
        let mut system = System::new();
        system.add_molecule(mol);
        system
    }

    fn run(stage: &MakeBonds, system: &mut System) -> Result<(), EngineError> {
        let registry = ForceFieldRegistry::new();
        let mut ctx = ProcessContext::new(&registry);
        stage.apply(system, &mut ctx)
    }

    #[test]
    fn bonds_within_and_between_adjacent_residues() {
        let mut system = dipeptide();
        let stage = MakeBonds {
            strategy: BondingStrategy::Distance,
            tolerance: 1.2,
        };
        run(&stage, &mut system).unwrap();

        let mol = &system.molecules()[0];
        let ids = mol.node_ids().to_vec();
        assert_eq!(mol.edges().len(), 4);
        assert!(mol.has_edge(ids[0], ids[1]));
        assert!(mol.has_edge(ids[2], ids[3]));
        assert!(!mol.has_edge(ids[0], ids[2]));
    }

    #[test]
    fn strategy_none_leaves_the_graph_untouched() {
        let mut system = dipeptide();
        let stage = MakeBonds {
            strategy: BondingStrategy::None,
            tolerance: 1.2,
        };
        run(&stage, &mut system).unwrap();
        assert!(system.molecules()[0].edges().is_empty());
    }

    #[test]
    fn empty_system_is_a_structural_error() {
        let stage = MakeBonds {
            strategy: BondingStrategy::Distance,
            tolerance: 1.2,
        };
        assert!(matches!(
            run(&stage, &mut System::new()),
            Err(EngineError::Structural { stage: NAME, .. })
        ));
    }

    #[test]
    fn unknown_elements_use_the_fallback_radius() {
        assert_eq!(covalent_radius("C"), 0.076);
        assert_eq!(covalent_radius("XX"), FALLBACK_RADIUS);
    }
}
