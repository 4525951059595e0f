use crate::core::forcefield::library::ForceField;
use crate::core::models::ids::NodeId;
use crate::core::models::molecule::{CHAIN_KEY, Molecule, SECSTRUCT_KEY};
use crate::core::models::node::{Node, NodeRole};
use crate::core::models::system::System;
use crate::core::models::topology::{Edge, EdgeKind};
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const MAPPING_NAME: &str = "do-mapping";
pub const AVERAGE_NAME: &str = "average-beads";

/// Replaces every atomistic molecule with its coarse-grained counterpart.
///
/// Beads take their type and charge from the target library, adjusted by
/// the modifications recorded on the residue. Bead positions are not set
/// here; each bead keeps the positions of its atoms for [`AverageBeads`].
pub struct DoMapping {
    pub source: String,
    pub target: String,
}

#[derive(Default)]
struct MappingStats {
    residues: usize,
    beads: usize,
    empty_beads: Vec<String>,
}

impl Processor for DoMapping {
    fn name(&self) -> &'static str {
        MAPPING_NAME
    }

    #[instrument(skip_all, name = "do_mapping", fields(from = %self.source, to = %self.target))]
    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(MAPPING_NAME, system)?;
        let target = ctx.registry.get(&self.target)?;

        let mut stats = MappingStats::default();
        let mapped = system
            .molecules()
            .iter()
            .map(|molecule| map_molecule(molecule, target, &mut stats))
            .collect::<Result<Vec<_>, _>>()?;
        system.replace_molecules(mapped);
        system.force_field = Some(target.name.clone());

        ctx.diagnostics.info(
            MAPPING_NAME,
            format!(
                "mapped {} residue(s) onto {} bead(s) of '{}'",
                stats.residues, stats.beads, target.name
            ),
        );
        if !stats.empty_beads.is_empty() {
            ctx.diagnostics.warn(
                MAPPING_NAME,
                format!(
                    "{} bead(s) have no atoms to map from: {}",
                    stats.empty_beads.len(),
                    stats.empty_beads.join(", ")
                ),
            );
        }
        Ok(())
    }
}

fn map_molecule(
    molecule: &Molecule,
    target: &ForceField,
    stats: &mut MappingStats,
) -> Result<Molecule, EngineError> {
    let mut cg = Molecule::new();
    for (key, value) in molecule.metadata() {
        cg.set_meta(key, value.clone());
    }

    let mut chains = String::new();
    let mut secstruct = String::new();
    let mut annotated = false;

    for residue in molecule.residues() {
        let template = target.residue(&residue.resname).ok_or_else(|| {
            EngineError::structural(
                MAPPING_NAME,
                format!(
                    "residue {}{}:{} has no mapping in '{}'",
                    residue.resname, residue.resid, residue.chain, target.name
                ),
            )
        })?;

        let atoms: HashMap<&str, &Node> = residue
            .nodes
            .iter()
            .filter_map(|&id| molecule.node(id))
            .map(|n| (n.name.as_str(), n))
            .collect();
        let first = residue.nodes.first().and_then(|&id| molecule.node(id));
        let code = first.and_then(|n| n.secstruct);
        let modifications = first.map(|n| n.modifications.clone()).unwrap_or_default();

        annotated |= code.is_some();
        secstruct.push(code.unwrap_or('C'));
        if !chains.contains(residue.chain) {
            chains.push(residue.chain);
        }

        let mut beads: HashMap<&str, NodeId> = HashMap::new();
        for bead in &template.beads {
            let mut node = Node::new(&bead.name, &residue.resname, residue.resid, residue.chain);
            node.role = NodeRole::Bead;
            node.bead_type = Some(bead.bead_type.clone());
            node.charge = bead.charge;
            node.secstruct = code;
            node.constituents = bead
                .atoms
                .iter()
                .filter_map(|a| atoms.get(a.as_str()))
                .filter_map(|n| n.position)
                .collect();
            if !bead.atoms.iter().any(|a| atoms.contains_key(a.as_str())) {
                stats.empty_beads.push(format!(
                    "{} of {}{}:{}",
                    bead.name, residue.resname, residue.resid, residue.chain
                ));
            }

            for modification in &modifications {
                for o in target
                    .bead_overrides(modification)
                    .iter()
                    .filter(|o| o.bead == bead.name)
                {
                    if let Some(bead_type) = &o.bead_type {
                        node.bead_type = Some(bead_type.clone());
                    }
                    if let Some(charge) = o.charge {
                        node.charge = charge;
                    }
                }
            }
            node.modifications = modifications.clone();

            beads.insert(bead.name.as_str(), cg.add_node(node));
        }

        for bond in &template.bonds {
            let ends = (beads.get(bond.from.as_str()), beads.get(bond.to.as_str()));
            if let (Some(&a), Some(&b)) = ends {
                cg.add_edge(Edge::new(a, b, EdgeKind::Bond).with_params(bond.params()))
                    .map_err(|e| EngineError::structural(MAPPING_NAME, e.to_string()))?;
            }
        }

        stats.residues += 1;
        stats.beads += beads.len();
    }

    cg.set_meta(CHAIN_KEY, chains);
    if annotated {
        cg.set_meta(SECSTRUCT_KEY, secstruct);
    }
    debug!(beads = cg.len(), "Mapped molecule");
    Ok(cg)
}

/// Places every bead at the centroid of the atoms it was mapped from.
pub struct AverageBeads;

impl Processor for AverageBeads {
    fn name(&self) -> &'static str {
        AVERAGE_NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        let mut undefined = 0;
        for molecule in system.molecules_mut() {
            for (_, node) in molecule.nodes_mut() {
                if node.role != NodeRole::Bead {
                    continue;
                }
                node.position = centroid(&node.constituents);
                if node.position.is_none() {
                    undefined += 1;
                }
            }
        }
        if undefined > 0 {
            ctx.diagnostics.warn(
                AVERAGE_NAME,
                format!("{} bead(s) have no defined position", undefined),
            );
        }
        Ok(())
    }
}

fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}
