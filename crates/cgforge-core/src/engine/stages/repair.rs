use crate::core::models::system::System;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use std::collections::HashSet;

pub const NAME: &str = "repair-graph";

/// Reconciles the structure with the atomistic source library.
///
/// Residues the library does not define are deleted when `delete_unknown` is
/// set and are an error otherwise. Heavy atoms outside the residue template
/// are dropped with a warning; hydrogens are kept for the mapping to ignore.
pub struct RepairGraph {
    pub force_field: String,
    pub delete_unknown: bool,
}

impl Processor for RepairGraph {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;
        let library = ctx.registry.get(&self.force_field)?;

        let mut unknown_residues: Vec<String> = Vec::new();
        let mut dropped_atoms: Vec<String> = Vec::new();
        let mut incomplete: Vec<String> = Vec::new();

        for molecule in system.molecules_mut() {
            for residue in molecule.residues() {
                let label = format!("{}{}:{}", residue.resname, residue.resid, residue.chain);
                let Some(template) = library.residue(&residue.resname) else {
                    if !self.delete_unknown {
                        return Err(EngineError::structural(
                            NAME,
                            format!(
                                "residue {} is not defined by '{}'",
                                label, library.name
                            ),
                        ));
                    }
                    for id in residue.nodes {
                        molecule.remove_node(id);
                    }
                    unknown_residues.push(label);
                    continue;
                };

                let mut present: HashSet<String> = HashSet::new();
                for id in residue.nodes {
                    let Some(node) = molecule.node(id) else {
                        continue;
                    };
                    let name = node.name.clone();
                    if node.is_hydrogen() || library.accepts_atom(&residue.resname, &name) {
                        present.insert(name);
                    } else {
                        molecule.remove_node(id);
                        dropped_atoms.push(format!("{} in {}", name, label));
                    }
                }

                if template.atoms.iter().any(|a| !present.contains(a)) {
                    incomplete.push(label);
                }
            }
        }

        let removed = system.remove_empty_molecules();

        if !unknown_residues.is_empty() {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "deleted {} unknown residue(s): {}",
                    unknown_residues.len(),
                    unknown_residues.join(", ")
                ),
            );
        }
        if !dropped_atoms.is_empty() {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "dropped {} atom(s) not in their residue template: {}",
                    dropped_atoms.len(),
                    dropped_atoms.join(", ")
                ),
            );
        }
        if !incomplete.is_empty() {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "{} residue(s) are missing template atoms: {}",
                    incomplete.len(),
                    incomplete.join(", ")
                ),
            );
        }
        if removed > 0 {
            ctx.diagnostics
                .info(NAME, format!("removed {} empty molecule(s)", removed));
        }
        if system.is_empty() {
            return Err(EngineError::structural(
                NAME,
                "no molecules remain after repair",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::registry::ForceFieldRegistry;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::node::Node;
    use crate::engine::diagnostics::Severity;

    fn glycine(resid: isize) -> Vec<Node> {
        ["N", "CA", "C", "O"]
            .iter()
            .map(|n| Node::new(n, "GLY", resid, 'A'))
            .collect()
    }

    fn system_with(extra: Vec<Node>) -> System {
        let mut mol = Molecule::new();
        for node in glycine(1).into_iter().chain(extra) {
            mol.add_node(node);
        }
        let mut system = System::new();
        system.add_molecule(mol);
        system
    }

    fn stage(delete_unknown: bool) -> RepairGraph {
        RepairGraph {
            force_field: "universal".to_string(),
            delete_unknown,
        }
    }

    #[test]
    fn complete_residue_passes_without_warnings() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = system_with(vec![Node::new("OXT", "GLY", 1, 'A')]);

        stage(false).apply(&mut system, &mut ctx).unwrap();

        assert_eq!(system.node_count(), 5);
        assert_eq!(ctx.diagnostics.count(Severity::Warning), 0);
    }

    #[test]
    fn unknown_residue_fails_unless_deletion_is_allowed() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let ligand = vec![Node::new("C1", "LIG", 2, 'A')];

        let mut ctx = ProcessContext::new(&registry);
        let mut system = system_with(ligand.clone());
        assert!(matches!(
            stage(false).apply(&mut system, &mut ctx),
            Err(EngineError::Structural { stage: NAME, .. })
        ));

        let mut ctx = ProcessContext::new(&registry);
        let mut system = system_with(ligand);
        stage(true).apply(&mut system, &mut ctx).unwrap();
        assert_eq!(system.node_count(), 4);
        assert_eq!(ctx.diagnostics.count(Severity::Warning), 1);
    }

    #[test]
    fn foreign_heavy_atoms_are_dropped_and_hydrogens_kept() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = system_with(vec![
            Node::new("CB", "GLY", 1, 'A'),
            Node::new("HA2", "GLY", 1, 'A'),
        ]);

        stage(false).apply(&mut system, &mut ctx).unwrap();

        let names: Vec<&str> = system.molecules()[0]
            .nodes()
            .map(|(_, n)| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["N", "CA", "C", "O", "HA2"]);
        assert_eq!(ctx.diagnostics.count(Severity::Warning), 1);
    }

    #[test]
    fn molecule_left_empty_is_removed() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = system_with(Vec::new());
        let mut water = Molecule::new();
        water.add_node(Node::new("OW", "SOL", 2, 'W'));
        system.add_molecule(water);

        stage(true).apply(&mut system, &mut ctx).unwrap();

        assert_eq!(system.molecule_count(), 1);
    }
}
