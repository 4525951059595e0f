use crate::core::models::system::System;
use crate::engine::config::ResidueEdit;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor};

pub const NAME: &str = "mutate-residues";

/// Renames every residue matched by an edit to the edit's target.
///
/// Edits are applied in order against the structure as it stands, so a later
/// edit sees the names written by earlier ones. Atoms that do not belong to
/// the new residue are left for graph repair to remove.
pub struct MutateResidues {
    pub edits: Vec<ResidueEdit>,
}

impl Processor for MutateResidues {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        for edit in &self.edits {
            let mut touched = 0;
            for molecule in system.molecules_mut() {
                for (_, node) in molecule.nodes_mut() {
                    if edit.matches(node.chain, &node.resname, node.resid) {
                        node.resname = edit.target.clone();
                        touched += 1;
                    }
                }
            }
            if touched == 0 {
                return Err(EngineError::ResidueNotFound {
                    stage: NAME,
                    edit: edit.clone(),
                });
            }
            ctx.diagnostics
                .info(NAME, format!("applied {} to {} atoms", edit, touched));
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

    fn system() -> System {
        let mut mol = Molecule::new();
        mol.add_node(Node::new("CA", "PHE", 45, 'A'));
        mol.add_node(Node::new("CB", "PHE", 45, 'A'));
        mol.add_node(Node::new("CA", "PHE", 46, 'A'));
        let mut system = System::new();
        system.add_molecule(mol);
        system
    }

    fn edit(resid: isize, target: &str) -> ResidueEdit {
        ResidueEdit {
            chain: Some('A'),
            resname: Some("PHE".to_string()),
            resid: Some(resid),
            target: target.to_string(),
        }
    }

    #[test]
    fn renames_only_the_selected_residue() {
        let registry = ForceFieldRegistry::new();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = system();

        MutateResidues {
            edits: vec![edit(45, "ALA")],
        }
        .apply(&mut system, &mut ctx)
        .unwrap();

        let names: Vec<&str> = system.molecules()[0]
            .nodes()
            .map(|(_, n)| n.resname.as_str())
            .collect();
        assert_eq!(names, vec!["ALA", "ALA", "PHE"]);
    }

    #[test]
    fn unmatched_edit_is_an_error() {
        let registry = ForceFieldRegistry::new();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = system();

        let result = MutateResidues {
            edits: vec![edit(99, "ALA")],
        }
        .apply(&mut system, &mut ctx);

        assert!(matches!(
            result,
            Err(EngineError::ResidueNotFound { stage: NAME, .. })
        ));
    }
}
