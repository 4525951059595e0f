use crate::core::forcefield::library::ForceField;
use crate::core::models::molecule::Molecule;
use crate::core::models::system::System;
use crate::engine::config::ResidueEdit;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};

pub const NAME: &str = "canonicalize-modifications";

pub const N_TERMINUS: &str = "N-ter";
pub const C_TERMINUS: &str = "C-ter";

/// Records residue modifications on the graph.
///
/// Termini are tagged on the first and last known residue of every molecule
/// when the library defines them; user edits are applied afterwards.
pub struct CanonicalizeModifications {
    pub force_field: String,
    pub edits: Vec<ResidueEdit>,
}

impl Processor for CanonicalizeModifications {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;
        let library = ctx.registry.get(&self.force_field)?;

        let mut termini = 0;
        for molecule in system.molecules_mut() {
            termini += tag_termini(molecule, library);
        }
        if termini > 0 {
            ctx.diagnostics
                .info(NAME, format!("tagged {} terminal residue(s)", termini));
        }

        for edit in &self.edits {
            if !library.has_modification(&edit.target) {
                return Err(EngineError::structural(
                    NAME,
                    format!(
                        "modification '{}' is not defined by '{}'",
                        edit.target, library.name
                    ),
                ));
            }
            let mut touched = 0;
            for molecule in system.molecules_mut() {
                for (_, node) in molecule.nodes_mut() {
                    if edit.matches(node.chain, &node.resname, node.resid) {
                        add_modification(&mut node.modifications, &edit.target);
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
        }
        Ok(())
    }
}

fn tag_termini(molecule: &mut Molecule, library: &ForceField) -> usize {
    let residues: Vec<_> = molecule
        .residues()
        .into_iter()
        .filter(|r| library.residue(&r.resname).is_some())
        .collect();
    let (Some(first), Some(last)) = (residues.first(), residues.last()) else {
        return 0;
    };

    let mut tagged = 0;
    for (residue, modification) in [(first, N_TERMINUS), (last, C_TERMINUS)] {
        if !library.has_modification(modification) {
            continue;
        }
        for &id in &residue.nodes {
            if let Some(node) = molecule.node_mut(id) {
                add_modification(&mut node.modifications, modification);
            }
        }
        tagged += 1;
    }
    tagged
}

fn add_modification(modifications: &mut Vec<String>, name: &str) {
    if !modifications.iter().any(|m| m == name) {
        modifications.push(name.to_string());
    }
}
