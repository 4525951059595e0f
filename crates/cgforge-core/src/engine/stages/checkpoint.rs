use crate::core::io::format::write_structure;
use crate::core::io::traits::WriteOptions;
use crate::core::models::system::System;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor};
use std::path::PathBuf;
use tracing::info;

pub const NAME: &str = "checkpoint";

/// Writes the current state of the system without changing it.
pub struct Checkpoint {
    pub label: &'static str,
    pub path: PathBuf,
}

impl Processor for Checkpoint {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, _ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        let options = WriteOptions {
            allow_undefined_positions: true,
        };
        write_structure(system, &self.path, &options).map_err(|source| EngineError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(label = self.label, path = %self.path.display(), "Wrote checkpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::registry::ForceFieldRegistry;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::node::Node;
    use tempfile::tempdir;

    #[test]
    fn writes_snapshot_and_leaves_system_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.pdb");
        let mut mol = Molecule::new();
        mol.add_node(Node::new("CA", "GLY", 1, 'A'));
        let mut system = System::new();
        system.add_molecule(mol);

        let registry = ForceFieldRegistry::new();
        let mut ctx = ProcessContext::new(&registry);
        Checkpoint {
            label: "graph",
            path: path.clone(),
        }
        .apply(&mut system, &mut ctx)
        .unwrap();

        assert!(path.exists());
        assert_eq!(system.node_count(), 1);
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn unwritable_path_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("graph.pdb");
        let mut system = System::new();
        let registry = ForceFieldRegistry::new();
        let mut ctx = ProcessContext::new(&registry);

        let err = Checkpoint {
            label: "graph",
            path: path.clone(),
        }
        .apply(&mut system, &mut ctx)
        .unwrap_err();

        assert!(matches!(err, EngineError::Write { path: p, .. } if p == path));
    }
}
