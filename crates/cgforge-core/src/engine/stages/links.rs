use super::backbone_beads;
use crate::core::models::system::System;
use crate::core::models::topology::{Edge, EdgeKind};
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};

pub const NAME: &str = "apply-links";

/// Bonds consecutive backbone beads of each chain.
///
/// Parameters depend on the secondary structure when both residues share
/// one; a gap in residue numbering is treated as a chain break.
pub struct ApplyLinks {
    pub force_field: String,
}

impl Processor for ApplyLinks {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;
        let library = ctx.registry.get(&self.force_field)?;

        let mut links = 0;
        let mut breaks: Vec<String> = Vec::new();
        let mut unparameterized = 0;

        for molecule in system.molecules_mut() {
            let backbone = backbone_beads(molecule);
            for pair in backbone.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.chain != b.chain || b.resid - a.resid != 1 {
                    breaks.push(format!("{}{}/{}{}", a.chain, a.resid, b.chain, b.resid));
                    continue;
                }
                let secstruct = if a.secstruct == b.secstruct {
                    a.secstruct
                } else {
                    None
                };
                let mut edge = Edge::new(a.id, b.id, EdgeKind::Link);
                match library.backbone_params(secstruct) {
                    Some(params) => edge = edge.with_params(params),
                    None => unparameterized += 1,
                }
                molecule
                    .add_edge(edge)
                    .map_err(|e| EngineError::structural(NAME, e.to_string()))?;
                links += 1;
            }
        }

        ctx.diagnostics
            .info(NAME, format!("added {} backbone link(s)", links));
        if !breaks.is_empty() {
            ctx.diagnostics.warn(
                NAME,
                format!("chain break(s) between {}", breaks.join(", ")),
            );
        }
        if unparameterized > 0 {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "'{}' defines no backbone parameters; {} link(s) written without them",
                    library.name, unparameterized
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::registry::ForceFieldRegistry;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::node::{Node, NodeRole};
    use crate::core::models::topology::BondParams;
    use crate::engine::diagnostics::Severity;

    fn bead(resid: isize, ss: char) -> Node {
        let mut node = Node::new("BB", "ALA", resid, 'A');
        node.role = NodeRole::Bead;
        node.secstruct = Some(ss);
        node
    }

    #[test]
    fn links_follow_secondary_structure_and_skip_gaps() {
        let mut mol = Molecule::new();
        for (resid, ss) in [(1, 'H'), (2, 'H'), (3, 'C'), (7, 'C')] {
            mol.add_node(bead(resid, ss));
        }
        let mut system = System::new();
        system.add_molecule(mol);
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);

        ApplyLinks {
            force_field: "martini3001".to_string(),
        }
        .apply(&mut system, &mut ctx)
        .unwrap();

        let params: Vec<Option<BondParams>> = system.molecules()[0]
            .edges()
            .iter()
            .map(|e| e.params)
            .collect();
        assert_eq!(
            params,
            vec![
                Some(BondParams::harmonic(0.310, 7500.0)),
                Some(BondParams::harmonic(0.350, 4000.0)),
            ]
        );
        assert_eq!(ctx.diagnostics.count(Severity::Warning), 1);
    }
}
