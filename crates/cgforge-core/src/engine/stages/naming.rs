use crate::core::models::molecule::{MOLTYPE_KEY, Molecule, SECSTRUCT_KEY};
use crate::core::models::system::System;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use std::collections::HashMap;

pub const NAME: &str = "name-moltypes";

/// Assigns `<prefix>_<n>` moltype names in order of first appearance.
///
/// Molecules that would produce the same topology description share a name.
/// The molecule order is never changed.
pub struct NameMoltypes {
    pub prefix: String,
}

impl Processor for NameMoltypes {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;

        let mut names: HashMap<String, String> = HashMap::new();
        for molecule in system.molecules_mut() {
            let next = names.len();
            let name = names
                .entry(signature(molecule))
                .or_insert_with(|| format!("{}_{}", self.prefix, next))
                .clone();
            molecule.set_meta(MOLTYPE_KEY, name);
        }

        ctx.diagnostics.info(
            NAME,
            format!(
                "{} molecule(s) share {} moltype(s)",
                system.molecule_count(),
                names.len()
            ),
        );
        Ok(())
    }
}

/// Everything that ends up in a molecule's topology description.
fn signature(molecule: &Molecule) -> String {
    let serials = molecule.serial_numbers();
    let nodes = molecule.nodes().map(|(_, n)| {
        let host = n.site_of.and_then(|h| serials.get(h)).copied();
        format!(
            "{}|{}|{}|{}|{:?}|{:.4}|{:?};",
            n.name,
            n.resname,
            n.resid,
            n.bead_type.as_deref().unwrap_or(""),
            n.role,
            n.charge,
            host
        )
    });
    let edges = molecule.edges().iter().map(|e| {
        let params = e
            .params
            .map(|p| format!(":{}:{:.5}:{:.3}", p.function, p.length, p.force))
            .unwrap_or_default();
        format!(
            "{:?}-{:?}:{}{};",
            serials.get(e.a),
            serials.get(e.b),
            e.kind,
            params
        )
    });
    let restraints = molecule
        .position_restraints()
        .iter()
        .map(|(id, fc)| format!("{:?}@{:.3};", serials.get(*id), fc));

    let mut sig: String = nodes.chain(edges).chain(restraints).collect();
    if let Some(ss) = molecule.meta_str(SECSTRUCT_KEY) {
        sig.push_str(ss);
    }
    sig
}
