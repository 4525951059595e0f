use crate::core::models::molecule::{CHAIN_KEY, Molecule, SECSTRUCT_KEY};
use crate::core::models::system::System;
use crate::engine::config::ChainMergeSpec;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use std::collections::HashMap;

pub const NAME: &str = "merge-chains";

/// Merges molecules whose chains belong to the same group.
///
/// Each group collapses into its first molecule, which keeps its position in
/// the sequence; molecules outside every group are left where they are.
pub struct MergeChains {
    pub spec: ChainMergeSpec,
}

impl MergeChains {
    fn group_of(&self, molecule: &Molecule) -> Option<usize> {
        match &self.spec {
            ChainMergeSpec::All => Some(0),
            ChainMergeSpec::Groups(groups) => {
                let chain = molecule.chain()?;
                groups.iter().position(|g| g.contains(&chain))
            }
        }
    }
}

impl Processor for MergeChains {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;

        let molecules = system.replace_molecules(Vec::new());
        let before = molecules.len();
        let mut merged: Vec<Molecule> = Vec::with_capacity(before);
        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut sizes: HashMap<usize, usize> = HashMap::new();

        for molecule in molecules {
            let Some(group) = self.group_of(&molecule) else {
                merged.push(molecule);
                continue;
            };
            *sizes.entry(group).or_insert(0) += 1;
            match slots.get(&group) {
                Some(&slot) => {
                    let chains = combined_chains(&merged[slot], &molecule);
                    let secstruct = combined_secstruct(&merged[slot], &molecule);
                    merged[slot].absorb(molecule);
                    merged[slot].set_meta(CHAIN_KEY, chains);
                    if let Some(secstruct) = secstruct {
                        merged[slot].set_meta(SECSTRUCT_KEY, secstruct);
                    }
                }
                None => {
                    slots.insert(group, merged.len());
                    merged.push(molecule);
                }
            }
        }

        let after = merged.len();
        system.replace_molecules(merged);

        if let ChainMergeSpec::Groups(groups) = &self.spec {
            for (index, group) in groups.iter().enumerate() {
                if sizes.get(&index).copied().unwrap_or(0) < 2 {
                    let chains: String = group.iter().collect();
                    ctx.diagnostics.warn(
                        NAME,
                        format!("merge group '{}' matched fewer than two molecules", chains),
                    );
                }
            }
        }
        ctx.diagnostics.info(
            NAME,
            format!("merged {} molecule(s) into {}", before, after),
        );
        Ok(())
    }
}

fn combined_chains(first: &Molecule, second: &Molecule) -> String {
    let mut chains = chains_of(first);
    for c in chains_of(second).chars() {
        if !chains.contains(c) {
            chains.push(c);
        }
    }
    chains
}

/// Secondary-structure strings follow the node order, so they concatenate.
fn combined_secstruct(first: &Molecule, second: &Molecule) -> Option<String> {
    match (first.meta_str(SECSTRUCT_KEY), second.meta_str(SECSTRUCT_KEY)) {
        (None, None) => None,
        (a, b) => Some(format!("{}{}", a.unwrap_or_default(), b.unwrap_or_default())),
    }
}

fn chains_of(molecule: &Molecule) -> String {
    molecule
        .meta_str(CHAIN_KEY)
        .map(str::to_string)
        .or_else(|| molecule.chain().map(String::from))
        .unwrap_or_default()
}
