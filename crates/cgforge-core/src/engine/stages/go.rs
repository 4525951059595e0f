use super::backbone_beads;
use crate::core::forcefield::library::FEATURE_GO_MODEL;
use crate::core::models::ids::NodeId;
use crate::core::models::node::{Node, NodeRole};
use crate::core::models::system::System;
use crate::core::models::topology::{BondParams, Edge, EdgeKind};
use crate::engine::config::VirtualSiteNetworkConfig;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use itertools::Itertools;
use nalgebra::Point3;

pub const NAME: &str = "virtual-site-network";

pub const VIRTUAL_SITE_NAME: &str = "CA";
pub const VIRTUAL_SITE_TYPE: &str = "VS";

/// Adds a virtual site on every backbone bead and Go contacts between sites.
///
/// Contact parameters store the Lennard-Jones sigma in `length` and the well
/// depth in `force`; sigma puts the potential minimum at the native distance.
pub struct VirtualSiteNetwork {
    pub force_field: String,
    pub params: VirtualSiteNetworkConfig,
}

struct Site {
    id: NodeId,
    chain: char,
    resid: isize,
    position: Point3<f64>,
}

impl Processor for VirtualSiteNetwork {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        if !ctx.registry.has_feature(&self.force_field, FEATURE_GO_MODEL) {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "'{}' does not support a Go model; no virtual sites were added",
                    self.force_field
                ),
            );
            return Ok(());
        }
        require_molecules(NAME, system)?;

        let p = &self.params;
        let sigma_factor = 2f64.powf(-1.0 / 6.0);
        let (mut sites_added, mut contacts_added) = (0, 0);

        for molecule in system.molecules_mut() {
            let mut sites = Vec::new();
            for bead in backbone_beads(molecule) {
                let Some(host) = molecule.node(bead.id) else {
                    continue;
                };
                let mut site = Node::new(VIRTUAL_SITE_NAME, &host.resname, host.resid, host.chain);
                site.role = NodeRole::VirtualSite;
                site.bead_type = Some(VIRTUAL_SITE_TYPE.to_string());
                site.site_of = Some(bead.id);
                site.secstruct = host.secstruct;
                site.position = host.position;
                let position = site.position;
                let id = molecule.add_node(site);
                sites_added += 1;
                if let Some(position) = position {
                    sites.push(Site {
                        id,
                        chain: bead.chain,
                        resid: bead.resid,
                        position,
                    });
                }
            }

            let contacts: Vec<Edge> = sites
                .iter()
                .tuple_combinations()
                .filter(|(a, b)| {
                    a.chain != b.chain
                        || (b.resid - a.resid).unsigned_abs() >= p.min_sequence_separation
                })
                .filter_map(|(a, b)| {
                    let distance = nalgebra::distance(&a.position, &b.position);
                    (p.lower_cutoff..=p.upper_cutoff)
                        .contains(&distance)
                        .then(|| {
                            Edge::new(a.id, b.id, EdgeKind::GoContact).with_params(BondParams {
                                function: 1,
                                length: distance * sigma_factor,
                                force: p.epsilon,
                            })
                        })
                })
                .collect();

            contacts_added += contacts.len();
            for contact in contacts {
                molecule
                    .add_edge(contact)
                    .map_err(|e| EngineError::structural(NAME, e.to_string()))?;
            }
        }

        ctx.diagnostics.info(
            NAME,
            format!(
                "added {} virtual site(s) and {} Go contact(s)",
                sites_added, contacts_added
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::registry::ForceFieldRegistry;
    use crate::core::models::molecule::Molecule;

    fn chain_of_beads() -> System {
        let mut mol = Molecule::new();
        for resid in 1..=5 {
            let mut bb = Node::new("BB", "ALA", resid, 'A')
                .with_position(Point3::new(0.2 * resid as f64, 0.0, 0.0));
            bb.role = NodeRole::Bead;
            mol.add_node(bb);
            let mut sc = Node::new("SC1", "ALA", resid, 'A');
            sc.role = NodeRole::Bead;
            mol.add_node(sc);
        }
        let mut system = System::new();
        system.add_molecule(mol);
        system
    }

    #[test]
    fn adds_one_site_per_backbone_bead_and_distant_contacts() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = chain_of_beads();

        VirtualSiteNetwork {
            force_field: "martini3001".to_string(),
            params: VirtualSiteNetworkConfig::default(),
        }
        .apply(&mut system, &mut ctx)
        .unwrap();

        let mol = &system.molecules()[0];
        let sites: Vec<&Node> = mol
            .nodes()
            .map(|(_, n)| n)
            .filter(|n| n.role == NodeRole::VirtualSite)
            .collect();
        assert_eq!(sites.len(), 5);
        assert!(sites.iter().all(|s| s.site_of.is_some()));

        // Pairs (1,4), (1,5), (2,5) are far enough apart in sequence; all lie
        // between 0.6 and 0.8 nm, inside the default window.
        let contacts: Vec<_> = mol
            .edges()
            .iter()
            .filter(|e| e.kind == EdgeKind::GoContact)
            .collect();
        assert_eq!(contacts.len(), 3);
        let sigma = contacts[0].params.unwrap().length;
        assert!((sigma * 2f64.powf(1.0 / 6.0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn unsupported_force_field_adds_nothing() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let mut ctx = ProcessContext::new(&registry);
        let mut system = chain_of_beads();

        VirtualSiteNetwork {
            force_field: "universal".to_string(),
            params: VirtualSiteNetworkConfig::default(),
        }
        .apply(&mut system, &mut ctx)
        .unwrap();

        assert_eq!(system.node_count(), 10);
    }
}
