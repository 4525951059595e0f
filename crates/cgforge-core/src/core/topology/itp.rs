use crate::core::models::ids::NodeId;
use crate::core::models::molecule::{Molecule, SECSTRUCT_KEY};
use crate::core::models::node::NodeRole;
use crate::core::models::topology::{Edge, EdgeKind};
use slotmap::SecondaryMap;
use std::fmt;

pub const RUBBER_BANDS_DEFINE: &str = "RUBBER_BANDS";
pub const GO_VIRT_DEFINE: &str = "GO_VIRT";
pub const POSRES_DEFINE: &str = "POSRES";
pub const POSRES_FC_DEFINE: &str = "POSRES_FC";

const NREXCL: u8 = 1;

/// Renders the molecule description (`.itp`) for one moltype.
///
/// The molecule passed in is the representative of its moltype; every other
/// molecule with the same moltype is assumed to be topologically identical.
pub fn render_itp(molecule: &Molecule, moltype: &str, header: &[String]) -> String {
    MoleculeDescription {
        molecule,
        moltype,
        header,
        serials: molecule.serial_numbers(),
    }
    .to_string()
}

struct MoleculeDescription<'a> {
    molecule: &'a Molecule,
    moltype: &'a str,
    header: &'a [String],
    serials: SecondaryMap<NodeId, usize>,
}

impl fmt::Display for MoleculeDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secstruct = self.molecule.meta_str(SECSTRUCT_KEY);
        for line in self.header {
            writeln!(f, "; {}", line)?;
        }
        if let Some(ss) = secstruct {
            writeln!(f, "; Secondary structure: {}", ss)?;
        }
        if !self.header.is_empty() || secstruct.is_some() {
            writeln!(f)?;
        }

        writeln!(f, "[ moleculetype ]")?;
        writeln!(f, "; name nrexcl")?;
        writeln!(f, "{} {}", self.moltype, NREXCL)?;

        self.write_atoms(f)?;

        let bonds = self.edges_of(&[EdgeKind::Bond, EdgeKind::Link]);
        if !bonds.is_empty() {
            writeln!(f, "\n[ bonds ]")?;
            self.write_bonds(f, &bonds)?;
        }

        let elastic = self.edges_of(&[EdgeKind::Elastic]);
        if !elastic.is_empty() {
            writeln!(f, "\n#ifdef {}", RUBBER_BANDS_DEFINE)?;
            writeln!(f, "[ bonds ]")?;
            self.write_bonds(f, &elastic)?;
            writeln!(f, "#endif")?;
        }

        // Go contacts carry sigma in `length` and epsilon in `force`.
        let contacts = self.edges_of(&[EdgeKind::GoContact]);
        if !contacts.is_empty() {
            writeln!(f, "\n#ifdef {}", GO_VIRT_DEFINE)?;
            writeln!(f, "[ pairs ]")?;
            self.write_bonds(f, &contacts)?;
            writeln!(f, "#endif")?;
        }

        self.write_virtual_sites(f)?;
        self.write_position_restraints(f)
    }
}

impl MoleculeDescription<'_> {
    fn edges_of(&self, kinds: &[EdgeKind]) -> Vec<&Edge> {
        self.molecule
            .edges()
            .iter()
            .filter(|e| kinds.contains(&e.kind))
            .collect()
    }

    fn write_atoms(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n[ atoms ]")?;
        writeln!(f, ";  id type     resnr residue atom   cgnr  charge")?;
        for (id, node) in self.molecule.nodes() {
            let serial = self.serials[id];
            let bead_type = node.bead_type.as_deref().unwrap_or(&node.name);
            writeln!(
                f,
                "{:>5} {:<8} {:>5} {:<7} {:<5} {:>5} {:>7.3}",
                serial, bead_type, node.resid, node.resname, node.name, serial, node.charge
            )?;
        }
        Ok(())
    }

    fn write_bonds(&self, f: &mut fmt::Formatter<'_>, edges: &[&Edge]) -> fmt::Result {
        for edge in edges {
            let (Some(a), Some(b)) = (self.serials.get(edge.a), self.serials.get(edge.b)) else {
                continue;
            };
            match edge.params {
                Some(p) => writeln!(
                    f,
                    "{:>5} {:>5} {:>3} {:>9.5} {:>9.1}",
                    a, b, p.function, p.length, p.force
                )?,
                None => writeln!(f, "{:>5} {:>5} {:>3}", a, b, 1)?,
            }
        }
        Ok(())
    }

    fn write_virtual_sites(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sites: Vec<(usize, usize)> = self
            .molecule
            .nodes()
            .filter(|(_, node)| node.role == NodeRole::VirtualSite)
            .filter_map(|(id, node)| {
                let host = node.site_of.and_then(|h| self.serials.get(h))?;
                Some((self.serials[id], *host))
            })
            .collect();
        if sites.is_empty() {
            return Ok(());
        }

        writeln!(f, "\n[ virtual_sitesn ]")?;
        for (site, host) in sites {
            writeln!(f, "{:>5} {:>3} {:>5}", site, 1, host)?;
        }
        Ok(())
    }

    fn write_position_restraints(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let restraints = self.molecule.position_restraints();
        let Some(&(_, default_fc)) = restraints.first() else {
            return Ok(());
        };

        writeln!(f, "\n#ifdef {}", POSRES_DEFINE)?;
        writeln!(f, "#ifndef {}", POSRES_FC_DEFINE)?;
        writeln!(f, "#define {} {:.2}", POSRES_FC_DEFINE, default_fc)?;
        writeln!(f, "#endif")?;
        writeln!(f, "[ position_restraints ]")?;
        for &(id, fc) in restraints {
            let Some(serial) = self.serials.get(id) else {
                continue;
            };
            if fc == default_fc {
                writeln!(
                    f,
                    "{:>5} {:>3} {fc} {fc} {fc}",
                    serial,
                    1,
                    fc = POSRES_FC_DEFINE
                )?;
            } else {
                writeln!(f, "{:>5} {:>3} {fc:.2} {fc:.2} {fc:.2}", serial, 1, fc = fc)?;
            }
        }
        writeln!(f, "#endif")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::node::Node;
    use crate::core::models::topology::BondParams;

    fn two_bead_molecule() -> (Molecule, NodeId, NodeId) {
        let mut mol = Molecule::new();
        let mut bb = Node::new("BB", "LYS", 1, 'A');
        bb.role = NodeRole::Bead;
        bb.bead_type = Some("P2".to_string());
        let mut sc = Node::new("SC1", "LYS", 1, 'A');
        sc.role = NodeRole::Bead;
        sc.bead_type = Some("Q5".to_string());
        sc.charge = 1.0;
        let a = mol.add_node(bb);
        let b = mol.add_node(sc);
        let bond = Edge::new(a, b, EdgeKind::Bond).with_params(BondParams::harmonic(0.33, 5000.0));
        mol.add_edge(bond).unwrap();
        (mol, a, b)
    }

    #[test]
    fn renders_core_sections_in_order() {
        let (mol, _, _) = two_bead_molecule();
        let text = render_itp(&mol, "Protein_A", &["generated".to_string()]);

        assert!(text.starts_with("; generated\n"));
        let moltype = text.find("[ moleculetype ]").unwrap();
        let atoms = text.find("[ atoms ]").unwrap();
        let bonds = text.find("[ bonds ]").unwrap();
        assert!(moltype < atoms && atoms < bonds);
        assert!(text.contains("Protein_A 1\n"));
        assert!(text.contains("    2 Q5           1 LYS     SC1       2   1.000\n"));
        assert!(text.contains("    1     2   1   0.33000    5000.0\n"));
        assert!(!text.contains("#ifdef"));
    }

    #[test]
    fn elastic_and_go_edges_are_guarded_by_defines() {
        let (mut mol, a, b) = two_bead_molecule();
        let c = mol.add_node(Node::new("BB", "GLY", 2, 'A'));
        mol.add_edge(Edge::new(a, c, EdgeKind::Elastic).with_params(BondParams {
            function: 6,
            length: 0.7,
            force: 700.0,
        }))
        .unwrap();
        let contact =
            Edge::new(b, c, EdgeKind::GoContact).with_params(BondParams::harmonic(0.6, 9.414));
        mol.add_edge(contact).unwrap();
        let text = render_itp(&mol, "P", &[]);

        let rubber = text.find("#ifdef RUBBER_BANDS").unwrap();
        let go = text.find("#ifdef GO_VIRT").unwrap();
        assert!(rubber < go);
        assert!(text.contains("    1     3   6   0.70000     700.0\n"));
        assert!(text[go..].contains("[ pairs ]"));
    }

    #[test]
    fn virtual_sites_reference_their_host() {
        let (mut mol, a, _) = two_bead_molecule();
        let mut site = Node::new("CA", "LYS", 1, 'A');
        site.role = NodeRole::VirtualSite;
        site.site_of = Some(a);
        mol.add_node(site);
        let text = render_itp(&mol, "P", &[]);

        assert!(text.contains("[ virtual_sitesn ]\n    3   1     1\n"));
    }

    #[test]
    fn position_restraints_use_the_overridable_define() {
        let (mut mol, a, b) = two_bead_molecule();
        mol.add_position_restraint(a, 1000.0).unwrap();
        mol.add_position_restraint(b, 500.0).unwrap();
        let text = render_itp(&mol, "P", &[]);

        assert!(text.contains("#ifndef POSRES_FC\n#define POSRES_FC 1000.00\n#endif\n"));
        assert!(text.contains("    1   1 POSRES_FC POSRES_FC POSRES_FC\n"));
        assert!(text.contains("    2   1 500.00 500.00 500.00\n"));
    }

    #[test]
    fn secondary_structure_is_written_as_a_comment() {
        let (mut mol, _, _) = two_bead_molecule();
        mol.set_meta(SECSTRUCT_KEY, "H");
        let text = render_itp(&mol, "P", &[]);
        assert!(text.starts_with("; Secondary structure: H\n\n[ moleculetype ]"));
    }
}
