use super::molecule::Molecule;

/// A molecular system: an ordered sequence of molecule graphs plus run-level metadata.
///
/// The order of `molecules` is meaningful. Topology output lists molecules
/// in this order, so processors must not reorder it; only chain merging
/// removes molecules, and it keeps the position of the merged molecule.
///
/// A `System` is exclusively owned by one pipeline run and mutated in place
/// by each processor in turn. It is never shared between threads.
#[derive(Debug, Clone, Default)]
pub struct System {
    molecules: Vec<Molecule>,
    /// Name of the force field the system is currently expressed in.
    pub force_field: Option<String>,
    /// Title carried from the input structure into the outputs.
    pub title: String,
    /// Rectangular box dimensions in nanometers, when the input defines them.
    pub box_vectors: Option<[f64; 3]>,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_field(force_field: &str) -> Self {
        Self {
            force_field: Some(force_field.to_string()),
            ..Self::default()
        }
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecules_mut(&mut self) -> &mut [Molecule] {
        &mut self.molecules
    }

    pub fn add_molecule(&mut self, molecule: Molecule) {
        self.molecules.push(molecule);
    }

    /// Replaces the whole molecule sequence, returning the previous one.
    pub fn replace_molecules(&mut self, molecules: Vec<Molecule>) -> Vec<Molecule> {
        std::mem::replace(&mut self.molecules, molecules)
    }

    /// Removes molecules without nodes, keeping the order of the others.
    pub fn remove_empty_molecules(&mut self) -> usize {
        let before = self.molecules.len();
        self.molecules.retain(|m| !m.is_empty());
        before - self.molecules.len()
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    pub fn node_count(&self) -> usize {
        self.molecules.iter().map(Molecule::len).sum()
    }

    pub fn residue_count(&self) -> usize {
        self.molecules.iter().map(|m| m.residues().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }
}
