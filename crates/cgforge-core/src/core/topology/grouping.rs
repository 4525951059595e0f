use super::error::TopologyError;
use crate::core::models::system::System;

/// A maximal run of consecutive molecules sharing one moltype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoltypeGroup {
    pub moltype: String,
    pub count: usize,
    /// Index of the group's first molecule in the system.
    pub first_index: usize,
}

/// Partitions the molecule sequence into runs of equal moltype, in order.
///
/// Only consecutive molecules are merged: `[A, A, B, A]` yields
/// `[(A, 2), (B, 1), (A, 1)]`.
pub fn group_by_moltype(system: &System) -> Result<Vec<MoltypeGroup>, TopologyError> {
    if system.is_empty() {
        return Err(TopologyError::EmptySystem);
    }

    let mut groups: Vec<MoltypeGroup> = Vec::new();
    for (index, molecule) in system.molecules().iter().enumerate() {
        let moltype = molecule
            .moltype()
            .ok_or(TopologyError::MissingMoltype { index })?;
        match groups.last_mut() {
            Some(last) if last.moltype == moltype => last.count += 1,
            _ => groups.push(MoltypeGroup {
                moltype: moltype.to_string(),
                count: 1,
                first_index: index,
            }),
        }
    }
    Ok(groups)
}
