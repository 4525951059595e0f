//! Provides input/output functionality for molecular structure formats.
//!
//! Readers turn a file into a [`System`](crate::core::models::system::System)
//! of molecule graphs without bonds or force-field assignment; writers emit
//! the final coordinates. The format is chosen from the file extension.

pub mod error;
pub mod format;
pub mod gro;
pub mod pdb;
pub mod traits;
