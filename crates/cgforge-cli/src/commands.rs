pub mod forcefields;
pub mod map;
