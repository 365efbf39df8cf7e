//! Platform abstraction: the filesystem contract and its implementations.

pub mod memory;
pub mod pal;
