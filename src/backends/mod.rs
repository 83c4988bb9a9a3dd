//! Backend implementations.

#[cfg(feature = "mock")]
pub mod mock;

pub mod vault;
