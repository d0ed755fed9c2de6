//! Configuration for the catalog search binary.

pub mod dependencies;

pub use dependencies::Dependencies;
