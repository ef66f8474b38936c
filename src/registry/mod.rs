//! Artifact store access: client trait, wire types, and the REST implementation.

mod client;
mod rest;

pub use client::{run_relative_source, ArtifactEntry, ArtifactStore, ModelVersion, StoreError};
pub use rest::RestArtifactStore;
