//! Model resolution: local manifest scanning and the strategy chain that
//! turns a logical model reference into a concrete artifact location.

mod resolver;
mod scanner;

pub use resolver::{
    ArtifactLocation, ArtifactOrigin, ModelReference, ResolveError, ResolvedArtifact, Resolver,
    StrategyError, StrategyFailure,
};
pub use scanner::ManifestScanner;
