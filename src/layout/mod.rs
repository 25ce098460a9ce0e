//! Pipeline stage tables and the canonical/legacy path scheme.

pub mod identifier;
pub mod pipeline;
pub mod resolver;

pub use identifier::{validate_identifier, IdentifierError};
pub use pipeline::{ArtifactKind, PipelineStage};
pub use resolver::{PathResolver, ResolvedArtifact, SourceLayout};
