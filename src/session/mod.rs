//! Session scaffolding, advisory pointers and read-only session listings.

pub mod pointer;
pub mod scaffold;
pub mod status;

pub use pointer::{SessionPointer, StagePointer};
pub use scaffold::{
    SessionError, SessionRecord, SessionScaffolder, BLUEPRINT_SESSION, METADATA_DIR,
    REQUIRED_METADATA_FILES,
};
pub use status::{project_status, ProjectStatus, SessionStatus};
