//! Two-actor handoff governance: the persisted state record, the
//! active-actor guard, and the handoff/acknowledge/role/stage transitions.

pub mod error;
pub mod guard;
pub mod protocol;
pub mod staleness;
pub mod store;
pub mod templates;
pub mod types;

pub use error::GovernanceError;
pub use guard::ActiveActorGuard;
pub use protocol::{HandoffProtocol, HandoffReceipt, TransitionResult};
pub use staleness::StalenessMonitor;
pub use store::{GovernanceStateStore, StateUpdate};
pub use templates::HandoffTemplates;
pub use types::{Actor, ActiveStage, GovernanceState, HandoffPhase, Role};
