//! Background refinement sessions for the web front end.

mod manager;
mod record;
mod registry;

pub use manager::SessionManager;
pub use record::{FinalResult, SessionRecord, SessionStatus, SessionSummary};
pub use registry::SessionRegistry;
