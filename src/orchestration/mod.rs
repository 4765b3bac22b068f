//! Loading, replaying and exporting whole accounts.

pub mod loader;
pub mod orchestrator;

pub use loader::{EventLoader, LoadError, LoadReport, LoadedEvents, StreamCounts};
pub use orchestrator::{AccountReport, OrchestrationError, Orchestrator};
