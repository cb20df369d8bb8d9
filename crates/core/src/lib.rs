//! Drives one browser session through a fixed sequence of external
//! portals, performing the same identity-number lookup on each, and
//! leaves every resulting tab open for a human to inspect.
//!
//! The pieces, leaves first: [`wait`] is the bounded polling primitive
//! every interaction is built from; [`step`] executes one portal's flow
//! from a declarative [`SiteDefinition`]; [`tabs`] tracks window handles
//! and focus; [`orchestrator`] sequences the steps against one
//! [`Session`], isolating failures per step.

pub mod error;
pub mod orchestrator;
pub mod query;
pub mod session;
pub mod sites;
pub mod step;
pub mod tabs;
pub mod wait;

pub use error::{ConfigError, SessionError, StepError};
pub use orchestrator::{Orchestrator, RunReport, StepRunner, run_all};
pub use query::Query;
pub use session::{Session, SessionConfig};
pub use sites::{builtin_sites, sites_from_file};
pub use step::{Selector, SiteDefinition, StepOutcome};
pub use tabs::TabRegistry;
