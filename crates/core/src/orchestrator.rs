//! Sequences every configured site step against one browser session.
//!
//! The orchestrator has no failure state of its own: a step that fails is
//! recorded and the sequence moves on unconditionally. The single fault
//! that aborts a run is the loss of the session itself, because no later
//! step could succeed without one.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SessionError, StepError};
use crate::query::Query;
use crate::session::{Session, SessionConfig};
use crate::step::{self, SiteDefinition, StepOutcome};
use crate::tabs::TabRegistry;

/// Ordered outcomes of one run, one entry per configured site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }
}

/// Executes one site step. The seam between sequencing and browser work,
/// so the former is testable without the latter.
#[async_trait]
pub trait StepRunner {
    async fn run_step(
        &mut self,
        index: usize,
        site: &SiteDefinition,
    ) -> Result<StepOutcome, SessionError>;
}

/// Drives every site in order, collecting one outcome per site.
///
/// Any `Ok` outcome, failed or not, advances the sequence; only a session
/// fault stops it. This "continue regardless" behavior is the contract,
/// not an accident of error swallowing.
pub async fn run_all(
    sites: &[SiteDefinition],
    runner: &mut (dyn StepRunner + Send),
) -> Result<RunReport, SessionError> {
    let mut report = RunReport::default();
    for (index, site) in sites.iter().enumerate() {
        debug!(target = "consulta", index, site = %site.name, "advancing to step");
        let outcome = runner.run_step(index, site).await?;
        report.outcomes.push(outcome);
    }
    Ok(report)
}

struct LiveRunner<'a> {
    query: &'a Query,
    session: &'a Session,
    tabs: TabRegistry,
}

#[async_trait]
impl StepRunner for LiveRunner<'_> {
    async fn run_step(
        &mut self,
        index: usize,
        site: &SiteDefinition,
    ) -> Result<StepOutcome, SessionError> {
        step::execute(self.query, self.session, &mut self.tabs, site, index == 0).await
    }
}

/// Owns the site sequence and the session configuration for a run.
pub struct Orchestrator {
    sites: Vec<SiteDefinition>,
    session_config: SessionConfig,
}

impl Orchestrator {
    pub fn new(sites: Vec<SiteDefinition>, session_config: SessionConfig) -> Self {
        Self {
            sites,
            session_config,
        }
    }

    pub fn sites(&self) -> &[SiteDefinition] {
        &self.sites
    }

    /// Runs the full sequence against a freshly connected session.
    ///
    /// The session is deliberately not torn down on completion: every tab
    /// the run opened stays on screen for the operator to inspect. The
    /// returned report holds one outcome per configured site, in order.
    pub async fn run(&self, query: &Query) -> Result<RunReport, SessionError> {
        info!(target = "consulta", sites = self.sites.len(), "starting orchestration run");
        let session = Session::connect(&self.session_config).await?;

        let origin = match session.current_window().await {
            Ok(handle) => handle,
            // Cannot even read the handle set: nothing could run.
            Err(StepError::Session(err)) => return Err(err),
            Err(other) => return Err(SessionError::Lost(other.to_string())),
        };

        let mut runner = LiveRunner {
            query,
            session: &session,
            tabs: TabRegistry::new(origin),
        };
        let report = run_all(&self.sites, &mut runner).await?;

        info!(
            target = "consulta",
            passed = report.passed_count(),
            total = report.len(),
            "orchestration run completed"
        );
        // `session` drops here without closing the browser: the tabs are
        // the product of the run.
        Ok(report)
    }
}
