//! One site step: the scripted query flow for a single external portal.
//!
//! Selectors and timeouts are data ([`SiteDefinition`]), the executor is
//! generic. A step either completes its portal's flow or converts whatever
//! went wrong into a failed [`StepOutcome`]; the only fault it lets escape
//! is the loss of the session itself.

use std::fmt;
use std::time::Duration;

use fantoccini::Locator;
use fantoccini::wd::WindowHandle;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{SessionError, StepError};
use crate::query::Query;
use crate::session::Session;
use crate::tabs::TabRegistry;
use crate::wait;

/// Locator strategy plus identifier, as configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum Selector {
    Css(String),
    Id(String),
    XPath(String),
}

impl Selector {
    pub(crate) fn locator(&self) -> Locator<'_> {
        match self {
            Selector::Css(value) => Locator::Css(value),
            Selector::Id(value) => Locator::Id(value),
            Selector::XPath(value) => Locator::XPath(value),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(value) => write!(f, "css `{value}`"),
            Selector::Id(value) => write!(f, "id `{value}`"),
            Selector::XPath(value) => write!(f, "xpath `{value}`"),
        }
    }
}

/// Declarative description of one portal's query flow. Immutable for the
/// lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDefinition {
    pub name: String,
    pub url: String,
    /// Minimal page-ready condition, usually just `body`.
    pub ready: Selector,
    /// Controls that must be activated before the field accepts input,
    /// e.g. a "search by cédula" radio. Clicked through the DOM because
    /// framework overlays on these portals swallow native clicks.
    #[serde(default)]
    pub setup: Vec<Selector>,
    /// The identity-number input.
    pub field: Selector,
    /// The control that triggers the query.
    pub submit: Selector,
    /// A second control that actually opens the result, when the portal
    /// splits "search" and "view report".
    #[serde(default)]
    pub follow_up: Option<Selector>,
    /// Whether the flow is expected to end in a newly opened tab.
    #[serde(default)]
    pub opens_tab: bool,
    /// Close the tab the flow ran in once the result tab exists. Only
    /// sensible together with `opens_tab`.
    #[serde(default)]
    pub close_own_tab: bool,
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_element_timeout")]
    pub element_timeout_secs: u64,
}

fn default_page_timeout() -> u64 {
    60
}

fn default_element_timeout() -> u64 {
    30
}

impl SiteDefinition {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }
}

/// Pass/fail record of one executed site step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub site: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn pass(site: &str) -> Self {
        Self {
            site: site.to_string(),
            passed: true,
            error: None,
        }
    }

    pub fn fail(site: &str, error: &StepError) -> Self {
        Self {
            site: site.to_string(),
            passed: false,
            error: Some(error.to_string()),
        }
    }
}

/// Runs one portal's flow to completion or to its first unrecoverable
/// sub-step, never past its own boundary.
///
/// Timeouts and interaction failures become a failed [`StepOutcome`];
/// only a [`SessionError`] propagates, because without a session no later
/// step could succeed either.
pub async fn execute(
    query: &Query,
    session: &Session,
    tabs: &mut TabRegistry,
    site: &SiteDefinition,
    first: bool,
) -> Result<StepOutcome, SessionError> {
    info!(target = "consulta", site = %site.name, url = %site.url, "running site step");
    match run_flow(query, session, tabs, site, first).await {
        Ok(()) => {
            info!(target = "consulta", site = %site.name, "site step completed");
            Ok(StepOutcome::pass(&site.name))
        }
        Err(StepError::Session(err)) => Err(err),
        Err(err) => {
            warn!(target = "consulta", site = %site.name, error = %err, "site step failed");
            Ok(StepOutcome::fail(&site.name, &err))
        }
    }
}

async fn run_flow(
    query: &Query,
    session: &Session,
    tabs: &mut TabRegistry,
    site: &SiteDefinition,
    first: bool,
) -> Result<(), StepError> {
    // Every portal after the first gets its own tab so none can overwrite
    // another's navigation. The first reuses the origin tab.
    if !first {
        ensure_focus(session, tabs).await?;
        let handle = session.new_tab().await?;
        session.switch_to(&handle).await?;
        tabs.adopt(handle.clone());
        tabs.set_focused(handle);
    }

    session.goto(&site.url).await?;
    wait::element(session, &site.ready, site.page_timeout()).await?;

    for control in &site.setup {
        let element = wait::clickable(session, control, site.element_timeout()).await?;
        session.click_js(&element).await?;
    }

    let field = wait::clickable(session, &site.field, site.element_timeout()).await?;
    field.clear().await?;
    field.send_keys(query.value()).await?;

    let submit = wait::clickable(session, &site.submit, site.element_timeout()).await?;

    // Baseline for new-tab detection. Taken from the live window list,
    // not the registry: the operator may have closed earlier tabs by
    // hand, and the count only has to grow past what exists right now.
    let live_before = if site.opens_tab {
        session.windows().await?.len()
    } else {
        0
    };

    submit.click().await?;

    if let Some(control) = &site.follow_up {
        let element = wait::clickable(session, control, site.element_timeout()).await?;
        element.click().await?;
    }

    if site.opens_tab {
        adopt_result_tab(session, tabs, site, live_before).await?;
    }

    Ok(())
}

/// Finds the tab the portal just opened by set difference against the
/// handles known before the triggering click, then moves focus onto it.
///
/// Focus settles on the result tab before any cleanup: a failure while
/// closing the landing tab leaves an extra tab open, never a run
/// stranded without a current window or a focus onto a closed handle.
async fn adopt_result_tab(
    session: &Session,
    tabs: &mut TabRegistry,
    site: &SiteDefinition,
    live_before: usize,
) -> Result<(), StepError> {
    wait::window_count(session, live_before + 1, site.element_timeout()).await?;

    let live = session.windows().await?;
    let Some(result_tab) = tabs.discover(&live).into_iter().next() else {
        return Err(StepError::ElementInteraction(
            "window count grew but no unknown handle was reported".to_string(),
        ));
    };

    let own = tabs.focused().clone();
    session.switch_to(&result_tab).await?;
    tabs.set_focused(result_tab.clone());

    if site.close_own_tab && own != result_tab {
        match close_landing_tab(session, &own, &result_tab).await {
            Ok(()) => {
                tabs.remove(&own);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // An extra open tab is benign; a stranded driver is not.
                warn!(target = "consulta", site = %site.name, error = %err, "leaving the landing tab open");
                ensure_focus(session, tabs).await?;
            }
        }
    }

    Ok(())
}

async fn close_landing_tab(
    session: &Session,
    own: &WindowHandle,
    result_tab: &WindowHandle,
) -> Result<(), StepError> {
    session.switch_to(own).await?;
    session.close_current().await?;
    session.switch_to(result_tab).await?;
    Ok(())
}

/// Puts the driver back on a known handle, preferring the registry's
/// focused tab. Handles found dead along the way are dropped from the
/// registry, so a tab closed by the operator costs one miss, not the
/// rest of the run.
async fn ensure_focus(session: &Session, tabs: &mut TabRegistry) -> Result<(), StepError> {
    match session.switch_to(tabs.focused()).await {
        Ok(()) => return Ok(()),
        Err(err) if err.is_fatal() => return Err(err),
        Err(_) => {}
    }

    let dead = tabs.focused().clone();
    tabs.remove(&dead);
    let candidates: Vec<WindowHandle> = tabs.known().iter().rev().cloned().collect();
    for handle in candidates {
        match session.switch_to(&handle).await {
            Ok(()) => {
                tabs.set_focused(handle);
                return Ok(());
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(_) => tabs.remove(&handle),
        }
    }

    Err(StepError::ElementInteraction(
        "no known window handle is still alive".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_parses_with_defaults() {
        let json = r#"{
            "name": "Registro Mercantil",
            "url": "https://example.gob.ec/consulta",
            "ready": { "by": "css", "value": "body" },
            "field": { "by": "id", "value": "cedula" },
            "submit": { "by": "css", "value": "button[type='submit']" }
        }"#;
        let site: SiteDefinition = serde_json::from_str(json).unwrap();
        assert!(site.setup.is_empty());
        assert!(site.follow_up.is_none());
        assert!(!site.opens_tab);
        assert!(!site.close_own_tab);
        assert_eq!(site.page_timeout(), Duration::from_secs(60));
        assert_eq!(site.element_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn definition_rejects_unknown_fields() {
        let json = r#"{
            "name": "x", "url": "y",
            "ready": { "by": "css", "value": "body" },
            "field": { "by": "id", "value": "cedula" },
            "submit": { "by": "id", "value": "go" },
            "retries": 3
        }"#;
        assert!(serde_json::from_str::<SiteDefinition>(json).is_err());
    }

    #[test]
    fn selector_maps_to_its_locator() {
        assert!(matches!(
            Selector::Css("body".into()).locator(),
            Locator::Css("body")
        ));
        assert!(matches!(
            Selector::Id("input_3".into()).locator(),
            Locator::Id("input_3")
        ));
        assert!(matches!(
            Selector::XPath("//button".into()).locator(),
            Locator::XPath("//button")
        ));
    }

    #[test]
    fn outcome_serializes_without_error_on_pass() {
        let pass = serde_json::to_value(StepOutcome::pass("SRI")).unwrap();
        assert_eq!(pass["passed"], true);
        assert!(pass.get("error").is_none());

        let err = StepError::WaitTimeout {
            ms: 1000,
            condition: "element css `#q` to be present".into(),
        };
        let fail = serde_json::to_value(StepOutcome::fail("SRI", &err)).unwrap();
        assert_eq!(fail["passed"], false);
        assert!(
            fail["error"]
                .as_str()
                .unwrap()
                .contains("timed out after 1000ms")
        );
    }
}
