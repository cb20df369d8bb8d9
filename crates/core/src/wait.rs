//! Bounded polling waits, the primitive every site step is built from.
//!
//! Third-party portals render late, redirect mid-flight, and gate their
//! controls behind scripts; every interaction therefore waits for its
//! precondition first. The wait never retries the page action itself, it
//! only polls for the precondition until a per-call timeout elapses.

use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use tokio::time::sleep;
use tracing::trace;

use crate::error::StepError;
use crate::session::Session;
use crate::step::Selector;

/// Fixed poll interval, matching what remote drivers themselves use.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A condition over the current document that can be polled for.
#[derive(Debug)]
pub enum WaitCondition<'a> {
    /// The element exists in the DOM.
    Present(&'a Selector),
    /// The element exists, is displayed, and is enabled.
    Clickable(&'a Selector),
    /// The session has at least this many windows.
    WindowCount(usize),
}

impl WaitCondition<'_> {
    /// Human description carried into the timeout error.
    pub fn describe(&self) -> String {
        match self {
            Self::Present(selector) => format!("element {selector} to be present"),
            Self::Clickable(selector) => format!("element {selector} to be clickable"),
            Self::WindowCount(count) => format!("window count to reach {count}"),
        }
    }
}

enum Probe {
    Satisfied(Option<Element>),
    NotYet,
}

/// Waits for `selector` to be present, returning the element.
pub async fn element(
    session: &Session,
    selector: &Selector,
    timeout: Duration,
) -> Result<Element, StepError> {
    let found = hold(session, WaitCondition::Present(selector), timeout).await?;
    found.ok_or_else(|| StepError::ElementInteraction(format!("{selector} vanished after wait")))
}

/// Waits for `selector` to be clickable, returning the element.
pub async fn clickable(
    session: &Session,
    selector: &Selector,
    timeout: Duration,
) -> Result<Element, StepError> {
    let found = hold(session, WaitCondition::Clickable(selector), timeout).await?;
    found.ok_or_else(|| StepError::ElementInteraction(format!("{selector} vanished after wait")))
}

/// Waits for the session to report at least `count` windows.
pub async fn window_count(
    session: &Session,
    count: usize,
    timeout: Duration,
) -> Result<(), StepError> {
    hold(session, WaitCondition::WindowCount(count), timeout).await?;
    Ok(())
}

/// Polls `condition` until it holds or `timeout` elapses.
///
/// Transient misses (element not there yet, stale mid-check) keep the
/// poll going; a session-level fault aborts it immediately.
pub async fn hold(
    session: &Session,
    condition: WaitCondition<'_>,
    timeout: Duration,
) -> Result<Option<Element>, StepError> {
    let deadline = Instant::now() + timeout;
    loop {
        match probe(session, &condition).await? {
            Probe::Satisfied(found) => return Ok(found),
            Probe::NotYet => {}
        }

        if Instant::now() >= deadline {
            return Err(StepError::WaitTimeout {
                ms: timeout.as_millis() as u64,
                condition: condition.describe(),
            });
        }

        trace!(target = "consulta", condition = %condition.describe(), "condition not met, polling");
        sleep(POLL_INTERVAL).await;
    }
}

async fn probe(session: &Session, condition: &WaitCondition<'_>) -> Result<Probe, StepError> {
    match condition {
        WaitCondition::Present(selector) => match session.find(selector).await {
            Ok(element) => Ok(Probe::Satisfied(Some(element))),
            Err(err) => transient(err),
        },
        WaitCondition::Clickable(selector) => {
            let element = match session.find(selector).await {
                Ok(element) => element,
                Err(err) => return transient(err),
            };
            let actionable = async {
                Ok::<_, StepError>(element.is_displayed().await? && element.is_enabled().await?)
            };
            match actionable.await {
                Ok(true) => Ok(Probe::Satisfied(Some(element))),
                Ok(false) => Ok(Probe::NotYet),
                Err(err) => transient(err),
            }
        }
        WaitCondition::WindowCount(count) => {
            // A windows() failure is never transient: it means the session
            // itself cannot be queried.
            let live = session.windows().await?;
            if live.len() >= *count {
                Ok(Probe::Satisfied(None))
            } else {
                Ok(Probe::NotYet)
            }
        }
    }
}

fn transient(err: StepError) -> Result<Probe, StepError> {
    if err.is_fatal() {
        Err(err)
    } else {
        Ok(Probe::NotYet)
    }
}
