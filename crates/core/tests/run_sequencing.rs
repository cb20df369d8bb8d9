//! Sequencing behavior of `run_all` under scripted step outcomes.

use async_trait::async_trait;
use consulta::error::{SessionError, StepError};
use consulta::orchestrator::{StepRunner, run_all};
use consulta::step::{Selector, SiteDefinition, StepOutcome};

fn site(name: &str) -> SiteDefinition {
    SiteDefinition {
        name: name.to_string(),
        url: format!("https://{name}.gob.ec/consulta"),
        ready: Selector::Css("body".to_string()),
        setup: Vec::new(),
        field: Selector::Id("cedula".to_string()),
        submit: Selector::Css("button[type='submit']".to_string()),
        follow_up: None,
        opens_tab: false,
        close_own_tab: false,
        page_timeout_secs: 60,
        element_timeout_secs: 30,
    }
}

fn sites(n: usize) -> Vec<SiteDefinition> {
    (0..n).map(|i| site(&format!("portal-{i}"))).collect()
}

/// What the scripted runner should do at a given step index.
#[derive(Clone)]
enum Script {
    Pass,
    FailTimeout,
    LoseSession,
}

struct ScriptedRunner {
    script: Vec<Script>,
    calls: Vec<usize>,
}

impl ScriptedRunner {
    fn new(script: Vec<Script>) -> Self {
        Self {
            script,
            calls: Vec::new(),
        }
    }
}

#[async_trait]
impl StepRunner for ScriptedRunner {
    async fn run_step(
        &mut self,
        index: usize,
        site: &SiteDefinition,
    ) -> Result<StepOutcome, SessionError> {
        self.calls.push(index);
        match self.script[index] {
            Script::Pass => Ok(StepOutcome::pass(&site.name)),
            Script::FailTimeout => {
                let err = StepError::WaitTimeout {
                    ms: 30_000,
                    condition: format!("element id `cedula` to be present on {}", site.name),
                };
                Ok(StepOutcome::fail(&site.name, &err))
            }
            Script::LoseSession => Err(SessionError::Lost("browser process terminated".into())),
        }
    }
}

#[tokio::test]
async fn all_sites_pass_yields_one_outcome_each_in_order() {
    let sites = sites(5);
    let mut runner = ScriptedRunner::new(vec![Script::Pass; 5]);

    let report = run_all(&sites, &mut runner).await.unwrap();

    assert_eq!(report.len(), 5);
    assert!(report.all_passed());
    for (outcome, site) in report.outcomes.iter().zip(&sites) {
        assert_eq!(outcome.site, site.name);
    }
    assert_eq!(runner.calls, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn a_failed_step_never_skips_later_steps() {
    let sites = sites(5);
    let mut runner = ScriptedRunner::new(vec![
        Script::Pass,
        Script::FailTimeout,
        Script::Pass,
        Script::Pass,
        Script::Pass,
    ]);

    let report = run_all(&sites, &mut runner).await.unwrap();

    assert_eq!(report.len(), 5);
    assert!(!report.all_passed());
    assert!(!report.outcomes[1].passed);
    assert!(
        report.outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out")
    );
    // Entries after the failure reflect real execution, not skips.
    assert!(report.outcomes[2..].iter().all(|o| o.passed));
    assert_eq!(runner.calls, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn every_failing_subset_still_completes_with_full_reports() {
    let sites = sites(4);
    for mask in 0u32..16 {
        let script: Vec<Script> = (0..4)
            .map(|i| {
                if mask & (1 << i) != 0 {
                    Script::FailTimeout
                } else {
                    Script::Pass
                }
            })
            .collect();
        let mut runner = ScriptedRunner::new(script);

        let report = run_all(&sites, &mut runner).await.unwrap();

        assert_eq!(report.len(), 4, "mask {mask:#06b}");
        assert_eq!(report.passed_count(), (!mask & 0xF).count_ones() as usize);
        assert_eq!(runner.calls, vec![0, 1, 2, 3]);
    }
}

#[tokio::test]
async fn session_loss_aborts_and_attempts_no_further_steps() {
    let sites = sites(5);
    let mut runner = ScriptedRunner::new(vec![
        Script::Pass,
        Script::Pass,
        Script::LoseSession,
        Script::Pass,
        Script::Pass,
    ]);

    let err = run_all(&sites, &mut runner).await.unwrap_err();

    assert!(matches!(err, SessionError::Lost(_)));
    assert!(err.to_string().contains("browser process terminated"));
    assert_eq!(runner.calls, vec![0, 1, 2]);
}

#[tokio::test]
async fn report_shape_is_independent_of_the_query_value() {
    // The report structure depends only on the configured sites and the
    // per-step outcomes, never on the literal identity number.
    let sites = sites(3);
    let mut first = ScriptedRunner::new(vec![Script::Pass, Script::FailTimeout, Script::Pass]);
    let mut second = ScriptedRunner::new(vec![Script::Pass, Script::FailTimeout, Script::Pass]);

    let a = run_all(&sites, &mut first).await.unwrap();
    let b = run_all(&sites, &mut second).await.unwrap();

    assert_eq!(a.len(), b.len());
    for (x, y) in a.outcomes.iter().zip(&b.outcomes) {
        assert_eq!(x.site, y.site);
        assert_eq!(x.passed, y.passed);
        assert_eq!(x.error.is_some(), y.error.is_some());
    }
}
