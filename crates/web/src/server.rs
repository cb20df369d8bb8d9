//! The single caller-facing operation: submit a cédula, get back the
//! echoed value and, when the run aborted, one error summary.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use consulta::{Orchestrator, Query};

use crate::pages;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    /// The core owns its browser session exclusively for the lifetime of
    /// one run, so concurrent submissions queue here instead of sharing.
    run_lock: Arc<Mutex<()>>,
}

pub fn router(orchestrator: Orchestrator) -> Router {
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        run_lock: Arc::new(Mutex::new(())),
    };
    Router::new()
        .route("/", get(index).post(submit))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(pages::render("", None))
}

#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    cedula: String,
}

async fn submit(State(state): State<AppState>, Form(form): Form<LookupForm>) -> Html<String> {
    let cedula = form.cedula.trim();
    if cedula.is_empty() {
        // No query, no run, no session.
        return Html(pages::render("", None));
    }

    let _guard = state.run_lock.lock().await;
    let query = Query::new(cedula);
    match state.orchestrator.run(&query).await {
        Ok(report) => {
            // Failed steps are not surfaced here: the open tabs are the
            // evidence the operator reads.
            info!(
                target = "consulta",
                cedula = %query,
                passed = report.passed_count(),
                total = report.len(),
                "lookup run completed"
            );
            Html(pages::render(cedula, None))
        }
        Err(err) => {
            error!(target = "consulta", cedula = %query, error = %err, "lookup run aborted");
            Html(pages::render(
                cedula,
                Some(&format!("Error al consultar: {err}")),
            ))
        }
    }
}
