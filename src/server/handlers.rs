//! Request handlers. Each POST applies one [`SessionEvent`] and redirects back
//! to `/`, which renders whatever screen the session is on.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::DashboardError;
use crate::model::{RidesZoneBuses, UserResponse};
use crate::session::SessionEvent;
use crate::views::{RenderContext, render_dashboard, render_questionnaire};

pub const SESSION_COOKIE: &str = "fundao_session";

/// Reads the session id from the request cookies.
pub(crate) fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn back_to_dashboard(id: Uuid) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(LOCATION, "/".to_string()), (SET_COOKIE, session_cookie(id))],
    )
        .into_response()
}

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, DashboardError> {
    let session = state.sessions.get_or_create(session_id(&headers)).await;

    let html = match session.answers() {
        None => render_questionnaire(),
        Some(answers) => {
            let summaries = state
                .datasets
                .summaries()
                .await
                .map_err(DashboardError::DataUnavailable)?;
            let map = state.datasets.gps().await;
            let fingerprint = session.fingerprint(summaries.generation, map.generation());

            match session.cached_page(fingerprint) {
                Some(html) => {
                    debug!(session = %session.id, "Serving memoized dashboard");
                    html.to_string()
                }
                None => {
                    let html = render_dashboard(&RenderContext {
                        answers,
                        selection: session.selection(),
                        summaries: summaries.data.as_slice(),
                        map: &map,
                        zone: state.zone,
                    });
                    state
                        .sessions
                        .store_page(session.id, fingerprint, html.clone())
                        .await;
                    html
                }
            }
        }
    };

    Ok(([(SET_COOKIE, session_cookie(session.id))], Html(html)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct QuestionnaireForm {
    rides_zone_buses: RidesZoneBuses,
    #[serde(default)]
    most_used_line: String,
    #[serde(default)]
    delay_guess: String,
}

pub async fn submit_questionnaire(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<QuestionnaireForm>, FormRejection>,
) -> Result<Response, DashboardError> {
    let Form(form) = form.map_err(|rejection| DashboardError::InvalidForm {
        reason: rejection.body_text(),
    })?;
    let response = UserResponse::new(form.rides_zone_buses, &form.most_used_line, &form.delay_guess);

    let (id, changed) = state
        .sessions
        .apply(session_id(&headers), SessionEvent::Submit(response.clone()))
        .await;
    if changed {
        // The session already moved on; a failed export only loses the CSV copy.
        if let Err(e) = state.responses.record(&response).await {
            warn!(error = %format!("{e:#}"), "Failed to export questionnaire response");
        }
    }

    Ok(back_to_dashboard(id))
}

/// Turns the filter form body into an event. `mode=all` wins over any `line` fields.
pub(crate) fn filter_event(body: &[u8]) -> SessionEvent {
    let mut lines = BTreeSet::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "mode" if value == "all" => return SessionEvent::SelectAll,
            "line" => {
                let value = value.trim();
                if !value.is_empty() {
                    lines.insert(value.to_string());
                }
            }
            _ => {}
        }
    }
    SessionEvent::SelectLines(lines)
}

pub async fn filter(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let event = filter_event(&body);
    let (id, changed) = state.sessions.apply(session_id(&headers), event).await;
    debug!(session = %id, changed, "Line filter submitted");
    back_to_dashboard(id)
}

pub async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, _) = state
        .sessions
        .apply(session_id(&headers), SessionEvent::Reset)
        .await;
    back_to_dashboard(id)
}

pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let id = state.sessions.get_or_create(session_id(&headers)).await.id;
    info!(session = %id, "Data refresh requested");
    state.datasets.refresh().await;
    back_to_dashboard(id)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
        "responses": state.responses.snapshot().await.len(),
    }))
}
