use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::registry::{SessionId, SessionRegistry};
use super::{EstimateSession, SessionError, SessionView};
use crate::form::{CascadingSelector, FieldValue, FormError, FormField, PropertyFormRecord};
use crate::location::LocationLevel;
use crate::prediction::PredictionClient;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationQuery {
    #[serde(default)]
    pulau: Option<String>,
    #[serde(default)]
    provinsi: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectionRequest {
    level: String,
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldUpdateRequest {
    field: String,
    value: FieldValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldStepRequest {
    field: String,
    delta: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConsentRequest {
    consented: bool,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: SessionId,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct ProceedResponse {
    outcome: &'static str,
    session: SessionView,
}

/// HTTP surface over the session registry plus the stateless location lookup.
pub fn session_router<C>(registry: Arc<SessionRegistry<C>>) -> Router
where
    C: PredictionClient + 'static,
{
    Router::new()
        .route("/api/v1/locations", get(locations_handler::<C>))
        .route("/api/v1/sessions", post(create_handler::<C>))
        .route(
            "/api/v1/sessions/:session_id",
            get(view_handler::<C>).delete(close_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/selection",
            post(selection_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/fields",
            post(field_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/fields/step",
            post(step_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/submit",
            post(submit_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/consent",
            post(consent_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/cancel",
            post(cancel_handler::<C>),
        )
        .route(
            "/api/v1/sessions/:session_id/proceed",
            post(proceed_handler::<C>),
        )
        .with_state(registry)
}

pub(crate) async fn locations_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Query(query): Query<LocationQuery>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let record = PropertyFormRecord::default()
        .with_selection(LocationLevel::Island, query.pulau.unwrap_or_default())
        .with_selection(LocationLevel::Province, query.provinsi.unwrap_or_default());
    let options = CascadingSelector::new(registry.hierarchy()).options(&record);
    (StatusCode::OK, Json(options)).into_response()
}

pub(crate) async fn create_handler<C>(State(registry): State<Arc<SessionRegistry<C>>>) -> Response
where
    C: PredictionClient + 'static,
{
    let (session_id, session) = registry.create();
    let body = SessionCreated {
        session_id,
        session: session.view(),
    };
    (StatusCode::CREATED, Json(body)).into_response()
}

pub(crate) async fn view_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: PredictionClient + 'static,
{
    match lookup(&registry, session_id) {
        Ok(session) => view_response(&session),
        Err(response) => response,
    }
}

pub(crate) async fn close_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let id = SessionId(session_id);
    if registry.remove(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

pub(crate) async fn selection_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(level) = LocationLevel::from_field_name(&request.level) else {
        let payload = json!({
            "error": format!("unknown location level '{}'", request.level),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    };

    session.select(level, &request.label);
    view_response(&session)
}

pub(crate) async fn field_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    Json(request): Json<FieldUpdateRequest>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let result = parse_field(&request.field)
        .and_then(|field| session.set_field(field, request.value));
    match result {
        Ok(()) => view_response(&session),
        Err(err) => session_error(err),
    }
}

pub(crate) async fn step_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    Json(request): Json<FieldStepRequest>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let result =
        parse_field(&request.field).and_then(|field| session.step_field(field, request.delta));
    match result {
        Ok(_) => view_response(&session),
        Err(err) => session_error(err),
    }
}

pub(crate) async fn submit_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.request_submit() {
        Ok(_) => view_response(&session),
        Err(err) => session_error(err),
    }
}

pub(crate) async fn consent_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
    Json(request): Json<ConsentRequest>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.set_consent(request.consented) {
        Ok(_) => view_response(&session),
        Err(err) => session_error(err),
    }
}

pub(crate) async fn cancel_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.cancel() {
        Ok(()) => view_response(&session),
        Err(err) => session_error(err),
    }
}

pub(crate) async fn proceed_handler<C>(
    State(registry): State<Arc<SessionRegistry<C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: PredictionClient + 'static,
{
    let session = match lookup(&registry, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };
    match session.proceed().await {
        Ok(outcome) => {
            let body = ProceedResponse {
                outcome: outcome.label(),
                session: session.view(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => session_error(err),
    }
}

fn lookup<C>(
    registry: &SessionRegistry<C>,
    session_id: String,
) -> Result<Arc<EstimateSession<C>>, Response>
where
    C: PredictionClient + 'static,
{
    let id = SessionId(session_id);
    registry.get(&id).ok_or_else(|| not_found(&id))
}

fn parse_field(raw: &str) -> Result<FormField, SessionError> {
    FormField::from_name(raw).ok_or_else(|| FormError::UnknownField(raw.to_string()).into())
}

fn view_response<C>(session: &EstimateSession<C>) -> Response
where
    C: PredictionClient + 'static,
{
    (StatusCode::OK, Json(session.view())).into_response()
}

fn not_found(id: &SessionId) -> Response {
    let payload = json!({
        "error": format!("session '{}' not found", id.0),
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn session_error(err: SessionError) -> Response {
    let status = match &err {
        SessionError::Gate(_) | SessionError::RequestInFlight => StatusCode::CONFLICT,
        SessionError::Form(_)
        | SessionError::MissingLocation(_)
        | SessionError::UnknownLocation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
