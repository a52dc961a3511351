use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    Actor, ManufacturerSelection, ProposalAction, ProposalDraft, ProposalId, ProposalPatch,
};
use super::pricing::{PricingPolicy, StyleComparison};
use super::repository::{NotificationPublisher, ProposalRepository, RepositoryError};
use super::service::{ProposalService, ProposalServiceError};
use super::transitions::TransitionError;

/// Router builder exposing the proposal engine over HTTP.
///
/// Authentication is upstream; the acting user arrives already resolved in
/// the request body.
pub fn proposal_router<R, N>(service: Arc<ProposalService<R, N>>) -> Router
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/proposals", post(create_handler::<R, N>))
        .route("/api/proposals/:id", get(get_handler::<R, N>))
        .route("/api/proposals/:id/update", post(update_handler::<R, N>))
        .route("/api/proposals/:id/accept", post(accept_handler::<R, N>))
        .route(
            "/api/proposals/price-preview",
            post(price_preview_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateProposalRequest {
    pub form_data: ProposalDraft,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateProposalRequest {
    pub action: String,
    #[serde(default)]
    pub form_data: ProposalPatch,
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AcceptProposalRequest {
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PricePreviewRequest {
    pub selection: ManufacturerSelection,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub comparison: Option<StyleComparison>,
}

fn parse_action(raw: &str) -> Option<ProposalAction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "save" => Some(ProposalAction::Save),
        "send" => Some(ProposalAction::Send),
        "accept" => Some(ProposalAction::Accept),
        "reject" => Some(ProposalAction::Reject),
        "expire" => Some(ProposalAction::Expire),
        _ => None,
    }
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<ProposalService<R, N>>>,
    axum::Json(request): axum::Json<CreateProposalRequest>,
) -> Response
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create(request.form_data) {
        Ok(proposal) => (
            StatusCode::CREATED,
            axum::Json(json!({ "success": true, "data": proposal })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<Arc<ProposalService<R, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(ProposalId(id)) {
        Ok(proposal) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": proposal })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, N>(
    State(service): State<Arc<ProposalService<R, N>>>,
    Path(id): Path<u64>,
    axum::Json(request): axum::Json<UpdateProposalRequest>,
) -> Response
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(action) = parse_action(&request.action) else {
        let payload = json!({
            "success": false,
            "message": format!("unknown action '{}'", request.action),
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.update(ProposalId(id), action, request.form_data, &request.actor) {
        Ok(proposal) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": proposal })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<R, N>(
    State(service): State<Arc<ProposalService<R, N>>>,
    Path(id): Path<u64>,
    axum::Json(request): axum::Json<AcceptProposalRequest>,
) -> Response
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.accept(ProposalId(id), &request.actor) {
        Ok(proposal) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": proposal.view() })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn price_preview_handler<R, N>(
    State(service): State<Arc<ProposalService<R, N>>>,
    axum::Json(request): axum::Json<PricePreviewRequest>,
) -> Response
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let mut policy: PricingPolicy = service.default_policy();
    if let Some(discount) = request.discount_percent {
        policy.discount_percent = discount;
    }
    if let Some(tax) = request.tax_rate {
        policy.tax_rate = tax;
    }

    match service.price_preview(&request.selection, &policy, request.comparison) {
        Ok(summary) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": summary })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

/// Map engine errors onto the HTTP vocabulary the legacy clients expect:
/// 400 for validation and transition problems, 403 forbidden, 423 locked,
/// 404/409 for repository misses and conflicts.
fn error_response(error: ProposalServiceError) -> Response {
    let status = match &error {
        ProposalServiceError::Pricing(_) => StatusCode::BAD_REQUEST,
        ProposalServiceError::Transition(transition) => match transition {
            TransitionError::UnknownStatus { .. } | TransitionError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            TransitionError::Locked { .. } => StatusCode::LOCKED,
            TransitionError::Forbidden { .. } => StatusCode::FORBIDDEN,
        },
        ProposalServiceError::Repository(repository) => match repository {
            RepositoryError::NotFound => StatusCode::NOT_FOUND,
            RepositoryError::Conflict => StatusCode::CONFLICT,
            RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ProposalServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "success": false,
        "message": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
