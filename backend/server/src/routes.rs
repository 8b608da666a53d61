use std::sync::Arc;

use axum::{
    Json,
    extract::{
        self, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::ContactRequest,
    payloads::{
        DataResponse, HealthResponse, IntakePayload, ListQuery, ListResponse, MessageResponse,
        SENT_MESSAGE, WITHDRAWN_MESSAGE,
    },
    state::State,
    utils::{contact_request_from_payload, filter_from_query, parse_key},
};

pub async fn intake_handler(
    extract::State(state): extract::State<Arc<State>>,
    payload: Result<Json<IntakePayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::InternalError(e.body_text()))?;
    let record = contact_request_from_payload(payload, Utc::now())?;
    let id = record.id.clone();

    match state.store.upsert(record).await {
        Ok(()) => info!(%id, "Contact request stored"),
        Err(e) if state.config.degrade_on_storage_error => {
            warn!(%id, "Failed to store contact request, reporting success anyway: {e}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(MessageResponse::ok(SENT_MESSAGE)))
}

pub async fn list_handler(
    extract::State(state): extract::State<Arc<State>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InternalError(e.body_text()))?;
    let filter = filter_from_query(query);

    let records = match state.store.list(&filter).await {
        Ok(records) => records,
        Err(e) if state.config.degrade_on_storage_error => {
            warn!(?filter, "Failed to list contact requests, returning none: {e}");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(DataResponse::ok(records)))
}

pub async fn lookup_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<ContactRequest>>, AppError> {
    let Some(key) = parse_key(&id)? else {
        return Err(AppError::NotFound);
    };

    let record = state.store.get(&key).await?.ok_or(AppError::NotFound)?;

    Ok(Json(DataResponse::ok(record)))
}

/// No existence check, withdrawing an unknown or unparsable id still succeeds.
pub async fn withdraw_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let Some(key) = parse_key(&id)? else {
        debug!(%id, "Id names no contact request, nothing to withdraw");
        return Ok(Json(MessageResponse::ok(WITHDRAWN_MESSAGE)));
    };

    match state.store.withdraw(&key, Utc::now()).await {
        Ok(()) => info!(%id, "Contact request withdrawn"),
        Err(e) if state.config.degrade_on_storage_error => {
            warn!(%id, "Failed to withdraw contact request, reporting success anyway: {e}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(MessageResponse::ok(WITHDRAWN_MESSAGE)))
}

pub async fn health_handler(
    extract::State(state): extract::State<Arc<State>>,
) -> impl IntoResponse {
    let store = state.store.kind().to_string();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                store,
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {e}");

            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    store,
                }),
            )
        }
    }
}
