use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::CreditorRequest,
    repo,
    repo_types::{Creditor, CreditorWithCount},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn creditor_routes() -> Router<AppState> {
    Router::new()
        .route("/creditors", get(list_creditors).post(create_creditor))
        .route(
            "/creditors/:id",
            get(get_creditor).put(update_creditor).delete(delete_creditor),
        )
}

#[instrument(skip(state))]
pub async fn list_creditors(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<CreditorWithCount>>> {
    Ok(Json(repo::list_with_bill_counts(&state.db, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_creditor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreditorRequest>,
) -> ApiResult<(StatusCode, Json<Creditor>)> {
    let fields = body.into_fields()?;
    let creditor = repo::create(&state.db, user_id, &fields).await?;
    info!(creditor_id = %creditor.id, "creditor created");
    Ok((StatusCode::CREATED, Json(creditor)))
}

#[instrument(skip(state))]
pub async fn get_creditor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Creditor>> {
    repo::find(&state.db, user_id, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Creditor"))
}

#[instrument(skip(state, body))]
pub async fn update_creditor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CreditorRequest>,
) -> ApiResult<Json<Creditor>> {
    let fields = body.into_fields()?;
    repo::update(&state.db, user_id, id, &fields)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Creditor"))
}

#[instrument(skip(state))]
pub async fn delete_creditor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Creditor"));
    }
    info!(creditor_id = %id, "creditor deleted with its bills");
    Ok(StatusCode::NO_CONTENT)
}
