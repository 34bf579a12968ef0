use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Month;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{BillListQuery, BillRequest, CalendarQuery},
    repo,
    repo_types::{Bill, NewBill},
    views::{self, BillList, BillView, CalendarMonth, DashboardSummary},
};
use crate::{
    auth::AuthUser,
    creditors,
    error::{ApiError, ApiResult},
    recurrence::MaterializeReport,
    state::AppState,
};

pub fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/recurring/generate", post(generate_recurring))
        .route(
            "/bills/:id",
            get(get_bill).put(update_bill).delete(delete_bill),
        )
        .route("/bills/:id/toggle-paid", post(toggle_paid))
        .route("/dashboard", get(dashboard))
        .route("/calendar", get(calendar))
}

async fn materialize_for(state: &AppState, user_id: Uuid) -> MaterializeReport {
    state
        .materializer()
        .materialize(&state.bill_store(), user_id, state.today())
        .await
}

async fn views_for(state: &AppState, user_id: Uuid, bills: Vec<Bill>) -> ApiResult<Vec<BillView>> {
    let creditors = creditors::repo::list_by_user(&state.db, user_id).await?;
    Ok(views::with_creditors(bills, creditors))
}

async fn ensure_creditor(state: &AppState, user_id: Uuid, bill: &NewBill) -> ApiResult<()> {
    if creditors::repo::find(&state.db, user_id, bill.creditor_id)
        .await?
        .is_none()
    {
        warn!(creditor_id = %bill.creditor_id, "bill references unknown creditor");
        return Err(ApiError::bad_request("Unknown creditor"));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_bills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<BillListQuery>,
) -> ApiResult<Json<BillList>> {
    let generated = materialize_for(&state, user_id).await;
    let bills = repo::list_by_user(&state.db, user_id).await?;
    let rows = views_for(&state, user_id, bills).await?;
    Ok(Json(views::bill_list(
        rows,
        query.status,
        state.today(),
        generated,
    )))
}

#[instrument(skip(state, body))]
pub async fn create_bill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<BillRequest>,
) -> ApiResult<(StatusCode, Json<Bill>)> {
    let new_bill = body.into_new_bill(user_id, state.today())?;
    ensure_creditor(&state, user_id, &new_bill).await?;

    let bill = repo::create(&state.db, &new_bill).await?;
    info!(bill_id = %bill.id, recurring = bill.is_recurring, "bill created");
    Ok((StatusCode::CREATED, Json(bill)))
}

#[instrument(skip(state))]
pub async fn get_bill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BillView>> {
    let bill = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Bill"))?;
    let creditor = creditors::repo::find(&state.db, user_id, bill.creditor_id).await?;
    Ok(Json(BillView { bill, creditor }))
}

#[instrument(skip(state, body))]
pub async fn update_bill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<BillRequest>,
) -> ApiResult<Json<Bill>> {
    let existing = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Bill"))?;

    let changes = body.into_update(&existing, state.today())?;
    ensure_creditor(&state, user_id, &changes).await?;

    repo::update(&state.db, id, &changes)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Bill"))
}

#[instrument(skip(state))]
pub async fn delete_bill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Bill"));
    }
    info!(bill_id = %id, "bill deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_paid(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Bill>> {
    let bill = repo::toggle_paid(&state.db, user_id, id, state.today())
        .await?
        .ok_or(ApiError::NotFound("Bill"))?;
    info!(bill_id = %bill.id, is_paid = bill.is_paid, "bill paid flag toggled");
    Ok(Json(bill))
}

#[instrument(skip(state))]
pub async fn generate_recurring(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<MaterializeReport>> {
    Ok(Json(materialize_for(&state, user_id).await))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<DashboardSummary>> {
    let bills = repo::list_by_user(&state.db, user_id).await?;
    let rows = views_for(&state, user_id, bills).await?;
    Ok(Json(views::dashboard(
        rows,
        state.today(),
        state.config.recurrence.upcoming_window_days,
    )))
}

#[instrument(skip(state))]
pub async fn calendar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarMonth>> {
    let today = state.today();
    let year = query.year.unwrap_or(today.year());
    let month = match query.month {
        Some(m) => Month::try_from(m).map_err(|_| ApiError::bad_request("month must be 1-12"))?,
        None => today.month(),
    };
    let (first, last) = views::month_bounds(year, month)
        .ok_or_else(|| ApiError::bad_request("year out of range"))?;

    let bills = repo::list_due_between(&state.db, user_id, first, last).await?;
    let rows = views_for(&state, user_id, bills).await?;
    Ok(Json(views::calendar_month(first, today, rows)))
}
