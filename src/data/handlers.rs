use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateDataRequest, DataResponse, UpdateDataRequest};
use super::repo_types::{DataRecord, NewData};
use crate::{
    auth::{extractors::CurrentUser, repo_types::User},
    error::AppError,
    response::{ApiJson, ApiResponse},
    state::AppState,
    validation::{max_len, max_len_opt, MAX_SENTIMENT_LENGTH, MAX_SOURCE_LENGTH},
};

pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(list_data).post(create_data))
        .route(
            "/data/:id",
            get(get_data).put(update_data).delete(delete_data),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Data not found".into())
}

/// Ids that are not UUIDs cannot name a row, so they are reported like missing rows.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

fn ensure_owner(record: &DataRecord, caller: &User) -> Result<(), AppError> {
    if record.user_id != caller.id {
        warn!(
            data_id = %record.id,
            owner_id = %record.user_id,
            caller_id = %caller.id,
            "ownership check failed"
        );
        return Err(AppError::Forbidden(
            "You do not have permission to access this data".into(),
        ));
    }
    Ok(())
}

async fn load(state: &AppState, raw_id: &str) -> Result<DataRecord, AppError> {
    let id = parse_id(raw_id)?;
    state.data.find(id).await?.ok_or_else(not_found)
}

#[instrument(skip(state, caller), fields(user_id = %caller.id))]
pub async fn list_data(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<ApiResponse<Vec<DataResponse>>, AppError> {
    let rows = state.data.list_by_owner(caller.id).await?;
    let items: Vec<DataResponse> = rows.into_iter().map(DataResponse::from).collect();
    Ok(ApiResponse::ok("Request processed successful", items))
}

#[instrument(skip(state, caller, payload), fields(user_id = %caller.id))]
pub async fn create_data(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(payload): ApiJson<CreateDataRequest>,
) -> Result<ApiResponse<DataResponse>, AppError> {
    max_len("source", &payload.source, MAX_SOURCE_LENGTH)?;
    max_len("sentiment", &payload.sentiment, MAX_SENTIMENT_LENGTH)?;

    let record = state
        .data
        .insert(NewData {
            user_id: caller.id,
            source: payload.source,
            sentiment: payload.sentiment,
            text: payload.text,
        })
        .await?;

    info!(data_id = %record.id, "data created");
    Ok(ApiResponse::created(
        "Data created successful",
        DataResponse::from(record),
    ))
}

#[instrument(skip(state, caller), fields(user_id = %caller.id))]
pub async fn get_data(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DataResponse>, AppError> {
    let record = load(&state, &id).await?;
    ensure_owner(&record, &caller)?;
    Ok(ApiResponse::ok(
        "Request processed successful",
        DataResponse::from(record),
    ))
}

/// Any authenticated caller may update any record unless `data_update_require_owner` is set.
#[instrument(skip(state, caller, payload), fields(user_id = %caller.id))]
pub async fn update_data(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateDataRequest>,
) -> Result<ApiResponse<DataResponse>, AppError> {
    max_len_opt("source", payload.source.as_deref(), MAX_SOURCE_LENGTH)?;
    max_len_opt("sentiment", payload.sentiment.as_deref(), MAX_SENTIMENT_LENGTH)?;

    let record = load(&state, &id).await?;
    if state.config.data_update_require_owner {
        ensure_owner(&record, &caller)?;
    } else if record.user_id != caller.id {
        warn!(
            data_id = %record.id,
            owner_id = %record.user_id,
            "updating data owned by another user"
        );
    }

    let updated = state
        .data
        .apply_changes(record.id, payload.into())
        .await?
        .ok_or_else(not_found)?;

    info!(data_id = %updated.id, "data updated");
    Ok(ApiResponse::ok(
        "Data updated successful",
        DataResponse::from(updated),
    ))
}

#[instrument(skip(state, caller), fields(user_id = %caller.id))]
pub async fn delete_data(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DataResponse>, AppError> {
    let record = load(&state, &id).await?;
    ensure_owner(&record, &caller)?;

    if !state.data.remove(record.id).await? {
        return Err(not_found());
    }

    info!(data_id = %record.id, "data deleted");
    Ok(ApiResponse::new(
        StatusCode::NO_CONTENT,
        "Data deleted successful",
        DataResponse::from(record),
    ))
}
