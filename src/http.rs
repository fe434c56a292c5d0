use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::dates;
use crate::model::{Reservation, ReservationNumber};
use crate::scheduler::{Scheduler, SchedulerError};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/livez", get(livez))
        .route("/availability", get(check_availability))
        .route("/reservation", post(create_reservation))
        .route(
            "/reservation/{number}",
            get(get_reservation)
                .put(update_reservation)
                .delete(cancel_reservation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { scheduler })
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Body of create and update. Dates stay raw so unparsable input reaches the
/// scheduler as a missing date.
#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "startDate")]
    pub start: Option<String>,
    #[serde(alias = "endDate")]
    pub end: Option<String>,
}

impl ReservationRequest {
    fn dates(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (
            self.start.as_deref().and_then(dates::parse),
            self.end.as_deref().and_then(dates::parse),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_number: ReservationNumber,
    pub name: String,
    #[serde(serialize_with = "dates::serialize")]
    pub start: NaiveDate,
    #[serde(serialize_with = "dates::serialize")]
    pub end: NaiveDate,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_number: r.number,
            name: r.name,
            start: r.stay.start,
            end: r.stay.end,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    message: String,
}

/// Error returned by every handler: `NotFound` is a 404, the rest are 400.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        let status = match e {
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<bool>, ApiError> {
    let start = query.start.as_deref().and_then(dates::parse);
    let end = query.end.as_deref().and_then(dates::parse);
    let available = state.scheduler.check_availability(start, end).await?;
    Ok(Json(available))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    number: Result<Path<ReservationNumber>, PathRejection>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let Path(number) = number?;
    let reservation = state.scheduler.get_reservation(number).await?;
    Ok(Json(reservation.into()))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let (start, end) = request.dates();
    let reservation = state
        .scheduler
        .create_reservation(&request.name, start, end)
        .await?;
    let location = format!("/reservation/{}", reservation.number);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ReservationResponse::from(reservation)),
    )
        .into_response())
}

pub async fn update_reservation(
    State(state): State<AppState>,
    number: Result<Path<ReservationNumber>, PathRejection>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(number) = number?;
    let Json(request) = payload?;
    let (start, end) = request.dates();
    state
        .scheduler
        .update_reservation(number, &request.name, start, end)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    number: Result<Path<ReservationNumber>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(number) = number?;
    state.scheduler.cancel_reservation(number).await?;
    Ok(StatusCode::NO_CONTENT)
}
