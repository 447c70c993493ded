use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mishwar_domain::repository::{PageRequest, TripFilter, TripStoreError};
use mishwar_domain::trip::{DriverRef, Trip, TripDraft, TripPatch};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/mine", get(list_my_trips))
        .route("/trips/{id}", axum::routing::patch(update_trip).delete(delete_trip))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTripsQuery {
    from_city: Option<String>,
    to_city: Option<String>,
    limit: Option<String>,
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TripListResponse {
    trips: Vec<Trip>,
    next_cursor: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct CreateTripResponse {
    message: String,
    trip: Trip,
}

fn parse_limit(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(value) => value
            .parse::<i64>()
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v.min(MAX_PAGE_SIZE))
            .ok_or_else(|| AppError::bad_request("limit must be a positive number")),
    }
}

fn parse_cursor(raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| AppError::bad_request("Invalid cursor provided")),
    }
}

fn normalize_filter(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_trip_id(raw: &str) -> Result<Uuid, AppError> {
    // Unparseable ids cannot name a stored trip, so they read as missing.
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Trip not found"))
}

async fn list_trips(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListTripsQuery>,
) -> Result<Json<TripListResponse>, AppError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let cursor = parse_cursor(query.cursor.as_deref())?;

    let filter = TripFilter {
        from_city: normalize_filter(query.from_city),
        to_city: normalize_filter(query.to_city),
        driver_id: None,
    };
    let page = state
        .trips
        .list_trips(&filter, PageRequest { limit, cursor })
        .await?;

    Ok(Json(TripListResponse {
        trips: page.trips,
        next_cursor: page.next_cursor,
    }))
}

async fn list_my_trips(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<ListTripsQuery>,
) -> Result<Json<TripListResponse>, AppError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let cursor = parse_cursor(query.cursor.as_deref())?;

    let filter = TripFilter {
        from_city: None,
        to_city: None,
        driver_id: Some(user.uid),
    };
    let page = state
        .trips
        .list_trips(&filter, PageRequest { limit, cursor })
        .await?;

    Ok(Json(TripListResponse {
        trips: page.trips,
        next_cursor: page.next_cursor,
    }))
}

async fn create_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(draft): JsonBody<TripDraft>,
) -> Result<(StatusCode, Json<CreateTripResponse>), AppError> {
    draft.validate()?;

    let driver = DriverRef {
        id: user.uid.clone(),
        name: Some(user.name.clone()),
    };
    let trip = state.trips.create_trip(draft, &driver).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTripResponse {
            message: "Trip created successfully".to_string(),
            trip,
        }),
    ))
}

async fn update_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    let id = parse_trip_id(&id)?;
    patch.validate()?;

    let trip = state.trips.update_trip(id, &patch, &user.uid).await?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_trip_id(&id)?;

    state
        .trips
        .delete_trip(id, &user.uid)
        .await
        .map_err(|e| match e {
            TripStoreError::NotOwner => {
                AppError::forbidden("You are not allowed to delete this trip")
            }
            other => other.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit_defaults_and_clamps() {
        assert_eq!(parse_limit(None).unwrap(), 20);
        assert_eq!(parse_limit(Some("")).unwrap(), 20);
        assert_eq!(parse_limit(Some("5")).unwrap(), 5);
        assert_eq!(parse_limit(Some(" 30 ")).unwrap(), 30);
        assert_eq!(parse_limit(Some("250")).unwrap(), 100);
    }

    #[test]
    fn test_parse_limit_rejects_non_positive() {
        for bad in ["0", "-3", "abc", "2.5"] {
            assert!(parse_limit(Some(bad)).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_cursor_handles_blanks() {
        assert_eq!(parse_cursor(None).unwrap(), None);
        assert_eq!(parse_cursor(Some("  ")).unwrap(), None);

        let id = Uuid::new_v4();
        assert_eq!(parse_cursor(Some(&id.to_string())).unwrap(), Some(id));
        assert!(parse_cursor(Some("not-a-uuid")).is_err());
    }

    #[test]
    fn test_normalize_filter_trims_to_none() {
        assert_eq!(normalize_filter(Some("  Riyadh ".to_string())).as_deref(), Some("Riyadh"));
        assert_eq!(normalize_filter(Some("   ".to_string())), None);
        assert_eq!(normalize_filter(None), None);
    }
}
