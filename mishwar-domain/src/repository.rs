use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::seats::SeatError;
use crate::trip::{DriverRef, Trip, TripDraft, TripPatch};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TripStoreError {
    #[error("trip not found")]
    NotFound,
    #[error("trip belongs to another driver")]
    NotOwner,
    #[error("invalid cursor")]
    InvalidCursor,
    #[error(transparent)]
    Seats(#[from] SeatError),
    #[error("trip store failure: {0}")]
    Backend(#[source] BoxedError),
}

impl TripStoreError {
    pub fn backend(err: impl Into<BoxedError>) -> Self {
        TripStoreError::Backend(err.into())
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store failure: {0}")]
    Backend(#[source] BoxedError),
}

impl TokenStoreError {
    pub fn backend(err: impl Into<BoxedError>) -> Self {
        TokenStoreError::Backend(err.into())
    }
}

/// Equality filters for trip listings.
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub driver_id: Option<String>,
}

/// A page request. `limit` is clamped by the caller; `cursor` is the id of
/// the last trip of the previous page.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub limit: i64,
    pub cursor: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct TripPage {
    pub trips: Vec<Trip>,
    pub next_cursor: Option<Uuid>,
}

/// Trip storage. Exactly one implementation is selected at startup; both
/// must be observably interchangeable.
#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Newest first (`created_at` desc, id desc as tie-break), strictly
    /// after the cursor row when one is given. A cursor that matches no
    /// stored trip is `InvalidCursor`.
    async fn list_trips(
        &self,
        filter: &TripFilter,
        page: PageRequest,
    ) -> Result<TripPage, TripStoreError>;

    async fn create_trip(
        &self,
        draft: TripDraft,
        driver: &DriverRef,
    ) -> Result<Trip, TripStoreError>;

    async fn update_trip(
        &self,
        id: Uuid,
        patch: &TripPatch,
        driver_id: &str,
    ) -> Result<Trip, TripStoreError>;

    async fn delete_trip(&self, id: Uuid, driver_id: &str) -> Result<(), TripStoreError>;
}

/// Per-user device-token storage for push notifications.
#[async_trait]
pub trait UserTokenRepository: Send + Sync {
    async fn device_tokens(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError>;

    /// Idempotent: registering the same token twice keeps one copy.
    async fn save_token(&self, user_id: &str, token: &str) -> Result<(), TokenStoreError>;

    /// Removes exactly the named tokens from the user's set.
    async fn remove_tokens(&self, user_id: &str, tokens: &[String])
        -> Result<(), TokenStoreError>;
}
