use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use mishwar_domain::repository::{
    PageRequest, TokenStoreError, TripFilter, TripPage, TripRepository, TripStoreError,
    UserTokenRepository,
};
use mishwar_domain::trip::{DriverRef, Trip, TripDraft, TripPatch};

/// In-memory trip store for development and tests. Behaves like the
/// Postgres repository, including cursor pagination and ownership checks.
#[derive(Default)]
pub struct MemoryTripRepository {
    trips: RwLock<Vec<Trip>>,
}

impl MemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trips(trips: Vec<Trip>) -> Self {
        Self {
            trips: RwLock::new(trips),
        }
    }
}

fn matches_filter(trip: &Trip, filter: &TripFilter) -> bool {
    filter
        .from_city
        .as_deref()
        .map_or(true, |v| trip.from_city == v)
        && filter.to_city.as_deref().map_or(true, |v| trip.to_city == v)
        && filter
            .driver_id
            .as_deref()
            .map_or(true, |v| trip.driver_id == v)
}

#[async_trait]
impl TripRepository for MemoryTripRepository {
    async fn list_trips(
        &self,
        filter: &TripFilter,
        page: PageRequest,
    ) -> Result<TripPage, TripStoreError> {
        let trips = self.trips.read().await;

        // The cursor resolves against every stored trip, filters aside.
        let anchor = match page.cursor {
            Some(cursor) => {
                let trip = trips
                    .iter()
                    .find(|t| t.id == cursor)
                    .ok_or(TripStoreError::InvalidCursor)?;
                Some((trip.created_at, trip.id))
            }
            None => None,
        };

        let mut matched: Vec<&Trip> = trips.iter().filter(|t| matches_filter(t, filter)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(anchor) = anchor {
            matched.retain(|t| (t.created_at, t.id) < anchor);
        }

        let page_trips: Vec<Trip> = matched
            .into_iter()
            .take(page.limit as usize)
            .cloned()
            .collect();
        let next_cursor = if page_trips.len() as i64 == page.limit {
            page_trips.last().map(|t| t.id)
        } else {
            None
        };
        Ok(TripPage {
            trips: page_trips,
            next_cursor,
        })
    }

    async fn create_trip(
        &self,
        draft: TripDraft,
        driver: &DriverRef,
    ) -> Result<Trip, TripStoreError> {
        let trip = Trip::new(draft, driver);
        self.trips.write().await.push(trip.clone());
        Ok(trip)
    }

    async fn update_trip(
        &self,
        id: Uuid,
        patch: &TripPatch,
        driver_id: &str,
    ) -> Result<Trip, TripStoreError> {
        let mut trips = self.trips.write().await;
        let slot = trips
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TripStoreError::NotFound)?;
        if slot.driver_id != driver_id {
            return Err(TripStoreError::NotOwner);
        }
        let updated = slot.apply_patch(patch)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_trip(&self, id: Uuid, driver_id: &str) -> Result<(), TripStoreError> {
        let mut trips = self.trips.write().await;
        let index = trips
            .iter()
            .position(|t| t.id == id)
            .ok_or(TripStoreError::NotFound)?;
        if trips[index].driver_id != driver_id {
            return Err(TripStoreError::NotOwner);
        }
        trips.remove(index);
        Ok(())
    }
}

/// In-memory device token store, keyed by user id.
#[derive(Default)]
pub struct MemoryUserTokenRepository {
    tokens: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryUserTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserTokenRepository for MemoryUserTokenRepository {
    async fn device_tokens(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(user_id).cloned().unwrap_or_default())
    }

    async fn save_token(&self, user_id: &str, token: &str) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let entry = tokens.entry(user_id.to_string()).or_default();
        if !entry.iter().any(|t| t == token) {
            entry.push(token.to_string());
        }
        Ok(())
    }

    async fn remove_tokens(&self, user_id: &str, stale: &[String]) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().await;
        if let Some(entry) = tokens.get_mut(user_id) {
            entry.retain(|t| !stale.contains(t));
        }
        Ok(())
    }
}
