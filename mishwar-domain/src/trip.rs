use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seats::{self, SeatError, SeatState, SeatUpdate};

/// A published trip offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: String,
    pub driver_name: Option<String>,
    pub from_city: String,
    pub to_city: String,
    pub date: String,
    pub time: String,
    pub car_model: String,
    pub car_color: String,
    pub price: f64,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub booked_users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The driver publishing or modifying a trip.
#[derive(Debug, Clone)]
pub struct DriverRef {
    pub id: String,
    pub name: Option<String>,
}

/// Payload for creating a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub from_city: String,
    pub to_city: String,
    pub date: String,
    pub time: String,
    pub car_model: String,
    pub car_color: String,
    pub price: f64,
    pub phone_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub total_seats: i32,
}

/// Partial update for a trip; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub price: Option<f64>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub total_seats: Option<i32>,
    pub available_seats: Option<i32>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.from_city.is_none()
            && self.to_city.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.car_model.is_none()
            && self.car_color.is_none()
            && self.price.is_none()
            && self.phone_number.is_none()
            && self.notes.is_none()
            && self.total_seats.is_none()
            && self.available_seats.is_none()
    }

    fn seat_update(&self) -> SeatUpdate {
        SeatUpdate {
            total_seats: self.total_seats,
            available_seats: self.available_seats,
        }
    }
}

impl Trip {
    /// Build a fresh trip: every seat starts available and nobody is booked.
    pub fn new(draft: TripDraft, driver: &DriverRef) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            driver_id: driver.id.clone(),
            driver_name: driver.name.clone(),
            from_city: draft.from_city,
            to_city: draft.to_city,
            date: draft.date,
            time: draft.time,
            car_model: draft.car_model,
            car_color: draft.car_color,
            price: draft.price,
            phone_number: draft.phone_number,
            notes: draft.notes,
            total_seats: draft.total_seats,
            available_seats: draft.total_seats,
            booked_users: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated patch, reconciling seat counts against the current
    /// bookings. Returns the updated copy with a fresh `updated_at`.
    pub fn apply_patch(&self, patch: &TripPatch) -> Result<Trip, SeatError> {
        let seats = seats::reconcile(
            SeatState {
                total_seats: self.total_seats,
                available_seats: self.available_seats,
            },
            self.booked_users.len() as i32,
            patch.seat_update(),
        )?;

        let mut next = self.clone();
        if let Some(v) = &patch.from_city {
            next.from_city = v.clone();
        }
        if let Some(v) = &patch.to_city {
            next.to_city = v.clone();
        }
        if let Some(v) = &patch.date {
            next.date = v.clone();
        }
        if let Some(v) = &patch.time {
            next.time = v.clone();
        }
        if let Some(v) = &patch.car_model {
            next.car_model = v.clone();
        }
        if let Some(v) = &patch.car_color {
            next.car_color = v.clone();
        }
        if let Some(v) = patch.price {
            next.price = v;
        }
        if let Some(v) = &patch.phone_number {
            next.phone_number = v.clone();
        }
        if let Some(v) = &patch.notes {
            next.notes = Some(v.clone());
        }
        next.total_seats = seats.total_seats;
        next.available_seats = seats.available_seats;
        next.updated_at = Utc::now();
        Ok(next)
    }
}
