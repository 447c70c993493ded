use serde::{Deserialize, Serialize};

use crate::identity;

/// Shown to drivers when a booking carries no usable passenger name.
pub const PASSENGER_FALLBACK: &str = "A passenger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingChange {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Unset,
    Pending,
    Confirmed,
    Canceled,
    Other(String),
}

impl BookingStatus {
    fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return BookingStatus::Unset;
        };
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" => BookingStatus::Unset,
            "pending" => BookingStatus::Pending,
            "confirmed" => BookingStatus::Confirmed,
            "canceled" => BookingStatus::Canceled,
            _ => BookingStatus::Other(normalized),
        }
    }
}

/// The booking fields the notification flow reads. Producers send more;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub trip_id: Option<String>,
    pub trip_ref: Option<String>,
    pub driver_id: Option<String>,
    pub passenger_id: Option<String>,
    pub user_id: Option<String>,
    pub passenger_name: Option<String>,
    pub status: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl BookingRecord {
    pub fn driver(&self) -> Option<&str> {
        non_empty(&self.driver_id)
    }

    /// Passenger id, falling back to the legacy `userId` alias.
    pub fn passenger(&self) -> Option<&str> {
        non_empty(&self.passenger_id).or_else(|| non_empty(&self.user_id))
    }

    pub fn status(&self) -> BookingStatus {
        BookingStatus::parse(self.status.as_deref())
    }

    /// Trip id from `tripId`, else the last `/` segment of `tripRef`.
    pub fn resolved_trip_id(&self) -> Option<String> {
        non_empty(&self.trip_id)
            .or_else(|| non_empty(&self.trip_ref).and_then(|path| path.rsplit('/').next()))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn passenger_display_name(&self) -> String {
        self.passenger_name
            .as_deref()
            .and_then(identity::clean_display_name)
            .unwrap_or_else(|| PASSENGER_FALLBACK.to_string())
    }
}

/// A booking lifecycle event. The change kind is derived from which states
/// are present, mirroring a document-write feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    pub booking_id: Option<String>,
    pub before: Option<BookingRecord>,
    pub after: Option<BookingRecord>,
}

impl BookingEvent {
    pub fn change(&self) -> Option<BookingChange> {
        match (&self.before, &self.after) {
            (None, Some(_)) => Some(BookingChange::Created),
            (Some(_), Some(_)) => Some(BookingChange::Updated),
            (Some(_), None) => Some(BookingChange::Deleted),
            (None, None) => None,
        }
    }
}
