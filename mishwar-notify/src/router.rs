use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use mishwar_domain::booking::{BookingChange, BookingEvent, BookingRecord, BookingStatus};
use mishwar_domain::repository::UserTokenRepository;

use crate::dispatcher::Dispatcher;
use crate::push::PushNotification;

pub const BOOKING_CREATED: &str = "booking_created";
pub const BOOKING_CONFIRMED: &str = "booking_confirmed";
pub const BOOKING_CANCELED: &str = "booking_canceled";
pub const BOOKING_DELETED: &str = "booking_deleted";

const ROUTE_TRIP_DETAILS: &str = "trip_details";

/// Who gets told what for a given booking event.
#[derive(Debug)]
pub struct Decision {
    pub event_type: &'static str,
    pub recipient_id: String,
    pub notification: PushNotification,
    pub data: HashMap<String, String>,
}

fn data_payload(
    event_type: &str,
    record: &BookingRecord,
    counterpart_key: &str,
    counterpart: Option<&str>,
) -> HashMap<String, String> {
    let mut data = HashMap::new();
    data.insert("type".to_string(), event_type.to_string());
    data.insert("route".to_string(), ROUTE_TRIP_DETAILS.to_string());
    if let Some(trip_id) = record.resolved_trip_id() {
        data.insert("tripId".to_string(), trip_id);
    }
    if let Some(id) = counterpart {
        data.insert(counterpart_key.to_string(), id.to_string());
    }
    data
}

/// Maps a booking lifecycle event to a notification decision. `None` means
/// the event warrants no push: an unnotifiable transition, or a recipient
/// that cannot be resolved from the record.
pub fn route(event: &BookingEvent) -> Option<Decision> {
    match event.change()? {
        BookingChange::Created => {
            let after = event.after.as_ref()?;
            let driver = after.driver()?;
            Some(Decision {
                event_type: BOOKING_CREATED,
                recipient_id: driver.to_string(),
                notification: PushNotification {
                    title: "New booking".to_string(),
                    body: format!(
                        "{} booked a seat on your trip",
                        after.passenger_display_name()
                    ),
                },
                data: data_payload(BOOKING_CREATED, after, "passengerId", after.passenger()),
            })
        }
        BookingChange::Updated => {
            let after = event.after.as_ref()?;
            let previous = event
                .before
                .as_ref()
                .map(BookingRecord::status)
                .unwrap_or(BookingStatus::Unset);
            let next = after.status();

            if next == BookingStatus::Confirmed && previous != BookingStatus::Confirmed {
                let passenger = after.passenger()?;
                return Some(Decision {
                    event_type: BOOKING_CONFIRMED,
                    recipient_id: passenger.to_string(),
                    notification: PushNotification {
                        title: "Trip confirmed".to_string(),
                        body: "The driver confirmed your booking".to_string(),
                    },
                    data: data_payload(BOOKING_CONFIRMED, after, "driverId", after.driver()),
                });
            }
            if next == BookingStatus::Canceled && previous != BookingStatus::Canceled {
                let driver = after.driver()?;
                return Some(Decision {
                    event_type: BOOKING_CANCELED,
                    recipient_id: driver.to_string(),
                    notification: PushNotification {
                        title: "Booking canceled".to_string(),
                        body: format!(
                            "{} canceled their booking",
                            after.passenger_display_name()
                        ),
                    },
                    data: data_payload(BOOKING_CANCELED, after, "passengerId", after.passenger()),
                });
            }
            None
        }
        BookingChange::Deleted => {
            let before = event.before.as_ref()?;
            let passenger = before.passenger()?;
            Some(Decision {
                event_type: BOOKING_DELETED,
                recipient_id: passenger.to_string(),
                notification: PushNotification {
                    title: "Trip canceled".to_string(),
                    body: "The driver canceled this trip".to_string(),
                },
                data: data_payload(BOOKING_DELETED, before, "driverId", before.driver()),
            })
        }
    }
}

/// Consumes booking events and turns them into pushes. Best-effort end to
/// end: every failure is logged and swallowed so the event feed never stalls.
pub struct NotificationRouter {
    dispatcher: Arc<Dispatcher>,
    tokens: Arc<dyn UserTokenRepository>,
}

impl NotificationRouter {
    pub fn new(dispatcher: Arc<Dispatcher>, tokens: Arc<dyn UserTokenRepository>) -> Self {
        Self { dispatcher, tokens }
    }

    pub async fn handle(&self, event: BookingEvent) {
        let Some(decision) = route(&event) else {
            debug!("Booking event requires no notification");
            return;
        };
        info!(
            "Routing {} notification to user {}",
            decision.event_type, decision.recipient_id
        );

        let tokens = match self.tokens.device_tokens(&decision.recipient_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(
                    "Failed to load device tokens for {}: {}",
                    decision.recipient_id, e
                );
                return;
            }
        };
        if tokens.is_empty() {
            debug!("User {} has no registered devices", decision.recipient_id);
            return;
        }

        self.dispatcher
            .send_to_tokens(
                &tokens,
                &decision.notification,
                &decision.data,
                Some(&decision.recipient_id),
            )
            .await;
    }
}
