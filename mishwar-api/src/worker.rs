use std::sync::Arc;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info};

use mishwar_domain::booking::BookingEvent;
use mishwar_notify::NotificationRouter;

/// Consumes booking lifecycle events and feeds them to the notification
/// router. Malformed messages are logged and dropped; the loop never exits.
pub async fn run_booking_worker(
    brokers: String,
    group_id: String,
    topic: String,
    router: Arc<NotificationRouter>,
) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&[topic.as_str()])
        .expect("Can't subscribe");

    info!("Booking worker started, listening to {}", topic);

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                if let Some(payload) = m.payload_view::<str>() {
                    match payload {
                        Ok(raw) => match serde_json::from_str::<BookingEvent>(raw) {
                            Ok(event) => router.handle(event).await,
                            Err(e) => error!("Malformed booking event: {}", e),
                        },
                        Err(e) => error!("Error reading payload: {}", e),
                    }
                }
            }
        }
    }
}
