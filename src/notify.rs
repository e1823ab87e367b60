use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{notification_error, Error};

/// Aggregate topic carrying one event per new trip request, for observers.
pub const TRIP_REQUESTED_TOPIC: &str = "trips.requested";

pub fn driver_offer_topic(driver_id: Uuid) -> String {
    format!("driver.{}.offers", driver_id)
}

pub fn trip_status_topic(trip_id: Uuid) -> String {
    format!("trip.{}.status", trip_id)
}

#[derive(Clone, Debug)]
pub struct Envelope {
    pub topic: String,
    pub payload: Value,
}

/// Explicit message-passing seam between the engine and whatever transport
/// actually delivers offers and status changes. No delivery guarantee is
/// assumed by callers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), Error>;
}

/// `async-channel`-backed bus. The receiver half is handed to the transport
/// (or a test) at construction time.
#[derive(Clone, Debug)]
pub struct ChannelBus {
    tx: async_channel::Sender<Envelope>,
}

impl ChannelBus {
    pub fn unbounded() -> (Self, async_channel::Receiver<Envelope>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn bounded(capacity: usize) -> (Self, async_channel::Receiver<Envelope>) {
        let (tx, rx) = async_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelBus {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), Error> {
        self.tx
            .send(Envelope {
                topic: topic.into(),
                payload,
            })
            .await
            .map_err(notification_error)
    }
}
