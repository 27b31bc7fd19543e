//! MQTT client backed by `rumqttc`.
//!
//! [`RumqttcClient`] adapts rumqttc's async client to the synchronous
//! [`MqttClient`] trait used by [`BridgeRunner`](super::BridgeRunner). The
//! rumqttc event loop runs on a tokio task; inbound publishes are forwarded
//! over a channel and drained with `try_recv`, and outbound requests use the
//! non-blocking `try_publish`/`try_subscribe`.
//!
//! Requires the `mqtt` feature and a running tokio runtime.
//!
//! ```ignore
//! use rs_fanrf::services::{BridgeRunner, RumqttcClient};
//!
//! let client = RumqttcClient::spawn(&config.mqtt);
//! let mut runner = BridgeRunner::new(bridge, client);
//! runner.subscribe_command_topics()?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use crate::config::MqttConfig;
use crate::traits::{MqttClient, MqttMessage};

/// Capacity of the request channel between client and event loop.
const REQUEST_CAPACITY: usize = 32;

/// Back-off after an event loop error before rumqttc reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// MQTT error type.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// Failed to connect to broker
    #[error("MQTT connect error: {0}")]
    Connect(String),
    /// Failed to subscribe to topic
    #[error("MQTT subscribe error: {0}")]
    Subscribe(String),
    /// Failed to publish message
    #[error("MQTT publish error: {0}")]
    Publish(String),
}

/// `rumqttc` client with a background event loop task.
pub struct RumqttcClient {
    client: AsyncClient,
    incoming: mpsc::UnboundedReceiver<MqttMessage>,
    connected: Arc<AtomicBool>,
}

impl RumqttcClient {
    /// Connect to the configured broker.
    ///
    /// Must be called from within a tokio runtime. The connection is made in
    /// the background; [`is_connected`](MqttClient::is_connected) turns true
    /// once the broker acknowledges it.
    pub fn spawn(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.as_str(),
            config.host.as_str(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        if config.has_auth() {
            options.set_credentials(config.username.as_str(), config.password.as_str());
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (tx, incoming) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        info!("MQTT connecting to {}:{}", config.host, config.port);
        tokio::spawn(drive(eventloop, tx, Arc::clone(&connected)));

        Self {
            client,
            incoming,
            connected,
        }
    }
}

async fn drive(
    mut eventloop: EventLoop,
    tx: mpsc::UnboundedSender<MqttMessage>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connected");
                connected.store(true, Ordering::Release);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let msg = MqttMessage::new(publish.topic, publish.payload.to_vec());
                if tx.send(msg).is_err() {
                    debug!("MQTT client dropped, stopping event loop");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::AcqRel) {
                    warn!("MQTT disconnected: {}", e);
                } else {
                    debug!("MQTT connection attempt failed: {}", e);
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

impl MqttClient for RumqttcClient {
    type Error = MqttError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        self.client
            .try_subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        self.incoming.try_recv().ok()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
