use std::io::{Read, Write};
use std::time::Duration;

use florasync_api::codec;
use florasync_api::message::{ChannelHealth, HubStatus, PumpCommand, PumpSwitch, SensorHealth};
use florasync_api::topics;
use florasync_api::wire::{ActuationCommand, ValueKind, is_error_value};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};

use crate::services::{
    ActuatorService, Camera, CaptureService, FileCamera, MessagePublisher, ServiceError,
};
use crate::settings::Settings;

const COMMAND_TOPICS: [&str; 2] = [topics::PUMP_COMMAND, topics::CAPTURE_COMMAND];

/// Dispatches inbound bus messages to the local command bus or the
/// capture pipeline, and owns the periodic status report.
pub struct CommandRouter<P, C, M>
where
    P: Read + Write + Send + 'static,
    C: Camera,
    M: MessagePublisher,
{
    actuator: ActuatorService<P>,
    capture: CaptureService<C>,
    publisher: M,
    /// Last commanded pump state; the actuator holds the ground truth.
    pump_active: bool,
}

impl<P, C, M> CommandRouter<P, C, M>
where
    P: Read + Write + Send + 'static,
    C: Camera,
    M: MessagePublisher,
{
    pub fn new(actuator: ActuatorService<P>, capture: CaptureService<C>, publisher: M) -> Self {
        Self {
            actuator,
            capture,
            publisher,
            pump_active: false,
        }
    }

    pub async fn dispatch(&mut self, topic: &str, payload: &[u8]) {
        match topic {
            topics::PUMP_COMMAND => self.handle_pump_command(payload).await,
            topics::CAPTURE_COMMAND => {
                // Payload ignored, the message itself is the trigger.
                self.capture.capture_and_upload(&self.publisher).await;
            }
            other => tracing::warn!("message on unhandled topic {other}, ignored"),
        }
    }

    async fn handle_pump_command(&mut self, payload: &[u8]) {
        let command: PumpCommand = match codec::decode(payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("malformed pump command dropped: {e}");
                return;
            }
        };

        let (frame, active) = match command.state {
            PumpSwitch::On => (ActuationCommand::PumpOn, true),
            PumpSwitch::Off => (ActuationCommand::PumpOff, false),
        };

        if let Err(e) = self.actuator.send_command(frame).await {
            tracing::error!("pump command not delivered: {e}");
        }
        self.pump_active = active;

        // Republish right away so consumers see the new state without
        // waiting out the status timer.
        self.publish_status().await;
    }

    pub async fn publish_status(&mut self) {
        let ph_water = self.read_value(ValueKind::Ph).await;
        let uv_ambient = self.read_value(ValueKind::Uv).await;

        let status = HubStatus {
            ph_water,
            uv_ambient,
            pump_active: self.pump_active,
            sensor_status: SensorHealth {
                ph: health(ph_water),
                uv: health(uv_ambient),
            },
        };

        match codec::encode(&status) {
            Ok(payload) => {
                if let Err(e) = self.publisher.publish(topics::HUB_STATUS, payload).await {
                    tracing::error!("status publish failed: {e}");
                }
            }
            Err(e) => tracing::error!("status encode failed: {e}"),
        }
    }

    async fn read_value(&self, kind: ValueKind) -> Option<f32> {
        match self.actuator.request_value(kind).await {
            Ok(value) if !is_error_value(value) => Some(value),
            Ok(value) => {
                tracing::debug!("actuator answered error value {value} for {kind:?}");
                None
            }
            Err(e) => {
                tracing::warn!("local bus read for {kind:?} failed: {e}");
                None
            }
        }
    }
}

fn health(value: Option<f32>) -> ChannelHealth {
    if value.is_some() {
        ChannelHealth::Ok
    } else {
        ChannelHealth::Error
    }
}

/// Hub main loop: keep the bus session alive, dispatch commands, publish
/// status on the timer. Runs forever; poll errors back off and retry.
pub async fn run(settings: &Settings) -> Result<(), ServiceError> {
    let mut options = MqttOptions::new(
        &settings.gateway.client_id,
        &settings.gateway.host,
        settings.gateway.port,
    );
    options.set_keep_alive(Duration::from_secs(5));

    let (client, mut event_loop) = AsyncClient::new(options, 10);

    let actuator = ActuatorService::open(&settings.actuator)?;
    let capture = CaptureService::new(
        FileCamera::new(&settings.imaging),
        settings.upload.url.clone(),
        Duration::from_secs(settings.upload.timeout_secs),
    )?;
    let mut router = CommandRouter::new(actuator, capture, client.clone());

    let mut status_interval =
        tokio::time::interval(Duration::from_secs(settings.status.interval_secs));
    let reconnect_delay = Duration::from_secs(settings.gateway.reconnect_delay_secs);

    loop {
        tokio::select! {
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Subscriptions do not survive a reconnect; renew them
                    // on every session.
                    tracing::info!("bus session established, subscribing");
                    for topic in COMMAND_TOPICS {
                        if let Err(e) = client.subscribe(topic, QoS::AtMostOnce).await {
                            tracing::error!("subscribe to {topic} failed: {e}");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    router.dispatch(&publish.topic, &publish.payload).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT error: {e}");
                    tokio::time::sleep(reconnect_delay).await;
                }
            },
            _ = status_interval.tick() => router.publish_status().await,
        }
    }
}
