//! Slave-side command server on the local bus. The transport's notify
//! handlers (`on_receive`, `on_request`) can preempt the main loop at any
//! point, so they only move single flags and pre-encoded bytes; all
//! measurement and actuation happens in `tick`.

use embedded_hal::digital::OutputPin;
use florasync_api::wire::{self, ActuationCommand, REPLY_LEN, ValueKind};

use crate::error::{Error, Result};

/// Placeholder water pH until a real probe conversion is supplied.
pub const PH_PLACEHOLDER: f32 = 7.0;

/// Placeholder ambient UV until a real sensor conversion is supplied.
pub const UV_PLACEHOLDER: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Off,
    On,
}

pub struct CommandServer<PIN>
where
    PIN: OutputPin,
{
    pump_pin: PIN,
    pump: PumpState,
    /// Single-slot mailbox filled by `on_receive`, drained by `tick`.
    pending: Option<u8>,
    /// Reply frame pre-encoded by `tick` for the next `on_request`.
    reply: [u8; REPLY_LEN],
    requested: Option<ValueKind>,
    ph_value: f32,
    uv_value: f32,
    violations: u32,
}

impl<PIN> CommandServer<PIN>
where
    PIN: OutputPin,
{
    /// The actuation output always boots at the inactive level.
    pub fn new(mut pump_pin: PIN) -> Result<Self> {
        pump_pin.set_low().map_err(|_| Error::InitializationError)?;

        Ok(Self {
            pump_pin,
            pump: PumpState::Off,
            pending: None,
            reply: wire::encode_reply(wire::UNKNOWN_REQUEST),
            requested: None,
            ph_value: wire::NO_DATA,
            uv_value: wire::NO_DATA,
            violations: 0,
        })
    }

    pub fn pump_state(&self) -> PumpState {
        self.pump
    }

    pub fn protocol_violations(&self) -> u32 {
        self.violations
    }

    /// Transport receive notification. Exactly one byte per message; any
    /// other length is a protocol violation and the whole frame is
    /// ignored. Runs on the notification path: flag updates only.
    pub fn on_receive(&mut self, frame: &[u8]) {
        if frame.len() == 1 {
            self.pending = Some(frame[0]);
        } else {
            self.violations += 1;
            log::warn!("expected 1 command byte, got {}, frame dropped", frame.len());
        }
    }

    /// Transport request notification. Replies only with the frame
    /// prepared ahead of time by `tick`; a poll with no request pending
    /// answers the reserved error encoding.
    pub fn on_request(&mut self) -> [u8; REPLY_LEN] {
        let reply = self.reply;

        if self.requested.take().is_some() {
            self.reply = wire::encode_reply(wire::UNKNOWN_REQUEST);
        }

        reply
    }

    /// One main-loop iteration: refresh local readings, then drain and
    /// dispatch at most one pending command.
    pub fn tick(&mut self) -> Result<()> {
        // Synchronous measurement, kept out of the notification path.
        // Conversions are unimplemented placeholders for now.
        self.ph_value = PH_PLACEHOLDER;
        self.uv_value = UV_PLACEHOLDER;

        let Some(byte) = self.pending.take() else {
            return Ok(());
        };

        match ActuationCommand::try_from(byte) {
            Ok(ActuationCommand::PumpOn) => {
                self.pump_pin.set_high().map_err(|_| Error::ActuationFault)?;
                self.pump = PumpState::On;
                log::info!("pump on");
            }
            Ok(ActuationCommand::PumpOff) => {
                self.pump_pin.set_low().map_err(|_| Error::ActuationFault)?;
                self.pump = PumpState::Off;
                log::info!("pump off");
            }
            Ok(ActuationCommand::Request(kind)) => {
                let value = match kind {
                    ValueKind::Ph => self.ph_value,
                    ValueKind::Uv => self.uv_value,
                };
                self.reply = wire::encode_reply(value);
                self.requested = Some(kind);
            }
            Err(e) => {
                log::warn!("{e}, ignored");
            }
        }

        Ok(())
    }
}
