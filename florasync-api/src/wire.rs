//! Single-byte command protocol spoken on the local bus between the hub
//! and the actuator controller, plus the fixed-width reply encoding.

use core::fmt;

pub const CMD_PUMP_OFF: u8 = 0x00;
pub const CMD_PUMP_ON: u8 = 0x01;
pub const CMD_REQ_PH: u8 = 0x10;
pub const CMD_REQ_UV: u8 = 0x11;

/// Length of every reply frame: one little-endian `f32`.
pub const REPLY_LEN: usize = 4;

/// Reply sentinel for "no reading available".
pub const NO_DATA: f32 = -1.0;

/// Reply sentinel for "no value was requested before the poll".
pub const UNKNOWN_REQUEST: f32 = -99.99;

/// Values the hub can request from the actuator controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Ph,
    Uv,
}

/// One command frame on the local bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationCommand {
    PumpOff,
    PumpOn,
    Request(ValueKind),
}

impl ActuationCommand {
    pub fn encode(self) -> u8 {
        match self {
            ActuationCommand::PumpOff => CMD_PUMP_OFF,
            ActuationCommand::PumpOn => CMD_PUMP_ON,
            ActuationCommand::Request(ValueKind::Ph) => CMD_REQ_PH,
            ActuationCommand::Request(ValueKind::Uv) => CMD_REQ_UV,
        }
    }
}

/// Raised for command bytes outside the reserved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand(pub u8);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command byte {:#04x}", self.0)
    }
}

impl TryFrom<u8> for ActuationCommand {
    type Error = UnknownCommand;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            CMD_PUMP_OFF => Ok(ActuationCommand::PumpOff),
            CMD_PUMP_ON => Ok(ActuationCommand::PumpOn),
            CMD_REQ_PH => Ok(ActuationCommand::Request(ValueKind::Ph)),
            CMD_REQ_UV => Ok(ActuationCommand::Request(ValueKind::Uv)),
            other => Err(UnknownCommand(other)),
        }
    }
}

pub fn encode_reply(value: f32) -> [u8; REPLY_LEN] {
    value.to_le_bytes()
}

pub fn decode_reply(bytes: [u8; REPLY_LEN]) -> f32 {
    f32::from_le_bytes(bytes)
}

/// Negative replies signal a fault; readings of 0.0 are still valid.
pub fn is_error_value(value: f32) -> bool {
    value < -0.5
}
