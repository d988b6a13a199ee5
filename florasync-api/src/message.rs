use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Reserved soil-temperature value published when the probe is
/// disconnected or out of its plausible range.
pub const TEMP_ERROR_C: f32 = -99.0;

/// Reserved light value published when the lux sensor fails to answer.
pub const LIGHT_ERROR_LUX: f32 = -1.0;

/// One duty cycle's worth of plant telemetry, as published on
/// `telemetry/node/{id}/data`. Faulty channels carry their reserved
/// sentinel instead of failing the whole message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Soil temperature in Celsius, [`TEMP_ERROR_C`] on fault.
    pub temp_soil_c: f32,
    /// Raw ADC counts from the capacitive moisture probe.
    pub moisture_raw: u16,
    /// Ambient light in lux, [`LIGHT_ERROR_LUX`] on fault.
    pub light_lux: f32,
    /// UV sensor output voltage (uncalibrated).
    pub uv_voltage: f32,
    /// Conditioned EC probe voltage.
    pub ec_voltage: f32,
}

impl SensorReading {
    /// Soil temperature, `None` when the probe reported the error sentinel.
    pub fn soil_temperature(&self) -> Option<f32> {
        (self.temp_soil_c != TEMP_ERROR_C).then_some(self.temp_soil_c)
    }

    /// Light level, `None` when the sensor reported the error sentinel.
    pub fn light(&self) -> Option<f32> {
        (self.light_lux >= 0.0).then_some(self.light_lux)
    }
}

/// Payload of the `command/hub/pump` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpCommand {
    /// Requested pump state.
    pub state: PumpSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpSwitch {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

/// Health of one hub-attached sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelHealth {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorHealth {
    pub ph: ChannelHealth,
    pub uv: ChannelHealth,
}

/// Periodic hub report on `hub/status`. Recomputed on the status timer
/// and immediately after any accepted pump command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubStatus {
    /// Water pH from the actuator controller, `null` while unreadable.
    pub ph_water: Option<f32>,
    /// Ambient UV from the actuator controller, `null` while unreadable.
    pub uv_ambient: Option<f32>,
    /// Last commanded pump state.
    pub pump_active: bool,
    pub sensor_status: SensorHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "uploaded")]
    Uploaded,
    #[serde(rename = "failed")]
    Failed,
}

/// Outcome of one capture trigger, published on `hub/cam/image_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    pub status: UploadStatus,
    /// Logical name of the frame; the backend renames on ingest.
    pub filename: String,
    /// Frame dimensions as `WxH`.
    pub resolution: String,
    pub size_bytes: usize,
    pub upload_method: String,
}
