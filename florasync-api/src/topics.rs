use alloc::format;
use alloc::string::String;

/// Pump control commands from the backend, consumed by the hub.
pub const PUMP_COMMAND: &str = "command/hub/pump";

/// Capture triggers from the backend; the payload is ignored.
pub const CAPTURE_COMMAND: &str = "command/hub/captureImage";

/// Hub status reports.
pub const HUB_STATUS: &str = "hub/status";

/// Image upload outcome reports.
pub const IMAGE_STATUS: &str = "hub/cam/image_status";

/// Telemetry topic of one sensor node.
pub fn node_telemetry(node_id: &str) -> String {
    format!("telemetry/node/{node_id}/data")
}
