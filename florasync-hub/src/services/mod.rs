mod actuator_service;
mod capture_service;

pub use actuator_service::ActuatorService;
pub use capture_service::{Camera, CaptureService, FileCamera, Frame};

#[cfg(test)]
pub(crate) use actuator_service::mock::MockPort;
#[cfg(test)]
pub(crate) use capture_service::mock::MockCamera;

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound side of the bus session, abstracted so the routing logic can
/// be exercised without a broker.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError>;
}

#[async_trait]
impl MessagePublisher for AsyncClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError> {
        AsyncClient::publish(self, topic, QoS::AtMostOnce, false, payload).await?;

        Ok(())
    }
}
