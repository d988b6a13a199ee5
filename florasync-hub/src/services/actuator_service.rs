use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use florasync_api::wire::{ActuationCommand, REPLY_LEN, ValueKind, decode_reply};
use serialport::SerialPort;

use crate::settings::Actuator;

use super::ServiceError;

/// Master side of the local command bus: single-byte command frames out,
/// fixed-width value replies back after a settle delay. The port IO is
/// synchronous, so every transfer runs on the blocking pool instead of
/// the hub's cooperative loop.
pub struct ActuatorService<P> {
    port: Arc<Mutex<P>>,
    settle: Duration,
}

impl ActuatorService<Box<dyn SerialPort>> {
    pub fn open(settings: &Actuator) -> Result<Self, ServiceError> {
        let port_path = match &settings.port_path {
            Some(path) => path.clone(),
            None => serialport::available_ports()?
                .first()
                .map(|port| port.port_name.clone())
                .ok_or("no local bus port found")?,
        };

        tracing::debug!("connect to actuator on {}", port_path);

        let port = serialport::new(&port_path, settings.baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self::new(port, Duration::from_millis(settings.settle_ms)))
    }
}

impl<P> ActuatorService<P>
where
    P: Read + Write + Send + 'static,
{
    pub fn new(port: P, settle: Duration) -> Self {
        Self {
            port: Arc::new(Mutex::new(port)),
            settle,
        }
    }

    #[cfg(test)]
    pub(crate) fn port(&self) -> &Arc<Mutex<P>> {
        &self.port
    }

    /// Fire one command frame at the actuator controller.
    pub async fn send_command(&self, command: ActuationCommand) -> Result<(), ServiceError> {
        let port = Arc::clone(&self.port);

        tokio::task::spawn_blocking(move || {
            let mut port = port
                .lock()
                .map_err(|_| ServiceError::from("bus port lock poisoned"))?;

            port.write_all(&[command.encode()])?;
            port.flush()?;

            Ok::<(), ServiceError>(())
        })
        .await??;

        tracing::debug!("sent command frame {:#04x}", command.encode());

        Ok(())
    }

    /// Request one value: send the request frame, give the responder its
    /// settle time to prepare the reply in its main loop, then poll.
    pub async fn request_value(&self, kind: ValueKind) -> Result<f32, ServiceError> {
        let port = Arc::clone(&self.port);
        let settle = self.settle;

        let frame = tokio::task::spawn_blocking(move || {
            let mut port = port
                .lock()
                .map_err(|_| ServiceError::from("bus port lock poisoned"))?;

            port.write_all(&[ActuationCommand::Request(kind).encode()])?;
            port.flush()?;

            thread::sleep(settle);

            let mut frame = [0u8; REPLY_LEN];
            port.read_exact(&mut frame)?;

            Ok::<[u8; REPLY_LEN], ServiceError>(frame)
        })
        .await??;

        Ok(decode_reply(frame))
    }
}

#[cfg(test)]
pub mod mock {
    use std::io;

    use florasync_api::wire::encode_reply;

    use super::*;

    /// In-memory stand-in for the bus port: records writes, serves a
    /// scripted reply stream.
    #[derive(Debug, Default)]
    pub struct MockPort {
        pub written: Vec<u8>,
        pub replies: Vec<u8>,
        cursor: usize,
    }

    impl MockPort {
        pub fn with_replies(values: &[f32]) -> Self {
            let mut replies = Vec::new();
            for &value in values {
                replies.extend_from_slice(&encode_reply(value));
            }

            Self { written: Vec::new(), replies, cursor: 0 }
        }

        pub fn with_reply_frame(frame: [u8; REPLY_LEN]) -> Self {
            Self { written: Vec::new(), replies: frame.to_vec(), cursor: 0 }
        }
    }

    impl io::Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl io::Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.cursor >= self.replies.len() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
            }

            let available = &self.replies[self.cursor..];
            let count = available.len().min(buf.len());
            buf[..count].copy_from_slice(&available[..count]);
            self.cursor += count;

            Ok(count)
        }
    }

    #[tokio::test]
    async fn command_is_one_byte_on_the_wire() {
        let service = ActuatorService::new(MockPort::default(), Duration::ZERO);

        service.send_command(ActuationCommand::PumpOn).await.unwrap();
        service.send_command(ActuationCommand::PumpOff).await.unwrap();

        let port = service.port.lock().unwrap();
        assert_eq!(port.written, vec![0x01, 0x00]);
    }

    #[tokio::test]
    async fn value_request_polls_four_byte_reply() {
        let service =
            ActuatorService::new(MockPort::with_replies(&[7.0]), Duration::ZERO);

        let value = service.request_value(ValueKind::Ph).await.unwrap();
        assert_eq!(value, 7.0);

        let port = service.port.lock().unwrap();
        assert_eq!(port.written, vec![0x10]);
    }

    #[tokio::test]
    async fn silent_responder_surfaces_an_error() {
        let service = ActuatorService::new(MockPort::default(), Duration::ZERO);

        assert!(service.request_value(ValueKind::Uv).await.is_err());
    }

    /// Loopback against the real slave-side command server: what the
    /// master writes is what the responder consumes, and the reply it
    /// prepares is what the master decodes.
    #[tokio::test]
    async fn round_trip_with_command_server() {
        use embedded_hal::digital::OutputPin;
        use florasync_embedded::actuator::{CommandServer, PH_PLACEHOLDER, PumpState};

        #[derive(Default)]
        struct NullPin(bool);

        impl embedded_hal::digital::ErrorType for NullPin {
            type Error = core::convert::Infallible;
        }

        impl OutputPin for NullPin {
            fn set_low(&mut self) -> Result<(), Self::Error> {
                self.0 = false;
                Ok(())
            }

            fn set_high(&mut self) -> Result<(), Self::Error> {
                self.0 = true;
                Ok(())
            }
        }

        let mut server = CommandServer::new(NullPin::default()).unwrap();

        // Master sends a pump-on frame.
        let service = ActuatorService::new(MockPort::default(), Duration::ZERO);
        service.send_command(ActuationCommand::PumpOn).await.unwrap();

        {
            let port = service.port.lock().unwrap();
            server.on_receive(&port.written);
        }
        server.tick().unwrap();
        assert_eq!(server.pump_state(), PumpState::On);

        // Master requests pH; the responder's prepared reply decodes back.
        server.on_receive(&[ActuationCommand::Request(ValueKind::Ph).encode()]);
        server.tick().unwrap();

        let service = ActuatorService::new(
            MockPort::with_reply_frame(server.on_request()),
            Duration::ZERO,
        );
        let value = service.request_value(ValueKind::Ph).await.unwrap();
        assert_eq!(value, PH_PLACEHOLDER);
    }
}
