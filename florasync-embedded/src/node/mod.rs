//! Duty-cycled sensor node controller: one wake runs the whole
//! BOOT → CONNECT → SAMPLE → PUBLISH → SLEEP machine top to bottom and
//! ends in a timer wake; nothing survives the sleep boundary.

use alloc::string::String;

use embedded_hal::delay::DelayNs;
use florasync_api::codec;
use florasync_api::topics;

use crate::error::{Error, Result};
use crate::sensor::{Sample, SampleSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Boot,
    ConnectNetwork,
    ConnectBus,
    Sample,
    Publish,
    Sleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Connectivity snapshot, rebuilt from scratch at the top of every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionState {
    pub network: LinkState,
    pub bus: LinkState,
}

#[derive(Debug, Clone)]
pub struct DutyCycleConfig {
    /// Broker identity and telemetry topic key of this node.
    pub node_id: String,
    pub network_attempts: u8,
    pub network_retry_delay_ms: u32,
    pub bus_attempts: u8,
    pub bus_retry_delay_ms: u32,
    /// Deep-sleep interval between wakes.
    pub wake_interval_secs: u64,
}

impl Default for DutyCycleConfig {
    fn default() -> Self {
        Self {
            node_id: String::from("plant-node-1"),
            network_attempts: 30,
            network_retry_delay_ms: 500,
            bus_attempts: 5,
            bus_retry_delay_ms: 5000,
            wake_interval_secs: 30,
        }
    }
}

/// Radio association, one attempt per call.
pub trait NetworkLink {
    fn connect(&mut self) -> Result<()>;
}

/// Publish session against the message broker.
pub trait TelemetrySession {
    fn connect(&mut self, client_id: &str) -> Result<()>;
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;
}

/// Deep-sleep timer; firing it ends the process until the next wake.
pub trait WakeControl {
    fn schedule_wake(&mut self, after_secs: u64);
}

/// What one wake accomplished, for the boot log.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Furthest stage the cycle ran to completion.
    pub stage_reached: CycleStage,
    pub published: bool,
    pub sample: Option<Sample>,
}

pub struct DutyCycleController<N, S, W, D, P>
where
    N: NetworkLink,
    S: TelemetrySession,
    W: WakeControl,
    D: DelayNs,
    P: SampleSource,
{
    config: DutyCycleConfig,
    network: N,
    session: S,
    sleeper: W,
    delay: D,
    sampler: P,
    link: ConnectionState,
}

impl<N, S, W, D, P> DutyCycleController<N, S, W, D, P>
where
    N: NetworkLink,
    S: TelemetrySession,
    W: WakeControl,
    D: DelayNs,
    P: SampleSource,
{
    pub fn new(
        config: DutyCycleConfig,
        network: N,
        session: S,
        sleeper: W,
        delay: D,
        sampler: P,
    ) -> Self {
        Self {
            config,
            network,
            session,
            sleeper,
            delay,
            sampler,
            link: ConnectionState::default(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link
    }

    /// Run one complete duty cycle. Every path, including every failure
    /// path, ends in exactly one wake being scheduled.
    pub fn run(&mut self) -> CycleReport {
        self.link = ConnectionState::default();

        let report = self.run_to_publish();

        log::info!(
            "cycle done at {:?}, sleeping {}s",
            report.stage_reached,
            self.config.wake_interval_secs
        );
        self.sleeper.schedule_wake(self.config.wake_interval_secs);

        report
    }

    fn run_to_publish(&mut self) -> CycleReport {
        if !self.connect_network() {
            return CycleReport {
                stage_reached: CycleStage::ConnectNetwork,
                published: false,
                sample: None,
            };
        }

        if !self.connect_session() {
            return CycleReport {
                stage_reached: CycleStage::ConnectBus,
                published: false,
                sample: None,
            };
        }

        let sample = self.sampler.sample();

        let published = match self.publish(&sample) {
            Ok(()) => true,
            Err(e) => {
                // Logged only; the reading is dropped and the next wake
                // starts clean.
                log::warn!("telemetry publish failed: {e}");
                false
            }
        };

        CycleReport {
            stage_reached: CycleStage::Publish,
            published,
            sample: Some(sample),
        }
    }

    fn connect_network(&mut self) -> bool {
        self.link.network = LinkState::Connecting;

        for attempt in 1..=self.config.network_attempts {
            match self.network.connect() {
                Ok(()) => {
                    self.link.network = LinkState::Connected;
                    return true;
                }
                Err(e) => {
                    log::debug!("network attempt {attempt} failed: {e}");
                    self.delay.delay_ms(self.config.network_retry_delay_ms);
                }
            }
        }

        self.link.network = LinkState::Disconnected;
        log::warn!("network association failed, skipping this cycle");
        false
    }

    fn connect_session(&mut self) -> bool {
        for attempt in 1..=self.config.bus_attempts {
            match self.session.connect(&self.config.node_id) {
                Ok(()) => {
                    self.link.bus = LinkState::Connected;
                    return true;
                }
                Err(e) => {
                    log::debug!("broker attempt {attempt} failed: {e}");
                    self.delay.delay_ms(self.config.bus_retry_delay_ms);
                }
            }
        }

        log::warn!("broker session failed, skipping this cycle");
        false
    }

    fn publish(&mut self, sample: &Sample) -> Result<()> {
        let payload =
            codec::encode(&sample.reading).map_err(|_| Error::SerializationError)?;

        let topic = topics::node_telemetry(&self.config.node_id);
        self.session.publish(&topic, &payload)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use florasync_api::message::SensorReading;

    use super::*;
    use crate::sensor::EcCalibration;

    struct MockNetwork {
        failures_left: u8,
        attempts: u8,
    }

    impl MockNetwork {
        fn up() -> Self {
            Self { failures_left: 0, attempts: 0 }
        }

        fn down() -> Self {
            Self { failures_left: u8::MAX, attempts: 0 }
        }
    }

    impl NetworkLink for MockNetwork {
        fn connect(&mut self) -> Result<()> {
            self.attempts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                Err(Error::NetworkError)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct MockSession {
        fail_connect: bool,
        fail_publish: bool,
        connect_attempts: u8,
        published: Vec<(String, Vec<u8>)>,
    }

    impl TelemetrySession for MockSession {
        fn connect(&mut self, _client_id: &str) -> Result<()> {
            self.connect_attempts += 1;
            if self.fail_connect {
                Err(Error::NotConnected)
            } else {
                Ok(())
            }
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
            if self.fail_publish {
                return Err(Error::NotConnected);
            }
            self.published.push((String::from(topic), payload.to_vec()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockSleeper {
        calls: u8,
        last_secs: u64,
    }

    impl WakeControl for MockSleeper {
        fn schedule_wake(&mut self, after_secs: u64) {
            self.calls += 1;
            self.last_secs = after_secs;
        }
    }

    struct NoopDelay;

    impl DelayNs for NoopDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[derive(Default)]
    struct FixedSampler {
        calls: u8,
    }

    impl SampleSource for FixedSampler {
        fn sample(&mut self) -> Sample {
            self.calls += 1;
            Sample {
                reading: SensorReading {
                    temp_soil_c: 21.3,
                    moisture_raw: 1800,
                    light_lux: 540.0,
                    uv_voltage: 0.71,
                    ec_voltage: 1.002,
                },
                ec: EcCalibration::default().measure(1.002, 21.3),
            }
        }
    }

    fn config() -> DutyCycleConfig {
        DutyCycleConfig {
            network_attempts: 3,
            bus_attempts: 2,
            ..DutyCycleConfig::default()
        }
    }

    #[test]
    fn healthy_cycle_publishes_once_then_sleeps_once() {
        let mut controller = DutyCycleController::new(
            config(),
            MockNetwork::up(),
            MockSession::default(),
            MockSleeper::default(),
            NoopDelay,
            FixedSampler::default(),
        );

        let report = controller.run();

        assert!(report.published);
        assert_eq!(controller.sleeper.calls, 1);
        assert_eq!(controller.sleeper.last_secs, 30);
        assert_eq!(controller.session.published.len(), 1);

        let (topic, payload) = &controller.session.published[0];
        assert_eq!(topic, "telemetry/node/plant-node-1/data");
        let decoded: SensorReading = codec::decode(payload).unwrap();
        assert_eq!(decoded.moisture_raw, 1800);
    }

    #[test]
    fn network_exhaustion_skips_straight_to_sleep() {
        let mut controller = DutyCycleController::new(
            config(),
            MockNetwork::down(),
            MockSession::default(),
            MockSleeper::default(),
            NoopDelay,
            FixedSampler::default(),
        );

        let report = controller.run();

        assert_eq!(report.stage_reached, CycleStage::ConnectNetwork);
        assert!(!report.published);
        assert_eq!(controller.network.attempts, 3);
        assert_eq!(controller.session.connect_attempts, 0);
        assert_eq!(controller.sampler.calls, 0);
        assert_eq!(controller.sleeper.calls, 1);
    }

    #[test]
    fn broker_failure_skips_sampling_and_sleeps_once() {
        let session = MockSession { fail_connect: true, ..MockSession::default() };
        let mut controller = DutyCycleController::new(
            config(),
            MockNetwork::up(),
            session,
            MockSleeper::default(),
            NoopDelay,
            FixedSampler::default(),
        );

        let report = controller.run();

        assert_eq!(report.stage_reached, CycleStage::ConnectBus);
        assert_eq!(controller.session.connect_attempts, 2);
        assert_eq!(controller.sampler.calls, 0);
        assert_eq!(controller.sleeper.calls, 1);
    }

    #[test]
    fn publish_failure_is_not_retried_and_still_sleeps_once() {
        let session = MockSession { fail_publish: true, ..MockSession::default() };
        let mut controller = DutyCycleController::new(
            config(),
            MockNetwork::up(),
            session,
            MockSleeper::default(),
            NoopDelay,
            FixedSampler::default(),
        );

        let report = controller.run();

        assert_eq!(report.stage_reached, CycleStage::Publish);
        assert!(!report.published);
        assert_eq!(controller.sampler.calls, 1);
        assert_eq!(controller.sleeper.calls, 1);
    }

    #[test]
    fn transient_network_failure_recovers_within_budget() {
        let network = MockNetwork { failures_left: 2, attempts: 0 };
        let mut controller = DutyCycleController::new(
            config(),
            network,
            MockSession::default(),
            MockSleeper::default(),
            NoopDelay,
            FixedSampler::default(),
        );

        let report = controller.run();

        assert!(report.published);
        assert_eq!(controller.network.attempts, 3);
        assert!(matches!(controller.connection_state().network, LinkState::Connected));
    }
}
