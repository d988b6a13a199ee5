use std::sync::Arc;
use std::time::Duration;

use florasync_api::codec;
use florasync_api::message::SensorReading;
use florasync_api::topics;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tokio::time;

use crate::broker::MockBroker;
use crate::settings::Settings;
use crate::simulate::{moisture_counts, soil_temperature, sunlight_lux};

mod broker;
pub mod settings;
mod simulate;

/// How many publish cycles span one simulated day.
const CYCLES_PER_DAY: u32 = 180;

pub async fn run(settings: &Arc<Settings>) {
    let broker = MockBroker::new(&settings.gateway).expect("Fail to create broker");
    broker.start();

    let mut link_tx = broker
        .link(&settings.gateway.client_id, "hub/#")
        .expect("Fail to open broker link");

    let mut interval = time::interval(Duration::from_secs(settings.mock.publish_interval_secs));
    let noise = Normal::new(0.0, 0.05).expect("valid noise distribution");
    let mut rng = rand::rng();
    let mut cycle_index: u32 = 0;

    loop {
        interval.tick().await;

        let day_fraction = f64::from(cycle_index % CYCLES_PER_DAY) / f64::from(CYCLES_PER_DAY);

        let reading = SensorReading {
            temp_soil_c: (soil_temperature(day_fraction) + noise.sample(&mut rng)) as f32,
            moisture_raw: moisture_counts(cycle_index),
            light_lux: sunlight_lux(day_fraction) as f32,
            uv_voltage: rng.random_range(0.3_f32..0.7_f32),
            ec_voltage: (1.0 + noise.sample(&mut rng)) as f32,
        };

        let topic = topics::node_telemetry(&settings.mock.node_id);
        match codec::encode(&reading) {
            Ok(payload) => {
                tracing::debug!("publish {} bytes on {topic}", payload.len());
                if let Err(e) = link_tx.publish(topic, payload) {
                    tracing::error!("mock publish failed: {e}");
                }
            }
            Err(e) => tracing::error!("mock reading encode failed: {e}"),
        }

        cycle_index += 1;
    }
}
