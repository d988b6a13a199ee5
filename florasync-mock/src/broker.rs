use std::collections::HashMap;
use std::error::Error;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use rumqttd::local::LinkTx;
use rumqttd::{Broker, Config, ConnectionSettings, Notification, RouterConfig, ServerSettings};

use crate::settings::Gateway;

/// Embedded plaintext MQTT broker standing in for the deployment's LAN
/// broker.
pub struct MockBroker {
    broker: Arc<Mutex<Broker>>,
}

impl MockBroker {
    pub fn new(gateway: &Gateway) -> Result<Self, Box<dyn Error>> {
        let broker = Broker::new(Config {
            id: 0,
            router: RouterConfig {
                max_connections: 128,
                max_outgoing_packet_count: 200,
                max_segment_size: 1048576,
                max_segment_count: 10,
                custom_segment: None,
                initialized_filters: None,
                shared_subscriptions_strategy: Default::default(),
            },
            v4: Some(HashMap::from([(
                1.to_string(),
                ServerSettings {
                    name: "v4-1".to_string(),
                    listen: (gateway.host.parse::<IpAddr>()?, gateway.port).into(),
                    tls: None,
                    next_connection_delay_ms: 10,
                    connections: ConnectionSettings {
                        connection_timeout_ms: 60000,
                        max_payload_size: 20480,
                        max_inflight_count: 100,
                        auth: None,
                        external_auth: None,
                        dynamic_filters: true,
                    },
                },
            )])),
            v5: None,
            ws: None,
            cluster: None,
            console: None,
            bridge: None,
            prometheus: None,
            metrics: None,
        });

        Ok(Self {
            broker: Arc::new(Mutex::new(broker)),
        })
    }

    pub fn start(&self) {
        let broker = Arc::clone(&self.broker);

        thread::spawn(move || broker.lock().unwrap().start().unwrap());
    }

    /// Open a local publish link subscribed to `topic`, with a console
    /// printer draining the inbound side.
    pub fn link(&self, client_id: &str, topic: &str) -> Result<LinkTx, Box<dyn Error>> {
        let (mut link_tx, mut link_rx) = {
            let broker = self.broker.lock().unwrap();
            broker.link(client_id)?
        };

        link_tx.subscribe(topic)?;

        thread::spawn(move || {
            loop {
                let notification = match link_rx.recv() {
                    Ok(Some(v)) => v,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                match notification {
                    Notification::Forward(forward) => {
                        tracing::info!(
                            "[{}] {}",
                            String::from_utf8_lossy(&forward.publish.topic),
                            String::from_utf8_lossy(&forward.publish.payload),
                        );
                    }
                    v => tracing::trace!("{v:?}"),
                }
            }
        });

        Ok(link_tx)
    }
}
