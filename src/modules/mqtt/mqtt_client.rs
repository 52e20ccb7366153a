use crate::shared::config::MqttConfig;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::Mutex,
    task::{self, JoinHandle},
    time::sleep,
};

type TopicHandler = Box<dyn FnMut(&str, &[u8]) + Send + Sync + 'static>;
type HandlerMap = HashMap<String, (QoS, TopicHandler)>;
type TopicHandlers = Arc<Mutex<HandlerMap>>;

#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    topic_handlers: TopicHandlers,
}

impl MqttClient {
    /// Creates the client and spawns its event loop. The handle ends only if the loop task dies.
    pub fn new(config: &MqttConfig) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive.into()));
        options.set_clean_session(false);

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);

        let topic_handlers: TopicHandlers = Arc::new(Mutex::new(HashMap::new()));

        info!("Connecting to broker at {}:{}", config.broker, config.port);
        let event_loop = task::spawn(run_event_loop(
            eventloop,
            client.clone(),
            Arc::clone(&topic_handlers),
        ));

        (
            MqttClient {
                client,
                topic_handlers,
            },
            event_loop,
        )
    }

    pub async fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), rumqttc::ClientError> {
        self.client.subscribe(topic, qos).await?;
        Ok(())
    }

    /// Registers a handler for a topic filter. The filter is resubscribed on every reconnect.
    pub async fn add_topic_handler<F>(&self, filter: &str, qos: QoS, handler: F)
    where
        F: FnMut(&str, &[u8]) + Send + Sync + 'static,
    {
        let mut handlers = self.topic_handlers.lock().await;
        handlers.insert(filter.to_string(), (qos, Box::new(handler)));
    }
}

/// Polls the broker connection forever.
///
/// Handlers run inline, so one message is fully processed before the next poll.
async fn run_event_loop(mut eventloop: EventLoop, client: AsyncClient, handlers: TopicHandlers) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let mut handlers = handlers.lock().await;
                // handlers do blocking file I/O; keep other tasks on this worker moving
                let handled = task::block_in_place(|| {
                    dispatch(&mut handlers, &publish.topic, &publish.payload[..])
                });
                if !handled {
                    warn!("No handler for message on topic '{}'", publish.topic);
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                info!("Connected with result code {:?}", connack.code);

                let filters = subscriptions(&*handlers.lock().await);
                for (filter, qos) in filters {
                    let client = client.clone();
                    tokio::spawn(async move {
                        info!("Subscribing to topic: {}", filter);
                        if let Err(e) = client.subscribe(filter.clone(), qos).await {
                            error!("Failed to subscribe to topic '{}': {}", filter, e);
                        }
                    });
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                debug!("Subscription acknowledged: {:?}", suback.return_codes);
            }
            Ok(_) => (),
            Err(e) => {
                error!("MQTT connection error: {}", e);
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Calls every handler whose filter matches `topic`. Returns whether any did.
fn dispatch(handlers: &mut HandlerMap, topic: &str, payload: &[u8]) -> bool {
    let mut handled = false;
    for (filter, (_, handler)) in handlers.iter_mut() {
        if rumqttc::matches(topic, filter) {
            handler(topic, payload);
            handled = true;
        }
    }
    handled
}

/// Filters to (re)subscribe after a connection is acknowledged.
fn subscriptions(handlers: &HandlerMap) -> Vec<(String, QoS)> {
    let mut filters: Vec<(String, QoS)> = handlers
        .iter()
        .map(|(filter, (qos, _))| (filter.clone(), *qos))
        .collect();
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    filters
}
