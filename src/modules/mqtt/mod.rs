mod handlers;
mod mqtt_client;

use crate::shared::{config::MqttConfig, pipeline::IngestPipeline};
use mqtt_client::MqttClient;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Connects to the broker and feeds the configured topic into the pipeline.
pub async fn start_mqtt(
    config: MqttConfig,
    pipeline: Arc<IngestPipeline>,
) -> Result<JoinHandle<()>, rumqttc::ClientError> {
    let (mqtt, event_loop) = MqttClient::new(&config);
    log::info!("Mqtt started...");

    handlers::sensor_data::handler(&mqtt, &config.topic, config.qos(), pipeline).await?;

    Ok(event_loop)
}
