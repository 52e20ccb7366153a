use crate::{modules::mqtt::mqtt_client::MqttClient, shared::pipeline::IngestPipeline};
use rumqttc::QoS;
use std::sync::Arc;

/// Routes every reading published on `topic` through the ingestion pipeline.
pub async fn handler(
    client: &MqttClient,
    topic: &str,
    qos: QoS,
    pipeline: Arc<IngestPipeline>,
) -> Result<(), rumqttc::ClientError> {
    if let Err(err) = client.subscribe(topic, qos).await {
        log::error!("Error subscribing to {} err: {:#?}", topic, err);
        return Err(err);
    }

    client
        .add_topic_handler(topic, qos, move |_topic, payload| {
            pipeline.handle(payload);
        })
        .await;

    Ok(())
}
