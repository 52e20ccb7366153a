mod logger;
mod modules;
mod shared;

use shared::{config::Configs, pipeline::IngestPipeline, storage::SensorStore};
use std::{path::PathBuf, sync::Arc};

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::start_log();

    let config_path =
        PathBuf::from(std::env::var("AGRI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string()));
    let configs = match Configs::load_from_file(&config_path) {
        Ok(c) => {
            log::info!("Configurations loaded from {}", c.config_path().display());
            c
        }
        Err(e) => {
            log::error!("Failed to load configurations: {}", e);
            return Err(e.into());
        }
    };

    let store = SensorStore::new(&configs.storage.csv_file, &configs.storage.json_file);
    store.init()?;
    let pipeline = Arc::new(IngestPipeline::new(configs.range_table(), store));
    let snapshot = pipeline.store().snapshot().clone();
    log::info!(
        "Accepted readings go to {} and {}",
        configs.storage.csv_file.display(),
        snapshot.path().display()
    );

    let api = if configs.api.enabled {
        Some(modules::api::start_api(configs.api.clone(), snapshot)?)
    } else {
        None
    };

    let mqtt = modules::mqtt::start_mqtt(configs.mqtt.clone(), pipeline).await?;

    if let Err(e) = mqtt.await {
        log::error!("MQTT event loop stopped: {}", e);
    }
    if let Some(api) = api {
        api.abort();
    }

    Ok(())
}
