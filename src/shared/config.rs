use crate::shared::{
    errors::ConfigError,
    schema::{FieldRange, RangeTable, UNRANGED_FIELDS},
};
use rumqttc::QoS;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Configs {
    pub mqtt: MqttConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    /// Per-field range overrides, keyed by field name.
    pub validation: BTreeMap<String, FieldRange>,

    #[serde(skip)]
    config_path: PathBuf,
}

impl Configs {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut configs: Configs =
            toml::from_str(&config_content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        configs.config_path = path.to_path_buf();
        configs.validate()?;
        Ok(configs)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn range_table(&self) -> RangeTable {
        RangeTable::default().with_overrides(&self.validation)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.mqtt.broker.trim().is_empty() {
            return invalid("mqtt.broker must not be empty".to_string());
        }
        if self.mqtt.topic.trim().is_empty() {
            return invalid("mqtt.topic must not be empty".to_string());
        }
        if self.mqtt.qos > 2 {
            return invalid(format!(
                "mqtt.qos {} is not a valid QoS level (must be 0, 1, or 2)",
                self.mqtt.qos
            ));
        }
        if self.mqtt.keep_alive < 5 {
            return invalid(format!(
                "mqtt.keep_alive {}s is below the 5s minimum",
                self.mqtt.keep_alive
            ));
        }
        if self.mqtt.channel_capacity == 0 {
            return invalid("mqtt.channel_capacity must be greater than 0".to_string());
        }
        if self.storage.csv_file.as_os_str().is_empty()
            || self.storage.json_file.as_os_str().is_empty()
        {
            return invalid("storage paths must not be empty".to_string());
        }
        for (field, range) in &self.validation {
            if UNRANGED_FIELDS.contains(&field.to_lowercase().as_str()) {
                return invalid(format!("validation.{} cannot take a range", field));
            }
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return invalid(format!(
                    "validation.{} has an invalid range [{}, {}]",
                    field, range.min, range.max
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub qos: u8,
    pub keep_alive: u16,
    pub channel_capacity: usize,
}

impl MqttConfig {
    pub fn qos(&self) -> QoS {
        match self.qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "agri-sensor-ingest".to_string(),
            topic: "agri_sensor/data".to_string(),
            qos: 1,
            keep_alive: 60,
            channel_capacity: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub csv_file: PathBuf,
    pub json_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            csv_file: PathBuf::from("sensor_data.csv"),
            json_file: PathBuf::from("sensor_data.json"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
