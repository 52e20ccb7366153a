use crate::shared::storage::snapshot::Snapshot;
use std::convert::Infallible;

/// Snapshot document exactly as stored, or `[]` when there is nothing readable.
#[utoipa::path(
        get,
        path = "/data",
        responses(
            (status = 200, description = "Every accepted sensor reading, oldest first", content_type = "application/json"),
        )
    )
]
pub async fn sensor_data_handler(snapshot: Snapshot) -> Result<impl warp::Reply, Infallible> {
    let data = tokio::task::spawn_blocking(move || snapshot.read_value())
        .await
        .unwrap_or_else(|err| {
            log::error!("Snapshot read task failed: {}", err);
            serde_json::Value::Array(Vec::new())
        });

    Ok(warp::reply::json(&data))
}
