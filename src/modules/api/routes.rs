use crate::{modules::api::handlers::sensor_data_handler, shared::storage::snapshot::Snapshot};
use std::convert::Infallible;
use warp::Filter;

/// GET /data
pub fn data_route(
    snapshot: Snapshot,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("data")
        .and(warp::get())
        .and(with_snapshot(snapshot))
        .and_then(sensor_data_handler)
}

fn with_snapshot(
    snapshot: Snapshot,
) -> impl Filter<Extract = (Snapshot,), Error = Infallible> + Clone {
    warp::any().map(move || snapshot.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;

    #[tokio::test]
    async fn missing_snapshot_serves_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let route = data_route(Snapshot::new(dir.path().join("sensor_data.json")));

        let res = warp::test::request().method("GET").path("/data").reply(&route).await;
        assert_eq!(res.status(), 200);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn snapshot_is_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_data.json");
        fs::write(&path, r#"[{"crop_number": 1, "soil_ph": 6.5}]"#).unwrap();
        let route = data_route(Snapshot::new(&path));

        let res = warp::test::request().method("GET").path("/data").reply(&route).await;
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!([{ "crop_number": 1, "soil_ph": 6.5 }]));
    }

    #[tokio::test]
    async fn corrupt_snapshot_serves_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_data.json");
        fs::write(&path, "[{").unwrap();
        let route = data_route(Snapshot::new(&path));

        let res = warp::test::request().method("GET").path("/data").reply(&route).await;
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let route = data_route(Snapshot::new(dir.path().join("sensor_data.json")));

        let res = warp::test::request().method("POST").path("/data").reply(&route).await;
        assert_eq!(res.status(), 405);
    }
}
