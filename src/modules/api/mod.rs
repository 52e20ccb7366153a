mod handlers;
mod routes;
mod swagger;

use crate::shared::{config::ApiConfig, storage::snapshot::Snapshot};
use std::net::{IpAddr, SocketAddr};
use tokio::task::JoinHandle;
use utoipa::OpenApi;
use warp::Filter;

pub fn start_api(config: ApiConfig, snapshot: Snapshot) -> Result<JoinHandle<()>, std::net::AddrParseError> {
    let host: IpAddr = config.host.parse()?;
    let addr = SocketAddr::new(host, config.port);

    let task = tokio::spawn(async move {
        let api_doc = warp::path("api-doc.json")
            .and(warp::get())
            .map(|| warp::reply::json(&swagger::AgriSensorDoc::openapi()));

        let routes = api_doc.or(routes::data_route(snapshot));

        log::info!("Starting API on {}...", addr);
        warp::serve(routes).run(addr).await;
    });

    Ok(task)
}
