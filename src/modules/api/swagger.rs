use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(super::handlers::sensor_data_handler),
    tags( (name = "Agri sensor API", description = "Read-only access to stored readings") )
)]
pub struct AgriSensorDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_data_route() {
        let doc = AgriSensorDoc::openapi();
        assert!(doc.paths.paths.contains_key("/data"));
    }
}
