use interview_api::router::ApiDoc;
use utoipa::OpenApi;

/// Serializes the OpenAPI document for the interview API to `path`.
fn write_openapi_document(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = api_doc.to_pretty_json()?;
    std::fs::write(path, document)?;
    println!("Wrote OpenAPI document to {path}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    write_openapi_document(ApiDoc::openapi(), &path)?;
    Ok(())
}
