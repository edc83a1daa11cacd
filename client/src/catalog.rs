use zonemap_shared::MapCatalog;

const CATALOG_URL: &str = "/locations.json";

/// Fetch and parse the map catalog. One-shot at startup; a failure leaves
/// the session with no active map (the caller logs and the selector stays
/// empty) and the app simply draws nothing until a reload.
pub async fn fetch_catalog() -> Result<MapCatalog, String> {
    let resp = gloo_net::http::Request::get(CATALOG_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<MapCatalog>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
