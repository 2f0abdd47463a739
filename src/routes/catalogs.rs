use axum::Json;
use serde_json::Value;

use crate::catalogs;

/// GET /catalogs — static option catalogs for the profile forms. Public:
/// the data is the same for everyone and needed to render the first step.
pub async fn get_catalogs() -> Json<Value> {
    Json(catalogs::all_catalogs())
}
