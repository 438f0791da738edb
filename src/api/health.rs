use actix_web::{get, web::Json};
use serde_json::{json, Value};

#[get("/health")]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
