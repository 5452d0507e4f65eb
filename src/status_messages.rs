use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// Error body returned by every endpoint.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub code: String,
    pub message: String,
}

pub fn new_status(code: &str, message: String) -> Json<Status> {
    Json(Status {
        code: code.to_string(),
        message,
    })
}
