use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub name: Option<String>,
    pub roommates: [&'static str; 4],
}

#[derive(Debug, Deserialize)]
pub struct SetIdentityRequest {
    pub name: String,
}
