// Wire types for the PestScout REST API.
//
// Field names follow the server's camelCase JSON. Aliases cover the
// server's full response shape where it differs from the mobile contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A farm as returned by `GET /api/farms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmDto {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "licensedAreaHectares")]
    pub licensed_area: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /api/auth/login`.
///
/// Unknown fields such as `expiresIn` are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    pub refresh_token: String,
}
