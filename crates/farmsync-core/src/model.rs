// ── Domain model ──
//
// The business-facing farm record, independent of wire and storage
// formats. Equality is full structural equality and is what change
// detection in the presentation layer compares.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked farm.
///
/// `id` is the stable identity assigned by the server. Farms are only
/// ever created or updated by a refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: i64,
    pub name: String,
    /// Licensed area in hectares, when the server reports one.
    pub licensed_area: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

