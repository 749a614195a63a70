// ── Wire ⇄ stored ⇄ domain conversions ──
//
// Field-for-field copies. No derived fields, no defaults: what the server
// sends is what the store keeps and what the UI shows.

use farmsync_api::FarmDto;

use crate::model::Farm;
use crate::store::StoredFarm;

impl From<FarmDto> for StoredFarm {
    fn from(dto: FarmDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            licensed_area: dto.licensed_area,
            updated_at: dto.updated_at,
        }
    }
}

impl From<StoredFarm> for Farm {
    fn from(stored: StoredFarm) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            licensed_area: stored.licensed_area,
            updated_at: stored.updated_at,
        }
    }
}

impl From<&StoredFarm> for Farm {
    fn from(stored: &StoredFarm) -> Self {
        Self {
            id: stored.id,
            name: stored.name.clone(),
            licensed_area: stored.licensed_area,
            updated_at: stored.updated_at,
        }
    }
}

/// Map a store snapshot to domain farms, preserving order.
pub(crate) fn farms_from_stored(records: &[StoredFarm]) -> Vec<Farm> {
    records.iter().map(Farm::from).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wire_to_domain_is_identity() {
        let updated_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).single().unwrap();
        let dto = FarmDto {
            id: 42,
            name: "North Field".into(),
            licensed_area: Some(12.5),
            updated_at,
        };

        let farm = Farm::from(StoredFarm::from(dto.clone()));

        assert_eq!(
            farm,
            Farm {
                id: dto.id,
                name: dto.name,
                licensed_area: dto.licensed_area,
                updated_at: dto.updated_at,
            }
        );
    }

    #[test]
    fn absent_area_stays_absent() {
        let stored = StoredFarm {
            id: 1,
            name: "Orchard".into(),
            licensed_area: None,
            updated_at: Utc::now(),
        };
        assert_eq!(Farm::from(&stored).licensed_area, None);
    }

    #[test]
    fn snapshot_order_is_preserved() {
        let now = Utc::now();
        let record = |id, name: &str| StoredFarm {
            id,
            name: name.into(),
            licensed_area: None,
            updated_at: now,
        };
        let records = vec![record(2, "A"), record(1, "B")];
        let ids: Vec<i64> = farms_from_stored(&records).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
