//! Sample data seeding
//!
//! Inserts one location per district and a fixed roster of responders.
//! Rows that already exist (matched by district address and by identifier)
//! are left alone, so running it twice is harmless.

use edt_common::db::models::{Location, Responder, ResponderStatus, ResponderType};
use edt_common::db::retry::with_lock_retry;
use edt_common::{ids, time, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::{locations, responders};

/// District name and its centre coordinates
const DISTRICTS: &[(&str, &str)] = &[
    ("Chennai", "13.0827,80.2707"),
    ("Coimbatore", "11.0168,76.9558"),
    ("Madurai", "9.9252,78.1198"),
    ("Salem", "11.6643,78.1460"),
    ("Trichy", "10.7905,78.7047"),
];

const ROSTER: &[(ResponderType, &[&str])] = &[
    (
        ResponderType::Ambulance,
        &["AMB-001", "AMB-002", "AMB-003", "AMB-004", "AMB-005"],
    ),
    (
        ResponderType::Police,
        &["POL-101", "POL-102", "POL-103", "POL-104", "POL-105"],
    ),
    (ResponderType::Fire, &["FIRE-201", "FIRE-202", "FIRE-203"]),
    (ResponderType::Other, &["OTHER-301", "OTHER-302"]),
];

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub locations_created: usize,
    pub responders_created: usize,
}

pub async fn seed_sample_data(pool: &SqlitePool) -> Result<SeedReport> {
    with_lock_retry("seed sample data", || seed_once(pool)).await
}

async fn seed_once(pool: &SqlitePool) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut tx = pool.begin().await?;

    let mut location_ids = Vec::with_capacity(DISTRICTS.len());
    for (district, gps) in DISTRICTS {
        let address = format!("{} District Center", district);

        if let Some(existing) =
            locations::find_location_by_address(&mut *tx, &address, district).await?
        {
            debug!(district = %district, "Location already present");
            location_ids.push(existing.id);
            continue;
        }

        let now = time::now();
        let location = Location {
            id: ids::generate(),
            address: Some(address),
            landmark: Some(format!("{} Main Road", district)),
            gps_coordinates: Some(gps.to_string()),
            city: Some(district.to_string()),
            district: Some(district.to_string()),
            created_at: now,
            updated_at: now,
        };
        locations::insert_location(&mut *tx, &location).await?;
        location_ids.push(location.id);
        report.locations_created += 1;
    }

    // Spread units over the districts in roster order
    let mut slot = 0;
    for (responder_type, identifiers) in ROSTER {
        for identifier in identifiers.iter() {
            let location_id = location_ids[slot % location_ids.len()].clone();
            slot += 1;

            if responders::find_responder_by_identifier(&mut *tx, identifier, None)
                .await?
                .is_some()
            {
                debug!(identifier = %identifier, "Responder already present");
                continue;
            }

            let now = time::now();
            let responder = Responder {
                id: ids::generate(),
                responder_type: *responder_type,
                identifier: identifier.to_string(),
                status: ResponderStatus::Available,
                location_id: Some(location_id),
                created_at: now,
                updated_at: now,
            };
            responders::insert_responder(&mut *tx, &responder).await?;
            report.responders_created += 1;
        }
    }

    tx.commit().await?;

    info!(
        locations_created = report.locations_created,
        responders_created = report.responders_created,
        "Sample data seeded"
    );
    Ok(report)
}
