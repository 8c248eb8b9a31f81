//! Live integration tests for sladash-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/sladash-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, TimeZone, Utc};
use sladash_core::{
    Availability, AvailabilityRecord, Item, Location, PayloadShape, RecordSink,
    ServiceabilityRecord, ServiceabilityStatus, Store, StoreItemPair,
};
use sladash_db::{
    health_check, insert_availability_checks, insert_serviceability_checks,
    list_availability_checks, list_serviceability_checks, AvailabilityFilter, PgRecordStore,
    ServiceabilityFilter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn serviceability(name: &str, store_id: &str, minutes_ago: i64) -> ServiceabilityRecord {
    let location = Location {
        name: name.to_string(),
        latitude: 12.97,
        longitude: 77.59,
    };
    let checked_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
        - Duration::minutes(minutes_ago);
    let mut record = ServiceabilityRecord::unknown(&location, checked_at);
    record.store_id = store_id.to_string();
    record.sla_minutes_label = "15 MINS".to_string();
    record.serviceability = ServiceabilityStatus::Serviceable;
    record.shape = PayloadShape::Recognized;
    record
}

fn availability(store_id: &str, item_id: &str, available: Availability) -> AvailabilityRecord {
    let store = Store {
        store_id: store_id.to_string(),
        latitude: 12.93,
        longitude: 77.62,
        name: None,
    };
    let item = Item {
        item_id: item_id.to_string(),
        item_name: Some("Milk".to_string()),
    };
    let mut record = AvailabilityRecord::unknown(&StoreItemPair::new(&store, &item), Utc::now());
    record.available = available;
    record
}

// ---------------------------------------------------------------------------
// Serviceability
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds_on_fresh_database(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health check");
}

#[sqlx::test(migrations = "../../migrations")]
async fn serviceability_insert_and_list_round_trip(pool: sqlx::PgPool) {
    let records = vec![
        serviceability("Indiranagar", "1001", 10),
        serviceability("Whitefield", "2002", 5),
    ];

    let written = insert_serviceability_checks(&pool, &records)
        .await
        .expect("insert");
    assert_eq!(written, 2);

    let rows = list_serviceability_checks(&pool, &ServiceabilityFilter::default())
        .await
        .expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].location_name, "Whitefield", "newest first");
    assert_eq!(rows[0].serviceability, "SERVICEABLE");
    assert_eq!(rows[0].payload_shape, "recognized");
    assert_eq!(rows[1].sla_minutes_label, "15 MINS");
}

#[sqlx::test(migrations = "../../migrations")]
async fn serviceability_empty_insert_is_a_no_op(pool: sqlx::PgPool) {
    let written = insert_serviceability_checks(&pool, &[]).await.expect("insert");
    assert_eq!(written, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn serviceability_filters_narrow_results(pool: sqlx::PgPool) {
    let records = vec![
        serviceability("Indiranagar", "1001", 120),
        serviceability("Indiranagar", "1001", 10),
        serviceability("Whitefield", "2002", 5),
    ];
    insert_serviceability_checks(&pool, &records)
        .await
        .expect("insert");

    let by_location = list_serviceability_checks(
        &pool,
        &ServiceabilityFilter {
            location_name: Some("indiranagar".to_string()),
            ..ServiceabilityFilter::default()
        },
    )
    .await
    .expect("list by location");
    assert_eq!(by_location.len(), 2);

    let recent = list_serviceability_checks(
        &pool,
        &ServiceabilityFilter {
            location_name: Some("Indiranagar".to_string()),
            since: Some(records[1].checked_at),
            ..ServiceabilityFilter::default()
        },
    )
    .await
    .expect("list since");
    assert_eq!(recent.len(), 1);

    let paged = list_serviceability_checks(
        &pool,
        &ServiceabilityFilter {
            limit: Some(1),
            offset: Some(1),
            ..ServiceabilityFilter::default()
        },
    )
    .await
    .expect("list page");
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].location_name, "Indiranagar");
    assert_eq!(paged[0].checked_at, records[1].checked_at);
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn availability_unknown_is_stored_as_null(pool: sqlx::PgPool) {
    let records = vec![
        availability("1001", "A1", Availability::Available),
        availability("1001", "B2", Availability::Unknown),
        availability("1002", "A1", Availability::Unavailable),
    ];
    let written = insert_availability_checks(&pool, &records)
        .await
        .expect("insert");
    assert_eq!(written, 3);

    let unknown = list_availability_checks(
        &pool,
        &AvailabilityFilter {
            item_id: Some("B2".to_string()),
            ..AvailabilityFilter::default()
        },
    )
    .await
    .expect("list by item");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].available, None);
    assert_eq!(unknown[0].item_internal_name, "Milk");
    assert_eq!(unknown[0].spot_city, "UNKNOWN");

    let store = list_availability_checks(
        &pool,
        &AvailabilityFilter {
            store_id: Some("1002".to_string()),
            ..AvailabilityFilter::default()
        },
    )
    .await
    .expect("list by store");
    assert_eq!(store.len(), 1);
    assert_eq!(store[0].available, Some(false));
}

#[sqlx::test(migrations = "../../migrations")]
async fn record_store_writes_through_sink(pool: sqlx::PgPool) {
    let store = PgRecordStore::new(pool.clone());

    let rows = RecordSink::<AvailabilityRecord>::bulk_insert(
        &store,
        &[availability("1001", "A1", Availability::Available)],
    )
    .await
    .expect("sink insert");
    assert_eq!(rows, 1);

    let listed = list_availability_checks(&pool, &AvailabilityFilter::default())
        .await
        .expect("list");
    assert_eq!(listed[0].available, Some(true));
}
