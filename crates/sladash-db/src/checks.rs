//! Persistence for check records.
//!
//! Each successful probe becomes one row. Writes go through a single
//! `INSERT … SELECT * FROM UNNEST(…)` per run, so a batch of any size costs
//! one round-trip.

use chrono::{DateTime, Utc};
use sladash_core::{AvailabilityRecord, RecordSink, ServiceabilityRecord};
use sqlx::PgPool;

use crate::DbError;

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceabilityCheckRow {
    pub id: i64,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub store_id: String,
    pub store_description: String,
    pub store_locality: String,
    pub sla_minutes_label: String,
    pub serviceability: String,
    pub payload_shape: String,
    pub checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AvailabilityCheckRow {
    pub id: i64,
    pub store_id: String,
    pub item_id: String,
    pub item_internal_name: String,
    pub item_name: String,
    pub brand: String,
    pub category: String,
    /// `None` when the payload carried no stock signal.
    pub available: Option<bool>,
    pub store_locality: String,
    pub store_description: String,
    pub spot_name: String,
    pub spot_area: String,
    pub spot_city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub payload_shape: String,
    pub checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceabilityFilter {
    /// Exact, case-insensitive match on the location name.
    pub location_name: Option<String>,
    pub store_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct AvailabilityFilter {
    pub store_id: Option<String>,
    pub item_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Clamps a requested page size to `1..=MAX_LIST_LIMIT`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Insert serviceability records in one statement.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_serviceability_checks(
    pool: &PgPool,
    records: &[ServiceabilityRecord],
) -> Result<u64, sqlx::Error> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut location_names: Vec<String> = Vec::with_capacity(records.len());
    let mut latitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut longitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut store_ids: Vec<String> = Vec::with_capacity(records.len());
    let mut store_descriptions: Vec<String> = Vec::with_capacity(records.len());
    let mut store_localities: Vec<String> = Vec::with_capacity(records.len());
    let mut sla_labels: Vec<String> = Vec::with_capacity(records.len());
    let mut statuses: Vec<String> = Vec::with_capacity(records.len());
    let mut shapes: Vec<String> = Vec::with_capacity(records.len());
    let mut checked_ats: Vec<DateTime<Utc>> = Vec::with_capacity(records.len());

    for record in records {
        location_names.push(record.location_name.clone());
        latitudes.push(record.coordinates.latitude);
        longitudes.push(record.coordinates.longitude);
        store_ids.push(record.store_id.clone());
        store_descriptions.push(record.store_description.clone());
        store_localities.push(record.store_locality.clone());
        sla_labels.push(record.sla_minutes_label.clone());
        statuses.push(record.serviceability.as_str().to_string());
        shapes.push(record.shape.as_str().to_string());
        checked_ats.push(record.checked_at);
    }

    let result = sqlx::query(
        "INSERT INTO serviceability_checks \
             (location_name, latitude, longitude, store_id, store_description, \
              store_locality, sla_minutes_label, serviceability, payload_shape, checked_at) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::float8[], $3::float8[], $4::text[], $5::text[], \
              $6::text[], $7::text[], $8::text[], $9::text[], $10::timestamptz[])",
    )
    .bind(&location_names)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&store_ids)
    .bind(&store_descriptions)
    .bind(&store_localities)
    .bind(&sla_labels)
    .bind(&statuses)
    .bind(&shapes)
    .bind(&checked_ats)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Insert availability records in one statement. Unknown availability is
/// stored as `NULL`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_availability_checks(
    pool: &PgPool,
    records: &[AvailabilityRecord],
) -> Result<u64, sqlx::Error> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut store_ids: Vec<String> = Vec::with_capacity(records.len());
    let mut item_ids: Vec<String> = Vec::with_capacity(records.len());
    let mut internal_names: Vec<String> = Vec::with_capacity(records.len());
    let mut item_names: Vec<String> = Vec::with_capacity(records.len());
    let mut brands: Vec<String> = Vec::with_capacity(records.len());
    let mut categories: Vec<String> = Vec::with_capacity(records.len());
    let mut availables: Vec<Option<bool>> = Vec::with_capacity(records.len());
    let mut store_localities: Vec<String> = Vec::with_capacity(records.len());
    let mut store_descriptions: Vec<String> = Vec::with_capacity(records.len());
    let mut spot_names: Vec<String> = Vec::with_capacity(records.len());
    let mut spot_areas: Vec<String> = Vec::with_capacity(records.len());
    let mut spot_cities: Vec<String> = Vec::with_capacity(records.len());
    let mut latitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut longitudes: Vec<f64> = Vec::with_capacity(records.len());
    let mut shapes: Vec<String> = Vec::with_capacity(records.len());
    let mut checked_ats: Vec<DateTime<Utc>> = Vec::with_capacity(records.len());

    for record in records {
        store_ids.push(record.store_id.clone());
        item_ids.push(record.item_id.clone());
        internal_names.push(record.item_internal_name.clone());
        item_names.push(record.item_name.clone());
        brands.push(record.brand.clone());
        categories.push(record.category.clone());
        availables.push(record.available.as_option());
        store_localities.push(record.store_locality.clone());
        store_descriptions.push(record.store_description.clone());
        spot_names.push(record.spot.name.clone());
        spot_areas.push(record.spot.area.clone());
        spot_cities.push(record.spot.city.clone());
        latitudes.push(record.coordinates.latitude);
        longitudes.push(record.coordinates.longitude);
        shapes.push(record.shape.as_str().to_string());
        checked_ats.push(record.checked_at);
    }

    let result = sqlx::query(
        "INSERT INTO availability_checks \
             (store_id, item_id, item_internal_name, item_name, brand, category, available, \
              store_locality, store_description, spot_name, spot_area, spot_city, \
              latitude, longitude, payload_shape, checked_at) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[], \
              $7::bool[], $8::text[], $9::text[], $10::text[], $11::text[], $12::text[], \
              $13::float8[], $14::float8[], $15::text[], $16::timestamptz[])",
    )
    .bind(&store_ids)
    .bind(&item_ids)
    .bind(&internal_names)
    .bind(&item_names)
    .bind(&brands)
    .bind(&categories)
    .bind(&availables)
    .bind(&store_localities)
    .bind(&store_descriptions)
    .bind(&spot_names)
    .bind(&spot_areas)
    .bind(&spot_cities)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&shapes)
    .bind(&checked_ats)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// List serviceability checks, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_serviceability_checks(
    pool: &PgPool,
    filter: &ServiceabilityFilter,
) -> Result<Vec<ServiceabilityCheckRow>, DbError> {
    let rows = sqlx::query_as::<_, ServiceabilityCheckRow>(
        "SELECT id, location_name, latitude, longitude, store_id, store_description, \
                store_locality, sla_minutes_label, serviceability, payload_shape, \
                checked_at, created_at \
         FROM serviceability_checks \
         WHERE ($1::TEXT IS NULL OR LOWER(location_name) = LOWER($1)) \
           AND ($2::TEXT IS NULL OR store_id = $2) \
           AND ($3::timestamptz IS NULL OR checked_at >= $3) \
         ORDER BY checked_at DESC, id DESC \
         LIMIT $4 OFFSET $5",
    )
    .bind(filter.location_name.as_deref())
    .bind(filter.store_id.as_deref())
    .bind(filter.since)
    .bind(clamp_limit(filter.limit))
    .bind(clamp_offset(filter.offset))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List availability checks, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_availability_checks(
    pool: &PgPool,
    filter: &AvailabilityFilter,
) -> Result<Vec<AvailabilityCheckRow>, DbError> {
    let rows = sqlx::query_as::<_, AvailabilityCheckRow>(
        "SELECT id, store_id, item_id, item_internal_name, item_name, brand, category, \
                available, store_locality, store_description, spot_name, spot_area, \
                spot_city, latitude, longitude, payload_shape, checked_at, created_at \
         FROM availability_checks \
         WHERE ($1::TEXT IS NULL OR store_id = $1) \
           AND ($2::TEXT IS NULL OR item_id = $2) \
           AND ($3::timestamptz IS NULL OR checked_at >= $3) \
         ORDER BY checked_at DESC, id DESC \
         LIMIT $4 OFFSET $5",
    )
    .bind(filter.store_id.as_deref())
    .bind(filter.item_id.as_deref())
    .bind(filter.since)
    .bind(clamp_limit(filter.limit))
    .bind(clamp_offset(filter.offset))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Postgres-backed [`RecordSink`] for both record kinds.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordSink<ServiceabilityRecord> for PgRecordStore {
    type Error = DbError;

    async fn bulk_insert(&self, records: &[ServiceabilityRecord]) -> Result<u64, DbError> {
        Ok(insert_serviceability_checks(&self.pool, records).await?)
    }
}

impl RecordSink<AvailabilityRecord> for PgRecordStore {
    type Error = DbError;

    async fn bulk_insert(&self, records: &[AvailabilityRecord]) -> Result<u64, DbError> {
        Ok(insert_availability_checks(&self.pool, records).await?)
    }
}
