use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sladash_core::{classify_availability, classify_sla, Availability, AvailabilityBand, SlaBand};
use sladash_db::{AvailabilityFilter, ServiceabilityFilter};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ServiceabilityItem {
    id: i64,
    location_name: String,
    latitude: f64,
    longitude: f64,
    store_id: String,
    store_description: String,
    store_locality: String,
    sla_minutes_label: String,
    serviceability: String,
    band: SlaBand,
    payload_shape: String,
    checked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct AvailabilityItem {
    id: i64,
    store_id: String,
    item_id: String,
    item_internal_name: String,
    item_name: String,
    brand: String,
    category: String,
    available: Option<bool>,
    band: AvailabilityBand,
    store_locality: String,
    store_description: String,
    spot_name: String,
    spot_area: String,
    spot_city: String,
    payload_shape: String,
    checked_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceabilityQuery {
    pub location: Option<String>,
    pub store_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AvailabilityQuery {
    pub store_id: Option<String>,
    pub item_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(super) async fn list_serviceability(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ServiceabilityQuery>,
) -> Result<Json<ApiResponse<Vec<ServiceabilityItem>>>, ApiError> {
    let rows = sladash_db::list_serviceability_checks(
        &state.pool,
        &ServiceabilityFilter {
            location_name: query.location,
            store_id: query.store_id,
            since: query.since,
            limit: query.limit,
            offset: query.offset,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ServiceabilityItem {
            band: classify_sla(Some(&row.sla_minutes_label)),
            id: row.id,
            location_name: row.location_name,
            latitude: row.latitude,
            longitude: row.longitude,
            store_id: row.store_id,
            store_description: row.store_description,
            store_locality: row.store_locality,
            sla_minutes_label: row.sla_minutes_label,
            serviceability: row.serviceability,
            payload_shape: row.payload_shape,
            checked_at: row.checked_at,
        })
        .collect();

    Ok(ApiResponse::new(data, req_id.0))
}

pub(super) async fn list_availability(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<Vec<AvailabilityItem>>>, ApiError> {
    let rows = sladash_db::list_availability_checks(
        &state.pool,
        &AvailabilityFilter {
            store_id: query.store_id,
            item_id: query.item_id,
            since: query.since,
            limit: query.limit,
            offset: query.offset,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| AvailabilityItem {
            band: classify_availability(Availability::from(row.available)),
            id: row.id,
            store_id: row.store_id,
            item_id: row.item_id,
            item_internal_name: row.item_internal_name,
            item_name: row.item_name,
            brand: row.brand,
            category: row.category,
            available: row.available,
            store_locality: row.store_locality,
            store_description: row.store_description,
            spot_name: row.spot_name,
            spot_area: row.spot_area,
            spot_city: row.spot_city,
            payload_shape: row.payload_shape,
            checked_at: row.checked_at,
        })
        .collect();

    Ok(ApiResponse::new(data, req_id.0))
}
