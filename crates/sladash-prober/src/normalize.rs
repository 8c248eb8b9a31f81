//! Extraction of internal records from commerce API payloads.
//!
//! The upstream JSON is mostly stable but drifts: fields get renamed between
//! camelCase and snake_case, blocks move under a `data` wrapper, ids switch
//! between strings and numbers. Every lookup therefore goes through an alias
//! list, and nothing here fails. Missing fields become [`UNKNOWN`]; a block
//! with the wrong JSON type marks the record [`PayloadShape::Malformed`].

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sladash_core::{
    Availability, AvailabilityRecord, Coordinates, Location, PayloadShape, ServiceabilityRecord,
    ServiceabilityStatus, Spot, StoreItemPair, UNKNOWN,
};

/// Used when a store block exists but names neither description nor locality.
pub const DEFAULT_STORE_DESCRIPTION: &str = "Unknown Store";

const DATA_WRAPPER: &[&str] = &["data", "result"];

const STORE_BLOCK: &[&str] = &["store", "storeInfo", "store_info"];
const STORE_ID: &[&str] = &["id", "storeId", "store_id"];
const STORE_DESCRIPTION: &[&str] = &["description", "storeDescription", "store_description"];
const STORE_LOCALITY: &[&str] = &["locality", "storeLocality", "store_locality", "area"];

const SERVICEABILITY_BLOCK: &[&str] = &["serviceability", "serviceabilityInfo", "serviceability_info"];
const SERVICEABILITY_STATUS: &[&str] = &["status", "serviceabilityStatus", "serviceability_status"];
const SLA: &[&str] = &["sla", "slaString", "sla_string", "eta"];

const ITEM_BLOCK: &[&str] = &["item", "product"];
const ITEM_NAME: &[&str] = &["name", "displayName", "display_name"];
const ITEM_BRAND: &[&str] = &["brand", "brandName", "brand_name"];
const ITEM_CATEGORY: &[&str] = &["category", "categoryName", "category_name"];
const ITEM_VARIATIONS: &[&str] = &["variations", "variants"];
const IN_STOCK: &[&str] = &["inStock", "in_stock", "available", "isAvailable"];

const SPOT_BLOCK: &[&str] = &["spot", "pickupSpot", "pickup_spot"];
const SPOT_NAME: &[&str] = &["name", "spotName"];
const SPOT_AREA: &[&str] = &["area", "spotArea"];
const SPOT_CITY: &[&str] = &["city", "cityName"];

/// Lookup result for a nested object.
enum Block<'a> {
    Missing,
    Present(&'a Map<String, Value>),
    Malformed,
}

/// Tallies recognised fields to derive the record's [`PayloadShape`].
#[derive(Default)]
struct Tally {
    expected: usize,
    found: usize,
    malformed: bool,
}

impl Tally {
    fn field<T>(&mut self, value: Option<T>) -> Option<T> {
        self.expected += 1;
        if value.is_some() {
            self.found += 1;
        }
        value
    }

    fn block<'a>(&mut self, block: Block<'a>) -> Option<&'a Map<String, Value>> {
        match block {
            Block::Present(map) => Some(map),
            Block::Malformed => {
                self.malformed = true;
                None
            }
            Block::Missing => None,
        }
    }

    fn shape(&self) -> PayloadShape {
        if self.malformed {
            PayloadShape::Malformed
        } else if self.found == 0 {
            PayloadShape::Unrecognized
        } else if self.found == self.expected {
            PayloadShape::Recognized
        } else {
            PayloadShape::Partial
        }
    }
}

/// Extracts a [`ServiceabilityRecord`] for `location`.
///
/// An absent payload yields an all-unknown record.
#[must_use]
pub fn normalize_serviceability(
    payload: Option<&Value>,
    location: &Location,
    checked_at: DateTime<Utc>,
) -> ServiceabilityRecord {
    let Some(payload) = payload else {
        return ServiceabilityRecord::unknown(location, checked_at);
    };

    let mut tally = Tally::default();
    let root = root_object(payload, &mut tally);

    let store = root.and_then(|r| tally.block(object_block(r, STORE_BLOCK)));
    let service = root.and_then(|r| tally.block(object_block(r, SERVICEABILITY_BLOCK)));

    let store_id = tally.field(store.and_then(|s| str_field(s, STORE_ID)));
    let description = store.and_then(|s| str_field(s, STORE_DESCRIPTION));
    let locality = store.and_then(|s| str_field(s, STORE_LOCALITY));
    tally.field(description.as_ref().or(locality.as_ref()));

    // Some layouts put the status and SLA directly on the root object.
    let status = tally.field(
        service
            .and_then(|s| str_field(s, SERVICEABILITY_STATUS))
            .or_else(|| root.and_then(|r| str_field(r, &["serviceabilityStatus"]))),
    );
    let sla = tally.field(
        service
            .and_then(|s| str_field(s, SLA))
            .or_else(|| root.and_then(|r| str_field(r, SLA))),
    );

    let store_locality = locality.clone().unwrap_or_else(|| UNKNOWN.to_string());
    let store_description = if store.is_some() {
        describe_store(description, locality)
    } else {
        UNKNOWN.to_string()
    };

    ServiceabilityRecord {
        location_name: location.name.clone(),
        coordinates: Coordinates {
            latitude: location.latitude,
            longitude: location.longitude,
        },
        store_id: store_id.unwrap_or_else(|| UNKNOWN.to_string()),
        store_description,
        store_locality,
        sla_minutes_label: sla.unwrap_or_else(|| UNKNOWN.to_string()),
        serviceability: status.map_or(ServiceabilityStatus::Unknown, |s| {
            ServiceabilityStatus::from_raw(&s)
        }),
        checked_at,
        shape: tally.shape(),
    }
}

/// Extracts an [`AvailabilityRecord`] for `pair`.
///
/// The item counts as available when any of its variations is in stock.
/// An absent payload yields an all-unknown record.
#[must_use]
pub fn normalize_availability(
    payload: Option<&Value>,
    pair: &StoreItemPair,
    checked_at: DateTime<Utc>,
) -> AvailabilityRecord {
    let Some(payload) = payload else {
        return AvailabilityRecord::unknown(pair, checked_at);
    };

    let mut tally = Tally::default();
    let root = root_object(payload, &mut tally);

    let item = root.and_then(|r| tally.block(object_block(r, ITEM_BLOCK)));
    let store = root.and_then(|r| tally.block(object_block(r, STORE_BLOCK)));
    let spot = store.and_then(|s| tally.block(object_block(s, SPOT_BLOCK)));

    let item_name = tally.field(item.and_then(|i| str_field(i, ITEM_NAME)));
    let brand = tally.field(item.and_then(|i| str_field(i, ITEM_BRAND)));
    let category = tally.field(item.and_then(|i| str_field(i, ITEM_CATEGORY)));
    let stock = item.and_then(|i| item_availability(i, &mut tally));
    let available = tally.field(stock);

    let description = store.and_then(|s| str_field(s, STORE_DESCRIPTION));
    let locality = tally.field(store.and_then(|s| str_field(s, STORE_LOCALITY)));
    tally.field(description.as_ref());

    let store_description = if store.is_some() {
        describe_store(description, locality.clone())
    } else {
        UNKNOWN.to_string()
    };

    let spot = spot.map_or_else(Spot::unknown, |s| Spot {
        name: str_field(s, SPOT_NAME).unwrap_or_else(|| UNKNOWN.to_string()),
        area: str_field(s, SPOT_AREA).unwrap_or_else(|| UNKNOWN.to_string()),
        city: str_field(s, SPOT_CITY).unwrap_or_else(|| UNKNOWN.to_string()),
    });

    AvailabilityRecord {
        store_id: pair.store_id.clone(),
        item_id: pair.item_id.clone(),
        item_internal_name: pair
            .item_name
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        item_name: item_name.unwrap_or_else(|| UNKNOWN.to_string()),
        brand: brand.unwrap_or_else(|| UNKNOWN.to_string()),
        category: category.unwrap_or_else(|| UNKNOWN.to_string()),
        available: Availability::from(available),
        store_locality: locality.unwrap_or_else(|| UNKNOWN.to_string()),
        store_description,
        spot,
        coordinates: Coordinates {
            latitude: pair.latitude,
            longitude: pair.longitude,
        },
        checked_at,
        shape: tally.shape(),
    }
}

/// Combines description and locality: both, then either, then the default.
#[must_use]
pub fn describe_store(description: Option<String>, locality: Option<String>) -> String {
    match (description, locality) {
        (Some(d), Some(l)) => format!("{d} - {l}"),
        (Some(d), None) => d,
        (None, Some(l)) => l,
        (None, None) => DEFAULT_STORE_DESCRIPTION.to_string(),
    }
}

/// The object holding the blocks, descending through a `data` wrapper.
fn root_object<'a>(payload: &'a Value, tally: &mut Tally) -> Option<&'a Map<String, Value>> {
    let Some(obj) = payload.as_object() else {
        tally.malformed = true;
        return None;
    };
    match object_block(obj, DATA_WRAPPER) {
        Block::Present(inner) => Some(inner),
        Block::Missing | Block::Malformed => Some(obj),
    }
}

/// `Some(true)` if any variation is in stock, `Some(false)` if variations
/// report stock and none has it, `None` if nothing reports stock.
///
/// Items without variations fall back to an item-level stock flag.
fn item_availability(item: &Map<String, Value>, tally: &mut Tally) -> Option<bool> {
    let variations = match lookup(item, ITEM_VARIATIONS) {
        None | Some(Value::Null) => None,
        Some(Value::Array(list)) => Some(list),
        Some(_) => {
            tally.malformed = true;
            return None;
        }
    };

    let Some(variations) = variations else {
        return bool_field(item, IN_STOCK);
    };

    let mut any_reported = false;
    for variation in variations {
        let Some(variation) = variation.as_object() else {
            tally.malformed = true;
            continue;
        };
        match bool_field(variation, IN_STOCK) {
            Some(true) => return Some(true),
            Some(false) => any_reported = true,
            None => {}
        }
    }
    any_reported.then_some(false)
}

fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| obj.get(*key))
}

fn object_block<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Block<'a> {
    match lookup(obj, aliases) {
        None | Some(Value::Null) => Block::Missing,
        Some(Value::Object(map)) => Block::Present(map),
        Some(_) => Block::Malformed,
    }
}

/// String or numeric field, trimmed; empty strings count as missing.
fn str_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    match lookup(obj, aliases)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Boolean field; also accepts `"true"`/`"false"` strings and 0/1.
fn bool_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<bool> {
    match lookup(obj, aliases)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
