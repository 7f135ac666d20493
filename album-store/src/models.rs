//! Typed rows and their wire shapes.
//!
//! Rows mirror the SQLite schema; summaries are the compact list shape,
//! view models the full detail shape. All wire shapes serialize camelCase.
//! Ids and timestamps are stored as TEXT (uuid / RFC 3339).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---- photobooks (the tenant partition) ----

#[derive(Debug, Clone, FromRow)]
pub struct PhotobookRow {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub disabled: bool,
    pub created_at: String,
    pub created_by: Option<String>,
    pub updated_at: String,
    pub updated_by: Option<String>,
}

// ---- categories ----

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: String,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub category_name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl From<&CategoryRow> for CategorySummary {
    fn from(row: &CategoryRow) -> Self {
        Self {
            id: row.id.clone(),
            category_name: row.category_name.clone(),
            color: row.color.clone(),
            icon: row.icon.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryViewModel {
    pub id: String,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CategoryRow> for CategoryViewModel {
    fn from(row: &CategoryRow) -> Self {
        Self {
            id: row.id.clone(),
            category_name: row.category_name.clone(),
            description: row.description.clone(),
            color: row.color.clone(),
            icon: row.icon.clone(),
            disabled: row.disabled,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryWrite {
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

// ---- locations ----

#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: String,
    pub location_name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reusable: bool,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: String,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reusable: bool,
}

impl From<&LocationRow> for LocationSummary {
    fn from(row: &LocationRow) -> Self {
        Self {
            id: row.id.clone(),
            location_name: row.location_name.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            reusable: row.reusable,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationViewModel {
    pub id: String,
    pub location_name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reusable: bool,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&LocationRow> for LocationViewModel {
    fn from(row: &LocationRow) -> Self {
        Self {
            id: row.id.clone(),
            location_name: row.location_name.clone(),
            description: row.description.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            reusable: row.reusable,
            disabled: row.disabled,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationWrite {
    pub location_name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reusable: bool,
}

// ---- persons ----

#[derive(Debug, Clone, FromRow)]
pub struct PersonRow {
    pub id: String,
    pub person_name: Option<String>,
    pub description: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: String,
    pub person_name: Option<String>,
}

impl From<&PersonRow> for PersonSummary {
    fn from(row: &PersonRow) -> Self {
        Self {
            id: row.id.clone(),
            person_name: row.person_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonViewModel {
    pub id: String,
    pub person_name: Option<String>,
    pub description: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&PersonRow> for PersonViewModel {
    fn from(row: &PersonRow) -> Self {
        Self {
            id: row.id.clone(),
            person_name: row.person_name.clone(),
            description: row.description.clone(),
            disabled: row.disabled,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonWrite {
    pub person_name: Option<String>,
    pub description: Option<String>,
}

// ---- photos ----

#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: String,
    pub filename: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub taken_on: Option<String>,
    pub location_id: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSummary {
    pub id: String,
    pub filename: Option<String>,
    pub title: Option<String>,
    pub taken_on: Option<String>,
    pub location_id: Option<String>,
}

impl From<&PhotoRow> for PhotoSummary {
    fn from(row: &PhotoRow) -> Self {
        Self {
            id: row.id.clone(),
            filename: row.filename.clone(),
            title: row.title.clone(),
            taken_on: row.taken_on.clone(),
            location_id: row.location_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoViewModel {
    pub id: String,
    pub filename: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub taken_on: Option<String>,
    pub location_id: Option<String>,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
    pub location: Option<LocationSummary>,
    pub persons: Vec<PersonSummary>,
    pub categories: Vec<CategorySummary>,
}

/// Write shape for photos. `person_ids` / `category_ids` replace the full
/// association sets; every referenced id must live in the caller's
/// partition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoWrite {
    pub filename: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub taken_on: Option<String>,
    pub location_id: Option<Uuid>,
    pub person_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
}

pub fn parse_taken_on(value: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}
