// src/models/catalog.rs

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::time::{parse_hhmm, parse_weekday};

/// Slug da categoria com prazo diário (Light Lunch).
pub const LIGHT_LUNCH_SLUG: &str = "light-lunch";
/// Prazo usado quando a categoria é o Light Lunch mas não tem `order_deadline`.
pub const DEFAULT_GATED_DEADLINE: &str = "12:00";

// --- Traduções ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Translations {
    #[schema(example = "Camera")]
    pub it: String,
    #[schema(example = "Room")]
    pub en: String,
}

impl Translations {
    pub fn for_lang(&self, lang: &str) -> &str {
        match lang {
            "en" => &self.en,
            _ => &self.it,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProductTranslations {
    pub it: String,
    pub en: String,
    pub description: Option<Translations>,
}

// --- Locais ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "location_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Room,
    Pool,
    Garden,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[schema(example = "pool")]
    pub name: String,
    #[schema(value_type = Translations)]
    pub translations: Json<Translations>,
    pub available: bool,
    #[sqlx(rename = "sort_order")]
    #[schema(example = 1)]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Categorias ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "light-lunch")]
    pub name: String,
    #[schema(value_type = Translations)]
    pub translations: Json<Translations>,
    #[sqlx(rename = "sort_order")]
    #[schema(example = 2)]
    pub order: i32,
    #[schema(example = "12:00")]
    pub order_deadline: Option<String>,
    #[schema(example = json!(["monday", "tuesday", "thursday"]))]
    pub available_days: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Configuração de horário de uma categoria com prazo diário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gating {
    pub deadline: NaiveTime,
    /// Vazio = todos os dias.
    pub available_days: Vec<Weekday>,
}

impl Category {
    /// `Some` quando a categoria tem prazo: tem `order_deadline` ou é o Light Lunch.
    /// Prazos e dias mal formatados no banco são ignorados.
    pub fn gating(&self) -> Option<Gating> {
        let deadline = match self.order_deadline.as_deref() {
            Some(raw) => parse_hhmm(raw),
            None if self.name == LIGHT_LUNCH_SLUG => parse_hhmm(DEFAULT_GATED_DEADLINE),
            None => None,
        }?;

        let available_days = self
            .available_days
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|d| parse_weekday(d))
            .collect();

        Some(Gating { deadline, available_days })
    }
}

// --- Produtos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Spritz")]
    pub name: String,
    #[schema(example = "7.00")]
    pub price: Decimal,
    pub category_id: Uuid,
    pub available: bool,
    #[schema(value_type = ProductTranslations)]
    pub translations: Json<ProductTranslations>,
    pub pickup_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn category(name: &str, deadline: Option<&str>, days: Option<&[&str]>) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            translations: Json(Translations::default()),
            order: 0,
            order_deadline: deadline.map(str::to_string),
            available_days: days.map(|d| d.iter().map(|s| s.to_string()).collect()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn product(name: &str, price: Decimal, category: &Category) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            category_id: category.id,
            available: true,
            translations: Json(ProductTranslations::default()),
            pickup_required: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
