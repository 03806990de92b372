// src/services/catalog_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        time::{parse_hhmm, parse_weekday, weekday_name, BusinessClock},
    },
    db::{
        catalog_repo::{CategoryChanges, LocationChanges, ProductChanges, ProductFilter},
        CatalogRepository,
    },
    models::{
        catalog::{Category, Location, LocationType, Product, ProductTranslations, Translations},
        order::check_amount,
    },
    services::eligibility::{self, Rejection},
};

// --- Validação de horários da categoria ---

fn field_error(field: &'static str, code: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code));
    AppError::ValidationError(errors)
}

/// Aceita só "HH:MM" válido.
pub fn normalize_deadline(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    parse_hhmm(trimmed)
        .map(|t| t.format("%H:%M").to_string())
        .ok_or_else(|| field_error("orderDeadline", "deadline_format"))
}

/// Nomes de dia em inglês, minúsculos e sem repetição. Lista vazia = todos os dias.
pub fn normalize_days(raw: &[String]) -> Result<Option<Vec<String>>, AppError> {
    let mut days: Vec<String> = Vec::with_capacity(raw.len());
    for value in raw {
        let day = parse_weekday(value).ok_or_else(|| field_error("availableDays", "weekday"))?;
        let name = weekday_name(day).to_string();
        if !days.contains(&name) {
            days.push(name);
        }
    }
    Ok(if days.is_empty() { None } else { Some(days) })
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    check_amount(price).map_err(|issue| field_error("price", issue.code()))
}

/// Elegibilidade de uma categoria agora: a política do carrinho e o aviso da vitrine.
#[derive(Debug, Clone)]
pub struct CategoryEligibility {
    pub category: Category,
    pub gated: bool,
    pub checkout: Result<(), Rejection>,
    pub display: Result<(), Rejection>,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    clock: BusinessClock,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, clock: BusinessClock) -> Self {
        Self { repo, clock }
    }

    // --- LOCAIS ---

    pub async fn list_locations(&self, available: Option<bool>) -> Result<Vec<Location>, AppError> {
        self.repo.list_locations(available).await
    }

    pub async fn create_location(
        &self,
        location_type: LocationType,
        name: &str,
        translations: &Translations,
        available: bool,
        order: i32,
    ) -> Result<Location, AppError> {
        let location = self.repo
            .create_location(location_type, name.trim(), translations, available, order)
            .await?;
        tracing::info!(location = %location.name, "Local criado");
        Ok(location)
    }

    pub async fn update_location(&self, id: Uuid, mut changes: LocationChanges) -> Result<Location, AppError> {
        changes.name = changes.name.map(|n| n.trim().to_string());
        self.repo.update_location(id, changes).await
    }

    // --- CATEGORIAS ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn create_category(
        &self,
        name: &str,
        translations: &Translations,
        order: i32,
        order_deadline: Option<&str>,
        available_days: Option<&[String]>,
    ) -> Result<Category, AppError> {
        let deadline = order_deadline.map(normalize_deadline).transpose()?;
        let days = match available_days {
            Some(raw) => normalize_days(raw)?,
            None => None,
        };

        let category = self.repo
            .create_category(
                &name.trim().to_lowercase(),
                translations,
                order,
                deadline.as_deref(),
                days.as_deref(),
            )
            .await?;
        tracing::info!(category = %category.name, gated = category.gating().is_some(), "Categoria criada");
        Ok(category)
    }

    pub async fn update_category(&self, id: Uuid, mut changes: CategoryChanges) -> Result<Category, AppError> {
        changes.name = changes.name.map(|n| n.trim().to_lowercase());
        if let Some(Some(raw)) = &changes.order_deadline {
            changes.order_deadline = Some(Some(normalize_deadline(raw)?));
        }
        if let Some(Some(raw)) = &changes.available_days {
            changes.available_days = Some(normalize_days(raw)?);
        }

        let category = self.repo.update_category(id, changes).await?;
        tracing::info!(
            category = %category.name,
            deadline = ?category.order_deadline,
            days = ?category.available_days,
            "Categoria atualizada"
        );
        Ok(category)
    }

    pub async fn category_eligibility(&self, id: Uuid) -> Result<CategoryEligibility, AppError> {
        let category = self.repo
            .find_category(self.repo.pool(), id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Category".into()))?;

        Ok(evaluate_category(category, self.clock.now_local()))
    }

    // --- PRODUTOS ---

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.repo.list_products(filter).await
    }

    pub async fn create_product(
        &self,
        name: &str,
        price: Decimal,
        category_id: Uuid,
        available: bool,
        translations: &ProductTranslations,
        pickup_required: bool,
    ) -> Result<Product, AppError> {
        check_price(price)?;
        let product = self.repo
            .create_product(name.trim(), price, category_id, available, translations, pickup_required)
            .await?;
        tracing::info!(product = %product.name, price = %product.price, "Produto criado");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, mut changes: ProductChanges) -> Result<Product, AppError> {
        if let Some(price) = changes.price {
            check_price(price)?;
        }
        changes.name = changes.name.map(|n| n.trim().to_string());
        self.repo.update_product(id, changes).await
    }
}

fn evaluate_category(category: Category, now: chrono::NaiveDateTime) -> CategoryEligibility {
    let gating = category.gating();
    let checkout = eligibility::check_category(now, &category);
    let display = match &gating {
        Some(g) => eligibility::gated_display_warning(now, g),
        None => checkout,
    };
    CategoryEligibility { gated: gating.is_some(), checkout, display, category }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::category;
    use chrono::NaiveDate;

    #[test]
    fn deadline_must_be_hh_mm() {
        assert_eq!(normalize_deadline(" 12:00 ").ok().as_deref(), Some("12:00"));
        assert!(normalize_deadline("12").is_err());
        assert!(normalize_deadline("24:00").is_err());
        assert!(normalize_deadline("9:30").is_err());
    }

    #[test]
    fn days_are_normalized_and_deduplicated() {
        let raw = vec!["Monday".to_string(), "mon".to_string(), "friday".to_string()];
        assert_eq!(
            normalize_days(&raw).ok().flatten(),
            Some(vec!["monday".to_string(), "friday".to_string()])
        );
        assert_eq!(normalize_days(&[]).ok(), Some(None));
        assert!(matches!(
            normalize_days(&["someday".to_string()]),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn negative_price_is_a_validation_error() {
        assert!(check_price(Decimal::new(-1, 2)).is_err());
        assert!(check_price(Decimal::ZERO).is_ok());
        assert!(check_price(Decimal::new(700, 2)).is_ok());
        assert!(check_price(Decimal::new(1999, 3)).is_err());
    }

    #[test]
    fn early_morning_lunch_is_open_for_cart_but_warned_on_display() {
        // quinta, 08:00
        let now = NaiveDate::from_ymd_opt(2025, 6, 19)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid datetime");
        let result = evaluate_category(category("light-lunch", None, None), now);

        assert!(result.gated);
        assert_eq!(result.checkout, Ok(()));
        assert_eq!(result.display, Err(Rejection::TooEarly));
    }

    #[test]
    fn regular_category_uses_the_same_answer_for_both_policies() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 19)
            .and_then(|d| d.and_hms_opt(11, 15, 0))
            .expect("valid datetime");
        let result = evaluate_category(category("drinks", None, None), now);

        assert!(!result.gated);
        assert_eq!(result.checkout, Ok(()));
        assert_eq!(result.display, Ok(()));
    }
}
