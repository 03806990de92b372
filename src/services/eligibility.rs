// src/services/eligibility.rs
//
// Regras de horário para adicionar ao carrinho e fechar o pedido.
// Funções puras: recebem a hora local do estabelecimento e a configuração
// da categoria, nunca leem o relógio sozinhas. Quem chama deve reavaliar
// no momento da escrita (add ao carrinho, checkout), não só ao renderizar.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::i18n::I18nStore,
    models::catalog::{Category, Gating, Product},
};

// Janelas de serviço das categorias comuns, em minutos desde 00:00, [início, fim)
const SERVICE_WINDOWS: [(u32, u32); 2] = [
    (11 * 60, 12 * 60 + 30),
    (16 * 60, 19 * 60),
];
// Quarta-feira: sem serviço a partir desta hora
const WEDNESDAY_CLOSING_HOUR: u32 = 13;
const CLOSED_WEEKDAY: Weekday = Weekday::Wed;
// Piso usado apenas pelo aviso exibido na vitrine do Light Lunch
const GATED_DISPLAY_OPENING_HOUR: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    OutsideServiceHours,
    ClosedToday,
    NotAvailableToday,
    PastDeadline {
        #[schema(value_type = String, example = "12:00")]
        deadline: NaiveTime,
    },
    TooEarly,
    PickupTimeRequired,
    ProductUnavailable,
}

impl Rejection {
    pub fn message_key(&self) -> &'static str {
        match self {
            Rejection::OutsideServiceHours => "eligibility.outside_service_hours",
            Rejection::ClosedToday => "eligibility.closed_today",
            Rejection::NotAvailableToday => "eligibility.not_available_today",
            Rejection::PastDeadline { .. } => "eligibility.past_deadline",
            Rejection::TooEarly => "eligibility.too_early",
            Rejection::PickupTimeRequired => "eligibility.pickup_time_required",
            Rejection::ProductUnavailable => "eligibility.product_unavailable",
        }
    }

    pub fn localized(&self, lang: &str, i18n: &I18nStore) -> String {
        match self {
            Rejection::PastDeadline { deadline } => {
                let deadline = deadline.format("%H:%M").to_string();
                i18n.translate_with(lang, self.message_key(), &[("deadline", &deadline)])
            }
            _ => i18n.translate(lang, self.message_key()),
        }
    }
}

/// Resultado exposto pela API: sem falha parcial, ou pode ou não pode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<Rejection>,
    #[schema(example = "Servizio non disponibile in questo orario.")]
    pub message: Option<String>,
}

impl Decision {
    pub fn from_result(result: Result<(), Rejection>, lang: &str, i18n: &I18nStore) -> Self {
        match result {
            Ok(()) => Self { allowed: true, reason: None, message: None },
            Err(rejection) => Self {
                allowed: false,
                reason: Some(rejection),
                message: Some(rejection.localized(lang, i18n)),
            },
        }
    }
}

fn minute_of_day(now: &NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Categorias sem prazo: 11:00–12:30 e 16:00–19:00, exceto quarta a partir das 13h.
pub fn check_general(now: NaiveDateTime) -> Result<(), Rejection> {
    let minute = minute_of_day(&now);
    let in_window = SERVICE_WINDOWS
        .iter()
        .any(|&(start, end)| minute >= start && minute < end);
    let wednesday_closed = now.weekday() == CLOSED_WEEKDAY && now.hour() >= WEDNESDAY_CLOSING_HOUR;

    if in_window && !wednesday_closed {
        Ok(())
    } else {
        Err(Rejection::OutsideServiceHours)
    }
}

fn check_gated_day(now: &NaiveDateTime, gating: &Gating) -> Result<(), Rejection> {
    let today = now.weekday();
    if today == CLOSED_WEEKDAY {
        return Err(Rejection::ClosedToday);
    }
    if !gating.available_days.is_empty() && !gating.available_days.contains(&today) {
        return Err(Rejection::NotAvailableToday);
    }
    Ok(())
}

fn check_deadline(now: &NaiveDateTime, gating: &Gating) -> Result<(), Rejection> {
    let (hour, minute) = (now.hour(), now.minute());
    let (deadline_hour, deadline_minute) = (gating.deadline.hour(), gating.deadline.minute());

    // Igual ao prazo já é tarde demais
    if hour > deadline_hour || (hour == deadline_hour && minute >= deadline_minute) {
        return Err(Rejection::PastDeadline { deadline: gating.deadline });
    }
    Ok(())
}

/// Política usada no carrinho e no checkout: só o prazo, sem piso de abertura.
pub fn check_gated(now: NaiveDateTime, gating: &Gating) -> Result<(), Rejection> {
    check_gated_day(&now, gating)?;
    check_deadline(&now, gating)
}

/// Política do aviso na vitrine: igual a `check_gated`, mas também recusa
/// antes das 09:00. As duas divergem de propósito entre 00:00 e 09:00.
pub fn gated_display_warning(now: NaiveDateTime, gating: &Gating) -> Result<(), Rejection> {
    check_gated_day(&now, gating)?;
    if now.hour() < GATED_DISPLAY_OPENING_HOUR {
        return Err(Rejection::TooEarly);
    }
    check_deadline(&now, gating)
}

pub fn check_category(now: NaiveDateTime, category: &Category) -> Result<(), Rejection> {
    match category.gating() {
        Some(gating) => check_gated(now, &gating),
        None => check_general(now),
    }
}

/// Avaliação de um produto no momento de colocá-lo no carrinho.
pub fn check_product(now: NaiveDateTime, product: &Product, category: &Category) -> Result<(), Rejection> {
    if !product.available {
        return Err(Rejection::ProductUnavailable);
    }
    check_category(now, category)
}

pub fn requires_pickup(product: &Product, category: &Category) -> bool {
    product.pickup_required || category.gating().is_some()
}

/// Checkout: a falta de horário de retirada é reportada antes (e
/// independentemente) das janelas de horário; depois cada linha é reavaliada.
pub fn check_checkout(
    now: NaiveDateTime,
    lines: &[(&Product, &Category)],
    pickup_time: Option<&str>,
) -> Result<(), Rejection> {
    let pickup_missing = pickup_time.map(str::trim).is_none_or(str::is_empty);
    if pickup_missing && lines.iter().any(|(p, c)| requires_pickup(p, c)) {
        return Err(Rejection::PickupTimeRequired);
    }

    for (product, category) in lines {
        check_product(now, product, category)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::{category, product};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    // 2025-06-18 é quarta, 2025-06-19 é quinta
    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid datetime")
    }

    fn lunch(deadline: &str) -> Gating {
        category("light-lunch", Some(deadline), None).gating().expect("gated")
    }

    #[test]
    fn general_wednesday_afternoon_is_rejected() {
        assert_eq!(check_general(at(18, 13, 30, 0)), Err(Rejection::OutsideServiceHours));
        assert_eq!(check_general(at(18, 17, 0, 0)), Err(Rejection::OutsideServiceHours));
        // quarta de manhã a janela ainda vale
        assert_eq!(check_general(at(18, 11, 15, 0)), Ok(()));
    }

    #[test]
    fn general_thursday_morning_is_allowed() {
        assert_eq!(check_general(at(19, 11, 15, 0)), Ok(()));
        assert_eq!(check_general(at(19, 16, 0, 0)), Ok(()));
    }

    #[test]
    fn general_window_edges() {
        assert_eq!(check_general(at(19, 10, 59, 59)), Err(Rejection::OutsideServiceHours));
        assert_eq!(check_general(at(19, 11, 0, 0)), Ok(()));
        assert_eq!(check_general(at(19, 12, 29, 59)), Ok(()));
        assert_eq!(check_general(at(19, 12, 30, 0)), Err(Rejection::OutsideServiceHours));
        assert_eq!(check_general(at(19, 18, 59, 0)), Ok(()));
        assert_eq!(check_general(at(19, 19, 0, 0)), Err(Rejection::OutsideServiceHours));
    }

    #[test]
    fn gated_deadline_is_exclusive() {
        let gating = lunch("12:00");
        assert_eq!(
            check_gated(at(19, 12, 0, 0), &gating),
            Err(Rejection::PastDeadline { deadline: gating.deadline })
        );
        assert_eq!(check_gated(at(19, 11, 59, 59), &gating), Ok(()));
    }

    #[test]
    fn gated_deadline_compares_minutes_too() {
        let gating = lunch("11:30");
        assert_eq!(check_gated(at(19, 11, 29, 0), &gating), Ok(()));
        assert!(check_gated(at(19, 11, 30, 0), &gating).is_err());
        assert!(check_gated(at(19, 12, 10, 0), &gating).is_err());
    }

    #[test]
    fn gated_is_closed_on_wednesday_at_any_time() {
        let gating = lunch("12:00");
        assert_eq!(check_gated(at(18, 8, 0, 0), &gating), Err(Rejection::ClosedToday));
        assert_eq!(gated_display_warning(at(18, 10, 0, 0), &gating), Err(Rejection::ClosedToday));
    }

    #[test]
    fn gated_honours_available_days() {
        let gating = category("light-lunch", Some("12:00"), Some(&["monday", "friday"]))
            .gating()
            .expect("gated");
        assert_eq!(check_gated(at(19, 10, 0, 0), &gating), Err(Rejection::NotAvailableToday));
        assert_eq!(check_gated(at(20, 10, 0, 0), &gating), Ok(()));
    }

    #[test]
    fn display_policy_adds_opening_floor_checkout_policy_does_not() {
        let gating = lunch("12:00");
        let early = at(19, 8, 30, 0);

        assert_eq!(check_gated(early, &gating), Ok(()));
        assert_eq!(gated_display_warning(early, &gating), Err(Rejection::TooEarly));

        // fora dessa faixa as duas concordam
        let late_morning = at(19, 10, 0, 0);
        assert_eq!(check_gated(late_morning, &gating), gated_display_warning(late_morning, &gating));
        let noon = at(19, 12, 0, 0);
        assert_eq!(check_gated(noon, &gating), gated_display_warning(noon, &gating));
    }

    #[test]
    fn gated_checkout_without_pickup_time_is_rejected_regardless_of_window() {
        let cat = category("light-lunch", Some("12:00"), None);
        let item = product("Insalata", Decimal::new(1200, 2), &cat);

        // dentro do prazo
        assert_eq!(
            check_checkout(at(19, 10, 0, 0), &[(&item, &cat)], None),
            Err(Rejection::PickupTimeRequired)
        );
        // fora do prazo, mesma resposta
        assert_eq!(
            check_checkout(at(19, 15, 0, 0), &[(&item, &cat)], Some("  ")),
            Err(Rejection::PickupTimeRequired)
        );
        assert_eq!(check_checkout(at(19, 10, 0, 0), &[(&item, &cat)], Some("12:30")), Ok(()));
    }

    #[test]
    fn pickup_required_flag_applies_to_plain_categories() {
        let cat = category("drinks", None, None);
        let mut item = product("Caraffa", Decimal::new(900, 2), &cat);
        item.pickup_required = true;

        assert_eq!(
            check_checkout(at(19, 11, 15, 0), &[(&item, &cat)], None),
            Err(Rejection::PickupTimeRequired)
        );
    }

    #[test]
    fn checkout_reevaluates_every_line() {
        let drinks = category("drinks", None, None);
        let lunch_cat = category("light-lunch", Some("12:00"), None);
        let spritz = product("Spritz", Decimal::new(700, 2), &drinks);
        let salad = product("Insalata", Decimal::new(1200, 2), &lunch_cat);

        // 12:10: drinks ainda ok, light lunch já fechou
        assert!(matches!(
            check_checkout(at(19, 12, 10, 0), &[(&spritz, &drinks), (&salad, &lunch_cat)], Some("12:30")),
            Err(Rejection::PastDeadline { .. })
        ));
    }

    #[test]
    fn unavailable_product_is_rejected() {
        let cat = category("drinks", None, None);
        let mut item = product("Spritz", Decimal::new(700, 2), &cat);
        item.available = false;
        assert_eq!(check_product(at(19, 11, 15, 0), &item, &cat), Err(Rejection::ProductUnavailable));
    }

    #[test]
    fn decision_carries_localized_message() {
        let store = I18nStore::new();
        let decision = Decision::from_result(
            Err(Rejection::PastDeadline { deadline: NaiveTime::from_hms_opt(12, 0, 0).expect("time") }),
            "en",
            &store,
        );
        assert!(!decision.allowed);
        assert_eq!(decision.message.as_deref(), Some("Orders for this category close at 12:00."));

        let ok = Decision::from_result(Ok(()), "it", &store);
        assert!(ok.allowed && ok.reason.is_none());
    }

    #[test]
    fn client_reads_the_server_decision_payload() {
        // Formato que o `ApiClient::checkout_decision` recebe em `data`
        let payload = serde_json::json!({
            "allowed": false,
            "reason": { "code": "past_deadline", "deadline": "12:00:00" },
            "message": "Orders for this category close at 12:00."
        });
        let decision: Decision = serde_json::from_value(payload).expect("decision");

        assert!(!decision.allowed);
        assert_eq!(
            decision.reason,
            Some(Rejection::PastDeadline { deadline: NaiveTime::from_hms_opt(12, 0, 0).expect("time") })
        );

        let allowed: Decision =
            serde_json::from_value(serde_json::json!({ "allowed": true, "reason": null, "message": null }))
                .expect("decision");
        assert!(allowed.allowed && allowed.reason.is_none());
    }
}
