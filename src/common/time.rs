// src/common/time.rs
//
// Relógio do estabelecimento. Todas as regras de horário (janelas de serviço,
// prazo do Light Lunch, prefixo do número do pedido) usam a hora local do
// fuso configurado, nunca UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    pub tz: Tz,
}

impl BusinessClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn now_local(&self) -> NaiveDateTime {
        self.to_local(Utc::now())
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date()
    }

    /// Início do dia local em UTC. Em lacunas de horário de verão cai para UTC puro.
    pub fn start_of_day_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN);
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }

    /// Intervalo `[início de from, início do dia seguinte a to)` em UTC.
    pub fn day_range_utc(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start = from.map(|d| self.start_of_day_utc(d));
        let end = to.map(|d| self.start_of_day_utc(d.succ_opt().unwrap_or(d)));
        (start, end)
    }
}

/// Lê "HH:MM" (exatamente dois dígitos cada).
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    if value.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_weekday(value: &str) -> Option<Weekday> {
    value.trim().parse::<Weekday>().ok()
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
