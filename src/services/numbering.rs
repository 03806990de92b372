// src/services/numbering.rs
//
// Número do pedido: "YYYYMMDD" + contador diário com 3 dígitos (20250617003).
// Aqui ficam só as regras de formato; a serialização por dia fica no
// `OrderRepository::lock_day`.

use chrono::NaiveDate;

const COUNTER_WIDTH: usize = 3;

pub fn date_prefix(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Contador no fim do número, se o número pertence ao dia `prefix`.
pub fn parse_counter(order_number: &str, prefix: &str) -> Option<u32> {
    let counter = order_number.strip_prefix(prefix)?;
    if counter.len() < COUNTER_WIDTH || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    counter.parse().ok()
}

pub fn format_order_number(prefix: &str, counter: u32) -> String {
    format!("{prefix}{counter:0width$}", width = COUNTER_WIDTH)
}

/// Próximo número a partir do maior número já usado no dia.
/// Sem número anterior, ou com um número ilegível, recomeça do 1.
pub fn next_order_number(prefix: &str, last: Option<&str>) -> String {
    let next = match last.map(|n| parse_counter(n, prefix).and_then(|c| c.checked_add(1))) {
        Some(Some(next)) => next,
        Some(None) => {
            tracing::warn!(prefix, last = ?last, "Número de pedido ilegível, reiniciando contador em 1");
            1
        }
        None => 1,
    };
    format_order_number(prefix, next)
}
