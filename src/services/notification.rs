// src/services/notification.rs
//
// Aviso ao staff por WhatsApp (API REST da Twilio). Sempre "best effort":
// o pedido já está gravado quando chegamos aqui, e nenhuma falha daqui
// volta para quem criou o pedido.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::models::order::Order;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub recipients: Vec<String>,
    pub template_sid: Option<String>,
    pub api_base: String,
}

impl WhatsAppConfig {
    pub fn new(account_sid: String, auth_token: String, from: String, recipients: Vec<String>) -> Self {
        Self {
            account_sid,
            auth_token,
            from,
            recipients,
            template_sid: None,
            api_base: TWILIO_API_BASE.to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Completed,
}

/// Conteúdo da mensagem, montado a partir do pedido já gravado.
#[derive(Debug, Clone)]
pub struct OrderNotice {
    pub event: OrderEvent,
    pub order_number: String,
    pub customer_name: String,
    pub location: String,
    pub location_detail: Option<String>,
    pub items_summary: String,
    pub total: Decimal,
    pub complete_link: Option<String>,
}

impl OrderNotice {
    pub fn from_order(order: &Order, event: OrderEvent, complete_link: Option<String>) -> Self {
        let mut items_summary = order
            .items
            .iter()
            .map(|line| format!("{}x {}", line.quantity, line.name))
            .collect::<Vec<_>>()
            .join(", ");
        if let Some(pickup) = order.pickup_time.as_deref() {
            items_summary.push_str(&format!(" (ritiro {pickup})"));
        }

        Self {
            event,
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            location: order.location.clone(),
            location_detail: order.location_detail.clone(),
            items_summary,
            total: order.total,
            complete_link,
        }
    }

    pub fn body(&self) -> String {
        let title = match self.event {
            OrderEvent::Created => "Nuovo ordine",
            OrderEvent::Completed => "Ordine completato",
        };
        let mut lines = vec![
            format!("{title} #{}", self.order_number),
            format!("Location: {}", self.location),
            format!("Cliente: {}", self.customer_name),
        ];
        if let Some(detail) = self.location_detail.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("Dettaglio: {detail}"));
        }
        lines.push(format!("Articoli: {}", self.items_summary));
        lines.push(format!("Totale: € {:.2}", self.total));
        if let Some(link) = &self.complete_link {
            lines.push(format!("Completa: {link}"));
        }
        lines.join("\n")
    }

    /// Variáveis do template aprovado (numeradas como a Twilio espera).
    pub fn template_variables(&self) -> serde_json::Value {
        json!({
            "1": self.location,
            "2": self.customer_name,
            "3": self.location_detail.clone().unwrap_or_else(|| "-".to_string()),
            "4": self.items_summary,
            "5": format!("{:.2}", self.total),
            "6": self.complete_link.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
}

impl NotificationOutcome {
    fn skipped() -> Self {
        Self { success: false, sent: 0, failed: 0 }
    }
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    config: Option<WhatsAppConfig>,
}

impl Notifier {
    pub fn new(config: Option<WhatsAppConfig>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.as_ref().is_some_and(|c| !c.recipients.is_empty())
    }

    /// Envia para todos os destinatários; `success` só se todos receberam.
    pub async fn notify(&self, notice: &OrderNotice) -> NotificationOutcome {
        let Some(config) = self.config.as_ref().filter(|c| !c.recipients.is_empty()) else {
            tracing::warn!(order_number = %notice.order_number, "WhatsApp não configurado, notificação ignorada");
            return NotificationOutcome::skipped();
        };

        let mut outcome = NotificationOutcome { success: true, sent: 0, failed: 0 };
        for recipient in &config.recipients {
            match self.send_one(config, recipient, notice).await {
                Ok(()) => outcome.sent += 1,
                Err(e) => {
                    tracing::error!(
                        order_number = %notice.order_number,
                        recipient = %recipient,
                        "Falha ao enviar WhatsApp: {}", e
                    );
                    outcome.failed += 1;
                    outcome.success = false;
                }
            }
        }
        outcome
    }

    async fn send_one(
        &self,
        config: &WhatsAppConfig,
        recipient: &str,
        notice: &OrderNotice,
    ) -> Result<(), reqwest::Error> {
        let to = whatsapp_address(recipient);
        let from = whatsapp_address(&config.from);

        let mut form: Vec<(&str, String)> = vec![("To", to), ("From", from)];
        match (&config.template_sid, notice.event) {
            (Some(template), OrderEvent::Created) => {
                form.push(("ContentSid", template.clone()));
                form.push(("ContentVariables", notice.template_variables().to_string()));
            }
            _ => form.push(("Body", notice.body())),
        }

        self.client
            .post(config.messages_url())
            .basic_auth(&config.account_sid, Some(&config.auth_token))
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
