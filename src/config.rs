// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{i18n::I18nStore, time::BusinessClock},
    db::{AdminRepository, CatalogRepository, OrderRepository},
    services::{
        auth::{AuthService, TokenService},
        catalog_service::CatalogService,
        notification::{Notifier, WhatsAppConfig},
        order_service::OrderService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEZONE: &str = "Europe/Rome";

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub timezone: Tz,
    pub public_base_url: String,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub whatsapp: Option<WhatsAppConfig>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Mesma leitura de `from_env`, com a fonte das variáveis injetada.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let tz_name = lookup("BUSINESS_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(tz_name.trim())
            .map_err(|e| anyhow::anyhow!("BUSINESS_TIMEZONE inválido '{}': {}", tz_name, e))?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{bind_addr}"));
        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).with_context(|| format!("COOKIE_SECURE inválido: {raw}"))?,
            None => true,
        };
        let cors_origins = lookup("CORS_ORIGINS").map(|raw| split_list(&raw)).unwrap_or_default();

        // Bloco do WhatsApp: incompleto = notificações desligadas
        let whatsapp = match (
            lookup("TWILIO_ACCOUNT_SID"),
            lookup("TWILIO_AUTH_TOKEN"),
            lookup("TWILIO_WHATSAPP_FROM"),
            lookup("STAFF_WHATSAPP_NUMBERS").map(|raw| split_list(&raw)),
        ) {
            (Some(sid), Some(token), Some(from), Some(recipients)) if !recipients.is_empty() => {
                let mut config = WhatsAppConfig::new(sid, token, from, recipients);
                config.template_sid = lookup("TWILIO_TEMPLATE_SID").filter(|s| !s.trim().is_empty());
                Some(config)
            }
            _ => {
                tracing::warn!("Configuração do WhatsApp incompleta: o staff não será notificado");
                None
            }
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            timezone,
            public_base_url,
            cookie_secure,
            cors_origins,
            whatsapp,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub i18n_store: I18nStore,
    pub clock: BusinessClock,
    pub auth_service: AuthService,
    pub order_service: OrderService,
    pub catalog_service: CatalogService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(db_pool, settings)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, settings: Settings) -> anyhow::Result<Self> {
        let clock = BusinessClock::new(settings.timezone);
        let tokens = TokenService::new(settings.jwt_secret.clone());
        let notifier = Notifier::new(settings.whatsapp.clone())?;

        let admin_repo = AdminRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());

        let auth_service = AuthService::new(admin_repo, tokens.clone());
        let order_service = OrderService::new(
            db_pool.clone(),
            order_repo,
            catalog_repo.clone(),
            notifier,
            tokens,
            clock,
            settings.public_base_url.clone(),
        );
        let catalog_service = CatalogService::new(catalog_repo, clock);

        Ok(Self {
            db_pool,
            settings,
            i18n_store: I18nStore::new(),
            clock,
            auth_service,
            order_service,
            catalog_service,
        })
    }
}
