// src/client/http.rs
//
// Cliente HTTP da API (painel do staff e app do hóspede).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::{cart::CreateOrderRequest, ClientError, OrderFeed, Tab};
use crate::{
    middleware::auth::SESSION_COOKIE,
    models::{
        auth::AdminProfile,
        catalog::{Category, Product},
        order::{Order, OrderStatus, OrderSummary},
    },
    services::eligibility::Decision,
};

// Envelope `{ success, data | message }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    message: Option<String>,
}

/// Extrai o JWT do `Set-Cookie` devolvido pelo login.
fn token_from_set_cookie<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    values
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(&prefix).map(str::to_string))
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_default(),
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("resposta sem 'data'".into()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        Self::handle_response(response).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ClientError> {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.client.request(method, self.url(path)).json(body);
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }

    // --- Sessão do staff ---

    /// Guarda o token do cookie de sessão para as próximas chamadas.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<AdminProfile, ClientError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .client
            .post(self.url("/api/admin/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let token = token_from_set_cookie(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let profile: AdminProfile = Self::handle_response(response).await?;

        self.token = Some(token.ok_or_else(|| ClientError::Decode("login sem cookie de sessão".into()))?);
        Ok(profile)
    }

    pub async fn me(&self) -> Result<AdminProfile, ClientError> {
        self.get("/api/admin/auth/me").await
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    // --- Hóspede ---

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.get("/api/categories").await
    }

    pub async fn products(&self, category: Option<&str>) -> Result<Vec<Product>, ClientError> {
        let response = self.products_request(category).send().await?;
        Self::handle_response(response).await
    }

    fn products_request(&self, category: Option<&str>) -> reqwest::RequestBuilder {
        let mut query = vec![("available", "true")];
        if let Some(c) = category {
            query.push(("category", c));
        }
        self.authorize(self.client.get(self.url("/api/products")).query(&query))
    }

    pub async fn checkout_decision(
        &self,
        product_ids: &[Uuid],
        pickup_time: Option<&str>,
    ) -> Result<Decision, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct EligibilityRequest<'a> {
            product_ids: &'a [Uuid],
            pickup_time: Option<&'a str>,
        }

        self.send_json(
            reqwest::Method::POST,
            "/api/orders/eligibility",
            &EligibilityRequest { product_ids, pickup_time },
        )
        .await
    }

    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderSummary, ClientError> {
        self.send_json(reqwest::Method::POST, "/api/orders", request).await
    }

    pub async fn order_status(&self, id: Uuid) -> Result<OrderSummary, ClientError> {
        self.get(&format!("/api/orders/{id}")).await
    }
}

#[async_trait]
impl OrderFeed for ApiClient {
    async fn fetch_orders(&self, tab: Tab) -> Result<Vec<Order>, ClientError> {
        self.get_with_query("/api/admin/orders", &[("status", tab.to_string())]).await
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ClientError> {
        #[derive(Serialize)]
        struct StatusRequest {
            status: OrderStatus,
        }

        self.send_json(
            reqwest::Method::PUT,
            &format!("/api/admin/orders/{id}/status"),
            &StatusRequest { status },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_is_read_from_set_cookie() {
        let headers = [
            "theme=dark; Path=/",
            "admin_token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800",
        ];
        assert_eq!(token_from_set_cookie(headers.into_iter()).as_deref(), Some("abc.def.ghi"));
        assert_eq!(token_from_set_cookie(["admin_token=; Max-Age=0"].into_iter()), None);
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/").expect("client");
        assert_eq!(client.url("/api/orders"), "http://localhost:3000/api/orders");
        assert!(client.token().is_none());
    }

    #[test]
    fn category_filter_is_url_encoded() {
        let client = ApiClient::new("http://localhost:3000").expect("client");
        let request = client.products_request(Some("light lunch&co")).build().expect("request");
        assert_eq!(request.url().query(), Some("available=true&category=light+lunch%26co"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:9").expect("client");
        assert!(matches!(client.fetch_orders(Tab::All).await, Err(ClientError::Transport(_))));
    }
}
