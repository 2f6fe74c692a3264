use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use quickbite_types::domain::bill::Bill;
use quickbite_types::domain::order::{Order, OrderStatus};
use quickbite_types::ports::credentials::CredentialProvider;
use quickbite_types::ports::order_gateway::{GatewayError, OrderSource, OrderStatusUpdater};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const SESSION_HEADER: &str = "x-session-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct QuickBiteClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

#[derive(Clone)]
pub struct QuickBiteClient {
    base: Url,
    client: reqwest::Client,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

/// Non-2xx answer from the backend.
#[derive(thiserror::Error, Debug)]
#[error("{status}: {message}")]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub message: String,
}

/// `{ success, data, count, message }` wrapper used by every endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
        }
    }

    fn into_data(self) -> anyhow::Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => anyhow::bail!("response has no data"),
            (false, _) => anyhow::bail!(
                "request unsuccessful: {}",
                self.message.as_deref().unwrap_or("no message")
            ),
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

async fn decode<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    let status = res.status();
    if !status.is_success() {
        let body: ErrorBody = res.json().await.unwrap_or_default();
        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(ApiStatusError { status, message }.into());
    }
    let envelope: Envelope<T> = res.json().await.context("failed to decode response")?;
    envelope.into_data()
}

impl QuickBiteClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<QuickBiteClientBuilder> {
        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).context("invalid base url")?;
        Ok(QuickBiteClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
            credentials: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(%request_id, "sending request");
        let mut req = req.header(REQUEST_ID_HEADER, request_id);
        if let Some(creds) = &self.credentials {
            if let Some(token) = creds.admin_token() {
                req = req.bearer_auth(token);
            }
            if let Some(session) = creds.session_id() {
                req = req.header(SESSION_HEADER, session);
            }
        }
        req
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_admin_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .authorize(self.client.get(self.url("admin/orders")?))
            .send()
            .await?;
        decode(res).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order> {
        let res = self
            .authorize(self.client.get(self.url(&format!("orders/{id}"))?))
            .send()
            .await?;
        decode(res).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> anyhow::Result<Order> {
        let res = self
            .authorize(self.client.patch(self.url(&format!("orders/{id}/status"))?))
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        decode(res).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_bill(&self, session_id: &str) -> anyhow::Result<Bill> {
        let res = self
            .authorize(self.client.get(self.url(&format!("bill/{session_id}"))?))
            .send()
            .await?;
        decode(res).await
    }
}

impl QuickBiteClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        if header_name == AUTHORIZATION {
            anyhow::bail!("use with_credentials for the authorization header");
        }
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> anyhow::Result<QuickBiteClient> {
        if let Some(client) = self.client {
            return Ok(QuickBiteClient {
                base: self.base,
                client,
                credentials: self.credentials,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(QuickBiteClient {
            base: self.base,
            client,
            credentials: self.credentials,
        })
    }
}

fn gateway_error(err: anyhow::Error) -> GatewayError {
    if let Some(api) = err.downcast_ref::<ApiStatusError>() {
        return match api.status {
            StatusCode::NOT_FOUND => GatewayError::NotFound(api.message.clone()),
            _ => GatewayError::Rejected(api.to_string()),
        };
    }
    if let Some(http) = err.downcast_ref::<reqwest::Error>() {
        if !http.is_decode() {
            return GatewayError::Request(format!("{err:#}"));
        }
    }
    GatewayError::Rejected(format!("{err:#}"))
}

#[async_trait]
impl OrderStatusUpdater for QuickBiteClient {
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), GatewayError> {
        QuickBiteClient::update_order_status(self, order_id, status)
            .await
            .map(|_| ())
            .map_err(gateway_error)
    }
}

#[async_trait]
impl OrderSource for QuickBiteClient {
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError> {
        self.list_admin_orders().await.map_err(gateway_error)
    }

    async fn get_bill(&self, session_id: &str) -> Result<Bill, GatewayError> {
        QuickBiteClient::get_bill(self, session_id)
            .await
            .map_err(gateway_error)
    }
}
