use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::api::contract::{
    non_blank, AckData, ApiRequest, Envelope, LoginData, RosterReply, StatusData,
};
use crate::api::TimeclockApi;
use crate::error::ClientError;
use crate::models::{AttendanceStatus, ClockEvent};

/// reqwest client for the hosted script endpoint.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    api_url: String,
    roster_url: String,
}

impl HttpApi {
    pub fn new(api_url: &str, roster_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::models::user_agent())
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            roster_url: roster_url.to_string(),
        })
    }

    // Body goes out as plain text with no Content-Type so the hosted endpoint
    // never sees a CORS preflight
    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &ApiRequest<'_>,
    ) -> Result<Envelope<T>, ClientError> {
        debug!("POST action={} to {}", request.action(), url);

        let body = serde_json::to_string(request)?;
        let response = self.client.post(url).body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!("Network error {}", status.as_u16())));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl TimeclockApi for HttpApi {
    async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ClientError> {
        let envelope: Envelope<LoginData> = self
            .post(&self.api_url, &ApiRequest::Login { username, password })
            .await?;

        if !envelope.ok {
            return Err(ClientError::Application(
                non_blank(envelope.error).unwrap_or_else(|| "Login failed".to_string()),
            ));
        }

        let data = envelope.data.unwrap_or_default();
        if !data.ok {
            return Err(ClientError::Application(
                non_blank(data.error).unwrap_or_else(|| "Invalid username or password".to_string()),
            ));
        }

        Ok(non_blank(data.employee_name))
    }

    async fn status(&self, employee_name: &str) -> Result<AttendanceStatus, ClientError> {
        let envelope: Envelope<StatusData> = self
            .post(&self.api_url, &ApiRequest::Status { employee_name })
            .await?;

        Ok(envelope.into_data()?.unwrap_or_default().into_status())
    }

    async fn clock(&self, event: &ClockEvent) -> Result<(), ClientError> {
        let envelope: Envelope<AckData> = self.post(&self.api_url, &ApiRequest::clock(event)).await?;

        envelope.into_data()?.unwrap_or_default().check()
    }

    async fn employees(&self) -> Result<Vec<String>, ClientError> {
        debug!("GET roster from {}", self.roster_url);

        let response = self
            .client
            .get(&self.roster_url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!("Network error {}", status.as_u16())));
        }

        let reply: RosterReply = response.json().await?;
        Ok(reply.names())
    }
}
