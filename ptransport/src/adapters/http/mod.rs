//! REST + WebSocket transport for a hosted support-chat backend.
//!
//! Endpoints, relative to `base_url`:
//! - `GET  sessions/{id}/messages?limit=&before=` history page
//! - `POST sessions/{id}/messages` persist a message
//! - `POST sessions/{id}/typing` typing signal
//!
//! Push frames arrive on `{push_url}/sessions/{id}/events` as JSON text frames.

mod push;
mod serde_api;
mod tests;

use std::sync::Arc;
use std::time::Duration;

use pcommon::SessionId;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::{
    ChatTransport, HistoryQuery, Message, MessagePage, OutgoingMessage, PushGate, PushHandler,
    SecretString, Subscription, TransportError, TransportFuture,
};

use serde_api::{
    ApiHistoryResponse, ApiMessage, ApiSendRequest, ApiTypingRequest, extract_error_message,
};

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub push_url: String,
    pub token: Option<SecretString>,
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>, push_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            push_url: push_url.into(),
            token: None,
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_token(mut self, token: impl Into<SecretString>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(client: Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn endpoint(&self, session_id: &SessionId, path: &str) -> String {
        join_url(
            &self.config.base_url,
            &format!("sessions/{session_id}/{path}"),
        )
    }

    fn push_endpoint(&self, session_id: &SessionId) -> String {
        join_url(&self.config.push_url, &format!("sessions/{session_id}/events"))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.timeout(self.config.request_timeout);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> TransportError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("chat backend request failed with status {status}"));

        error_for_status(status, message)
    }
}

impl ChatTransport for HttpTransport {
    fn fetch_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
        query: HistoryQuery,
    ) -> TransportFuture<'a, Result<MessagePage, TransportError>> {
        Box::pin(async move {
            let mut params = vec![("limit", query.limit.to_string())];
            if let Some(before) = &query.before {
                params.push(("before", before.to_string()));
            }

            let builder = self
                .client
                .get(self.endpoint(session_id, "messages"))
                .query(&params);
            let parsed: ApiHistoryResponse = self
                .execute(builder)
                .await?
                .json()
                .await
                .map_err(|err| TransportError::protocol(err.to_string()))?;

            Ok(MessagePage {
                messages: parsed
                    .messages
                    .into_iter()
                    .map(|message| message.into_message(session_id))
                    .collect(),
                has_more: parsed.has_more,
            })
        })
    }

    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        message: OutgoingMessage,
    ) -> TransportFuture<'a, Result<Message, TransportError>> {
        Box::pin(async move {
            message.validate()?;

            let builder = self
                .client
                .post(self.endpoint(session_id, "messages"))
                .json(&ApiSendRequest::from(&message));
            let parsed: ApiMessage = self
                .execute(builder)
                .await?
                .json()
                .await
                .map_err(|err| TransportError::protocol(err.to_string()))?;

            Ok(parsed.into_message(session_id))
        })
    }

    fn send_typing_event<'a>(
        &'a self,
        session_id: &'a SessionId,
        is_typing: bool,
    ) -> TransportFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let builder = self
                .client
                .post(self.endpoint(session_id, "typing"))
                .json(&ApiTypingRequest { is_typing });
            self.execute(builder).await?;
            Ok(())
        })
    }

    fn subscribe(
        &self,
        session_id: &SessionId,
        handler: Arc<dyn PushHandler>,
    ) -> Result<Subscription, TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| TransportError::other("push channel requires a tokio runtime"))?;

        let gate = PushGate::new(handler);
        let task = runtime.spawn(push::run_push_channel(
            self.push_endpoint(session_id),
            self.config.token.clone(),
            session_id.clone(),
            gate.clone(),
        ));

        Ok(Subscription::new(session_id.clone(), move || {
            gate.close();
            task.abort();
        }))
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

pub(crate) fn error_for_status(status: StatusCode, message: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => TransportError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            TransportError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            TransportError::validation(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            TransportError::unavailable(message)
        }
        _ => TransportError::network(message),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err.to_string())
    } else {
        TransportError::network(err.to_string())
    }
}
