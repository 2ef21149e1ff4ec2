//! Talking to the alert proxy.

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Serialize;
use std::{fmt, time::Duration};
use url::Url;

use crate::{
    api::{ApiReply, OtpConfirmRequest, OtpRequest},
    email::EmailAddress,
    error::ApiError,
    logging::LoggingMiddleware,
    settings::ApiSettings,
};

/// The two remote operations the subscription flow needs.
///
/// Implementations only report transport failures as errors, including a
/// body that could not be read in full. Any complete HTTP response, error
/// statuses included, is an [`ApiReply`].
#[async_trait]
pub trait AlertApi {
    /// Ask the server to email a fresh code to `email`.
    async fn request_otp(&self, email: &EmailAddress) -> Result<ApiReply, ApiError>;

    /// Submit `otp` as the code for `email`.
    async fn confirm_otp(&self, email: &EmailAddress, otp: &str) -> Result<ApiReply, ApiError>;
}

/// [`AlertApi`] over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpAlertApi {
    client: ClientWithMiddleware,
    request_endpoint: Url,
    confirm_endpoint: Url,
}

impl fmt::Debug for HttpAlertApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAlertApi")
            .field("request_endpoint", &self.request_endpoint)
            .field("confirm_endpoint", &self.confirm_endpoint)
            .finish()
    }
}

impl HttpAlertApi {
    /// Build a client for the endpoints in `settings`.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        let client = ClientBuilder::new(client).with(LoggingMiddleware).build();

        Ok(Self {
            client,
            request_endpoint: settings.otp_request_endpoint.clone(),
            confirm_endpoint: settings.otp_confirm_endpoint.clone(),
        })
    }

    async fn post<T: Serialize + Sync + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<ApiReply, ApiError> {
        let response = self.client.post(url.clone()).json(body).send().await?;
        let status = response.status();

        // A body cut off mid-read is a transport failure, not a malformed reply.
        let bytes = response.bytes().await?;

        Ok(ApiReply::from_bytes(status, &bytes))
    }
}

#[async_trait]
impl AlertApi for HttpAlertApi {
    #[tracing::instrument(skip_all, fields(%email))]
    async fn request_otp(&self, email: &EmailAddress) -> Result<ApiReply, ApiError> {
        self.post(
            &self.request_endpoint,
            &OtpRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    #[tracing::instrument(skip_all, fields(%email))]
    async fn confirm_otp(&self, email: &EmailAddress, otp: &str) -> Result<ApiReply, ApiError> {
        self.post(
            &self.confirm_endpoint,
            &OtpConfirmRequest {
                email: email.to_string(),
                otp: otp.to_string(),
            },
        )
        .await
    }
}
