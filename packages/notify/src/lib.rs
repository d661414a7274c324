#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! SMS notifications through the Twilio Messages API.

use apartment_watch_source::notify::Notifier;
use async_trait::async_trait;

/// Base URL of the Twilio REST API.
pub const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";

/// Errors from sending a message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Twilio rejected the message.
    #[error("Twilio returned {status}: {body}")]
    Rejected {
        /// HTTP status of the response.
        status: reqwest::StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Account credentials and phone numbers for Twilio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioOptions {
    /// Account SID (also the basic-auth user).
    pub account_sid: String,
    /// Auth token (basic-auth password).
    pub auth_token: String,
    /// Sending phone number.
    pub from_number: String,
    /// Receiving phone number.
    pub to_number: String,
}

/// [`Notifier`] that sends each message as an SMS.
#[derive(Debug, Clone)]
pub struct TwilioNotifier {
    client: reqwest::Client,
    options: TwilioOptions,
    api_url: String,
}

impl TwilioNotifier {
    /// Creates a notifier using `options`.
    #[must_use]
    pub fn new(client: reqwest::Client, options: TwilioOptions) -> Self {
        Self {
            client,
            options,
            api_url: TWILIO_API_URL.to_owned(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        api_url.clone_into(&mut self.api_url);
        self
    }

    /// Returns the Messages endpoint for the configured account.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_url.trim_end_matches('/'),
            self.options.account_sid
        )
    }

    /// Sends `text` as one SMS.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the request fails or Twilio rejects it.
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&[
                ("From", self.options.from_number.as_str()),
                ("To", self.options.to_number.as_str()),
                ("Body", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn notify(&self, text: &str) {
        if let Err(e) = self.send(text).await {
            log::warn!("SMS notification failed: {e}");
        }
    }
}
