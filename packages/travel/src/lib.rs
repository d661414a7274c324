#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transit travel-time lookup via the Google Directions API.
//!
//! [`DirectionsResolver`] implements
//! [`TravelTimeResolver`](apartment_watch_source::travel::TravelTimeResolver):
//! one request per origin address, in transit mode, reading the duration of
//! the first leg of the first route. Any failure is logged and reported as
//! an unknown travel time.
//!
//! See <https://developers.google.com/maps/documentation/directions/get-directions>

use apartment_watch_source::travel::TravelTimeResolver;
use async_trait::async_trait;
use thiserror::Error;

/// Default Directions API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Errors from a Directions lookup.
#[derive(Debug, Error)]
pub enum TravelError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-`OK` status.
    #[error("Directions API status: {status}")]
    Status {
        /// The `status` field of the response.
        status: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Travel-time resolver backed by the Google Directions API.
#[derive(Debug, Clone)]
pub struct DirectionsResolver {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl DirectionsResolver {
    /// Creates a resolver for `endpoint` authenticated with `api_key`.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    /// Looks up the transit duration from `origin` to `destination`.
    ///
    /// Returns `Ok(None)` when the API finds no route.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError`] if the request fails or the response is not
    /// understood.
    pub async fn lookup(&self, origin: &str, destination: &str) -> Result<Option<u32>, TravelError> {
        let body: serde_json::Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", "transit"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(&body)
    }
}

#[async_trait]
impl TravelTimeResolver for DirectionsResolver {
    async fn duration(&self, origin: &str, destination: &str) -> Option<u32> {
        match self.lookup(origin, destination).await {
            Ok(minutes) => minutes,
            Err(e) => {
                log::warn!("Travel time lookup failed for '{origin}': {e}");
                None
            }
        }
    }
}

/// Parses a Directions JSON response into whole minutes (rounded to the
/// nearest minute).
fn parse_response(body: &serde_json::Value) -> Result<Option<u32>, TravelError> {
    let status = body["status"].as_str().unwrap_or("OK");
    match status {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(None),
        other => {
            return Err(TravelError::Status {
                status: other.to_string(),
            });
        }
    }

    let Some(leg) = body["routes"]
        .as_array()
        .and_then(|routes| routes.first())
        .and_then(|route| route["legs"].as_array())
        .and_then(|legs| legs.first())
    else {
        return Ok(None);
    };

    let seconds = leg["duration"]["value"]
        .as_u64()
        .ok_or_else(|| TravelError::Parse {
            message: "Missing legs[0].duration.value in Directions response".to_string(),
        })?;

    let minutes = u32::try_from((seconds + 30) / 60).map_err(|_| TravelError::Parse {
        message: format!("Duration out of range: {seconds}s"),
    })?;

    Ok(Some(minutes))
}
