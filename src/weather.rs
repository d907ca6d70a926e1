//! Weather lookup against the US National Weather Service points API.
//!
//! A thin boundary wrapper: validates a "lat,lon" location, performs one GET
//! with the shared client and hands back the parsed JSON body untouched.

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const POINTS_ENDPOINT: &str = "https://api.weather.gov/points";

/// api.weather.gov rejects requests without a User-Agent
const USER_AGENT: &str = concat!("report-kit/", env!("CARGO_PKG_VERSION"));

/// Global HTTP client for weather lookups
pub static WEATHER_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(2)
        .build()
        .expect("Failed to create weather HTTP client")
});

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherError {
    #[error("Invalid location '{location}': expected \"latitude,longitude\"")]
    InvalidLocation { location: String },

    #[error("Weather request failed: {message}")]
    Request { message: String },
}

/// URL of the points resource for `location` ("39.7456,-97.0892")
pub fn points_url(location: &str) -> Result<String, WeatherError> {
    let invalid = || WeatherError::InvalidLocation {
        location: location.to_string(),
    };

    let (lat, lon) = location.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }

    Ok(format!("{}/{},{}", POINTS_ENDPOINT, lat, lon))
}

/// Fetch the points metadata for `location`
pub async fn fetch_point(location: &str) -> Result<serde_json::Value, WeatherError> {
    let url = points_url(location)?;
    tracing::info!("[Weather] GET {}", url);

    let response = WEATHER_CLIENT
        .get(&url)
        .send()
        .await
        .map_err(|e| WeatherError::Request {
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("[Weather] {} returned {}", url, status);
        return Err(WeatherError::Request {
            message: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| WeatherError::Request {
            message: format!("Invalid JSON response: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_url() {
        assert_eq!(
            points_url("39.7456,-97.0892").unwrap(),
            "https://api.weather.gov/points/39.7456,-97.0892"
        );
        assert_eq!(
            points_url(" -0.9, -89.6 ").unwrap(),
            "https://api.weather.gov/points/-0.9,-89.6"
        );
    }

    #[test]
    fn test_invalid_locations() {
        for bad in ["", "Quito", "91,0", "0,181", "1;2", "a,b"] {
            assert!(
                matches!(points_url(bad), Err(WeatherError::InvalidLocation { .. })),
                "{} should be rejected",
                bad
            );
        }
    }
}
