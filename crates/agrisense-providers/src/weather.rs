//! OpenWeatherMap current-weather client.

use std::time::Duration;

use agrisense_core::{
  ProviderError,
  provider::{WeatherLookup, WeatherSummary},
};
use reqwest::Client;
use serde::Deserialize;

use crate::transport_error;

const PROVIDER: &str = "openweathermap";

#[derive(Debug, Clone)]
pub struct WeatherConfig {
  pub api_key:  String,
  pub base_url: String,
  pub timeout:  Duration,
}

impl WeatherConfig {
  pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org";

  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key:  api_key.into(),
      base_url: Self::DEFAULT_BASE_URL.to_owned(),
      timeout:  Duration::from_secs(30),
    }
  }
}

#[derive(Clone)]
pub struct WeatherClient {
  client: Client,
  config: WeatherConfig,
}

impl WeatherClient {
  pub fn new(config: WeatherConfig) -> Result<Self, ProviderError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| transport_error(PROVIDER, e))?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/data/2.5/weather", self.config.base_url.trim_end_matches('/'))
  }
}

impl WeatherLookup for WeatherClient {
  /// `GET /data/2.5/weather?q=<city>&units=metric`
  async fn current_weather(&self, city: &str) -> Result<WeatherSummary, ProviderError> {
    let resp = self
      .client
      .get(self.url())
      .query(&[("q", city), ("appid", self.config.api_key.as_str()), ("units", "metric")])
      .send()
      .await
      .map_err(|e| transport_error(PROVIDER, e))?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%city, %status, "weather lookup rejected");
      return Err(ProviderError::Status {
        provider: PROVIDER,
        status:   status.as_u16(),
        message:  "City not found or API error.".to_owned(),
      });
    }

    let body: CurrentWeather = resp
      .json()
      .await
      .map_err(|e| ProviderError::Malformed { provider: PROVIDER, message: e.to_string() })?;
    body.into_summary(city)
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CurrentWeather {
  #[serde(default)]
  weather: Vec<Condition>,
  main:    Readings,
}

#[derive(Debug, Deserialize)]
struct Condition {
  description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
  temp:     f64,
  humidity: u8,
}

impl CurrentWeather {
  fn into_summary(self, city: &str) -> Result<WeatherSummary, ProviderError> {
    let description = self
      .weather
      .into_iter()
      .next()
      .map(|c| c.description)
      .ok_or(ProviderError::Malformed {
        provider: PROVIDER,
        message:  "no weather conditions in response".to_owned(),
      })?;

    Ok(WeatherSummary {
      city: city.to_owned(),
      description,
      temperature: self.main.temp,
      humidity: self.main.humidity,
    })
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
  };
  use serde_json::json;
  use std::collections::HashMap;
  use tokio::net::TcpListener;

  use super::*;

  async fn stub() -> WeatherClient {
    async fn handler(Query(q): Query<HashMap<String, String>>) -> Response {
      if q.get("appid").map(String::as_str) != Some("test-key") || q.get("units").map(String::as_str) != Some("metric") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "cod": 401 }))).into_response();
      }
      match q.get("q").map(String::as_str) {
        Some("Mumbai") => Json(json!({
          "weather": [{ "main": "Haze", "description": "haze" }],
          "main": { "temp": 29.99, "humidity": 79 }
        }))
        .into_response(),
        Some("Nowhere") => Json(json!({ "weather": [], "main": { "temp": 1.0, "humidity": 1 } }))
          .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "cod": "404", "message": "city not found" })))
          .into_response(),
      }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/data/2.5/weather", get(handler));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    WeatherClient::new(WeatherConfig {
      base_url: format!("http://{addr}"),
      ..WeatherConfig::new("test-key")
    })
    .unwrap()
  }

  #[tokio::test]
  async fn known_city() {
    let client = stub().await;
    let summary = client.current_weather("Mumbai").await.unwrap();
    assert_eq!(summary.to_string(), "Weather in Mumbai: haze, Temp: 29.99°C, Humidity: 79%");
  }

  #[tokio::test]
  async fn unknown_city_is_a_provider_error() {
    let client = stub().await;
    let err = client.current_weather("Atlantis").await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), "City not found or API error.");
  }

  #[tokio::test]
  async fn missing_conditions_are_malformed() {
    let client = stub().await;
    let err = client.current_weather("Nowhere").await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed { .. }));
  }

  #[tokio::test]
  async fn unreachable_host_is_a_transport_error() {
    // Bind then drop a listener so the port is very likely closed.
    let port = {
      let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
      l.local_addr().unwrap().port()
    };
    let client = WeatherClient::new(WeatherConfig {
      base_url: format!("http://127.0.0.1:{port}"),
      ..WeatherConfig::new("test-key")
    })
    .unwrap();

    let err = client.current_weather("Mumbai").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport { .. }));
  }
}
