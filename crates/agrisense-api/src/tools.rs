//! Handlers for the sidebar tools.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/weather` | Body: `{"city":"Pune","email":true}`; defaults to Mumbai; logs an alert on success |
//! | `GET`  | `/advice/crop` | `?season=summer&soil=sandy&irrigation=low` |
//! | `GET`  | `/advice/soil` | `?nitrogen=30&phosphorus=30&potassium=30` |
//! | `GET`  | `/advice/market` | `?crop=Rice` |

use agrisense_core::{
  ProviderError,
  advisory::{SoilReading, crop_advisory_for, market_price, soil_health},
  alert::AlertRecord,
  assistant::Backend,
  notice::Notice,
};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Text shown in a tool widget, with any notices raised on the way.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolReply {
  pub text:    String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub notices: Vec<Notice>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alert:   Option<AlertRecord>,
}

impl ToolReply {
  fn text(text: String) -> Self { Self { text, notices: Vec::new(), alert: None } }
}

// ─── Weather ──────────────────────────────────────────────────────────────────

pub const DEFAULT_CITY: &str = "Mumbai";

#[derive(Debug, Default, Deserialize)]
pub struct WeatherBody {
  pub city:  Option<String>,
  /// Also e-mail the alert to the configured recipient.
  #[serde(default)]
  pub email: bool,
}

/// `POST /weather`
pub async fn weather<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<WeatherBody>,
) -> Json<ToolReply> {
  let city = body
    .city
    .as_deref()
    .map(str::trim)
    .filter(|c| !c.is_empty())
    .unwrap_or(DEFAULT_CITY);

  let reply = match state.assistant.weather(city, body.email).await {
    Ok(outcome) => ToolReply { text: outcome.text, notices: outcome.notices, alert: outcome.alert },
    Err(e) => {
      let notice = match e {
        ProviderError::Unavailable { .. } => Notice::warning(e.to_string()),
        _ => Notice::error(e.to_string()),
      };
      ToolReply { text: e.to_string(), notices: vec![notice], alert: None }
    }
  };
  Json(reply)
}

// ─── Static advisories ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CropParams {
  #[serde(default)]
  pub season:     String,
  #[serde(default)]
  pub soil:       String,
  #[serde(default)]
  pub irrigation: String,
}

/// `GET /advice/crop`
pub async fn crop(Query(params): Query<CropParams>) -> Json<ToolReply> {
  Json(ToolReply::text(crop_advisory_for(&params.season, &params.soil, &params.irrigation)))
}

fn default_nutrient() -> u32 { 30 }

#[derive(Debug, Deserialize)]
pub struct SoilParams {
  #[serde(default = "default_nutrient")]
  pub nitrogen:   u32,
  #[serde(default = "default_nutrient")]
  pub phosphorus: u32,
  #[serde(default = "default_nutrient")]
  pub potassium:  u32,
}

/// `GET /advice/soil`
pub async fn soil(Query(params): Query<SoilParams>) -> Result<Json<ToolReply>, ApiError> {
  let reading = SoilReading::new(params.nitrogen, params.phosphorus, params.potassium)?;
  Ok(Json(ToolReply::text(soil_health(reading).to_string())))
}

#[derive(Debug, Deserialize)]
pub struct MarketParams {
  pub crop: Option<String>,
}

/// `GET /advice/market`
pub async fn market(Query(params): Query<MarketParams>) -> Json<ToolReply> {
  let crop = params.crop.as_deref().map(str::trim).filter(|c| !c.is_empty()).unwrap_or("Rice");
  Json(ToolReply::text(market_price(crop)))
}

#[cfg(test)]
mod tests {
  use agrisense_core::{
    assistant::EMAIL_NOT_CONFIGURED, notice::NoticeLevel, store::HistoryStore,
  };
  use axum::http::StatusCode;

  use super::ToolReply;
  use crate::testing::{TestApp, json_body};

  #[tokio::test]
  async fn weather_success_logs_an_alert() {
    let app = TestApp::new().await;
    let reply: ToolReply = json_body(app.post_json("/api/weather", "{}").await).await;
    assert_eq!(reply.text, "Weather in Mumbai: haze, Temp: 30°C, Humidity: 70%");
    assert!(reply.alert.is_some());
    assert_eq!(app.store.count_alerts().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn weather_email_without_smtp_warns() {
    let app = TestApp::new().await;
    let resp = app.post_json("/api/weather", r#"{"city":"Mumbai","email":true}"#).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let reply: ToolReply = json_body(resp).await;
    assert!(reply.alert.is_some());
    let warning = reply.notices.last().unwrap();
    assert_eq!(warning.level, NoticeLevel::Warning);
    assert_eq!(warning.message, EMAIL_NOT_CONFIGURED);
    assert_eq!(app.store.count_alerts().await.unwrap(), 1);

    // Without the flag, mail is never mentioned.
    let reply: ToolReply = json_body(app.post_json("/api/weather", r#"{"city":"Mumbai"}"#).await).await;
    assert!(reply.notices.iter().all(|n| n.message != EMAIL_NOT_CONFIGURED));
  }

  #[tokio::test]
  async fn weather_failure_logs_nothing() {
    let app = TestApp::new().await;
    let resp = app.post_json("/api/weather", r#"{"city":"Atlantis"}"#).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let reply: ToolReply = json_body(resp).await;
    assert_eq!(reply.text, "City not found or API error.");
    assert_eq!(reply.notices[0].level, NoticeLevel::Error);
    assert!(reply.alert.is_none());
    assert_eq!(app.store.count_alerts().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn weather_without_key_degrades() {
    let app = TestApp::without_weather().await;
    let reply: ToolReply = json_body(app.post_json("/api/weather", r#"{"city":"Pune"}"#).await).await;
    assert!(reply.text.contains("unavailable"), "{}", reply.text);
    assert_eq!(reply.notices[0].level, NoticeLevel::Warning);
  }

  #[tokio::test]
  async fn crop_advice() {
    let app = TestApp::new().await;
    let reply: ToolReply =
      json_body(app.get("/api/advice/crop?season=Summer&soil=Sandy&irrigation=Low").await).await;
    assert!(reply.text.contains("Cotton, Groundnut"));
    assert!(reply.text.contains("Aphids, Bollworms"));

    let reply: ToolReply =
      json_body(app.get("/api/advice/crop?season=Summer&soil=Clayey&irrigation=Low").await).await;
    assert_eq!(reply.text, "General recommendation: Consult local expert.");
  }

  #[tokio::test]
  async fn soil_advice_and_range_check() {
    let app = TestApp::new().await;
    let reply: ToolReply =
      json_body(app.get("/api/advice/soil?nitrogen=10&phosphorus=50&potassium=50").await).await;
    assert!(reply.text.starts_with("Soil Health: Needs Improvement"));

    let resp = app.get("/api/advice/soil?nitrogen=150").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn market_price_defaults_to_rice() {
    let app = TestApp::new().await;
    let reply: ToolReply = json_body(app.get("/api/advice/market").await).await;
    assert!(reply.text.starts_with("Market Price for Rice:"));
  }
}
