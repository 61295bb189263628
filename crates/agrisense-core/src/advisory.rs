//! Static advisory lookups: crop recommendations, soil health and market
//! price.
//!
//! These are pure functions over small fixed tables. The tables are
//! placeholders and their fallbacks are part of the contract: an unmapped
//! combination yields the generic recommendation rather than an error, and
//! the market price is a constant.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Crop advisory ───────────────────────────────────────────────────────────

pub const GENERAL_RECOMMENDATION: &str = "General recommendation: Consult local expert.";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Season {
  Summer,
  Winter,
  Monsoon,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SoilType {
  Sandy,
  Loamy,
  Clayey,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Irrigation {
  Low,
  Moderate,
  High,
}

/// One row of the recommendation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRecommendation {
  pub crops:      &'static str,
  pub pests:      &'static str,
  pub irrigation: &'static str,
}

const fn rec(
  crops: &'static str,
  pests: &'static str,
  irrigation: &'static str,
) -> CropRecommendation {
  CropRecommendation { crops, pests, irrigation }
}

/// Table row for `(season, soil)`, if one exists. Clayey soil has none.
pub fn recommendation(season: Season, soil: SoilType) -> Option<CropRecommendation> {
  use Season::*;
  use SoilType::*;

  let row = match (season, soil) {
    (Summer, Sandy) => rec("Cotton, Groundnut", "Aphids, Bollworms", "Moderate"),
    (Summer, Loamy) => rec("Maize, Rice", "Stem Borers", "High"),
    (Winter, Sandy) => rec("Wheat, Gram", "Rust, Aphids", "Low"),
    (Winter, Loamy) => rec("Potato, Mustard", "Blights", "Moderate"),
    (Monsoon, Sandy) => rec("Millets, Pulses", "Leafhoppers", "Minimal"),
    (Monsoon, Loamy) => rec("Paddy, Sugarcane", "Sheath Blight", "High"),
    (_, Clayey) => return None,
  };
  Some(row)
}

/// Crop advice for typed inputs.
pub fn crop_advisory(season: Season, soil: SoilType, irrigation: Irrigation) -> String {
  advisory_text(season, soil, &irrigation.to_string())
}

/// Crop advice for free-text inputs, as they arrive from a form.
///
/// Only season and soil select the table row; both match case-insensitively
/// and anything unknown falls back to [`GENERAL_RECOMMENDATION`]. The
/// irrigation text is echoed back lowercased, whatever it says.
pub fn crop_advisory_for(season: &str, soil: &str, irrigation: &str) -> String {
  match (Season::from_str(season.trim()), SoilType::from_str(soil.trim())) {
    (Ok(season), Ok(soil)) => advisory_text(season, soil, &irrigation.trim().to_lowercase()),
    _ => GENERAL_RECOMMENDATION.to_owned(),
  }
}

fn advisory_text(season: Season, soil: SoilType, irrigation: &str) -> String {
  match recommendation(season, soil) {
    Some(row) => format!(
      "Crops: {}\nPests: {}\nIrrigation: {} (adjust based on {irrigation})",
      row.crops, row.pests, row.irrigation,
    ),
    None => GENERAL_RECOMMENDATION.to_owned(),
  }
}

// ─── Soil health ─────────────────────────────────────────────────────────────

/// Nutrient threshold: each value must be strictly above this to be healthy.
pub const NUTRIENT_THRESHOLD: u8 = 20;

/// Nitrogen / phosphorus / potassium percentages, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilReading {
  nitrogen:   u8,
  phosphorus: u8,
  potassium:  u8,
}

impl SoilReading {
  pub fn new(nitrogen: u32, phosphorus: u32, potassium: u32) -> Result<Self> {
    Ok(Self {
      nitrogen:   percent("nitrogen", nitrogen)?,
      phosphorus: percent("phosphorus", phosphorus)?,
      potassium:  percent("potassium", potassium)?,
    })
  }

  pub fn nitrogen(&self) -> u8 { self.nitrogen }

  pub fn phosphorus(&self) -> u8 { self.phosphorus }

  pub fn potassium(&self) -> u8 { self.potassium }
}

fn percent(field: &'static str, value: u32) -> Result<u8> {
  u8::try_from(value)
    .ok()
    .filter(|v| *v <= 100)
    .ok_or(Error::OutOfRange { field, value })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilHealth {
  Healthy,
  NeedsImprovement,
}

impl SoilHealth {
  pub fn label(self) -> &'static str {
    match self {
      Self::Healthy => "Healthy",
      Self::NeedsImprovement => "Needs Improvement",
    }
  }

  pub fn advice(self) -> &'static str {
    match self {
      Self::Healthy => "Maintain current practices",
      Self::NeedsImprovement => "Add organic manure",
    }
  }
}

/// The result of [`soil_health`]; its `Display` form is the advisory text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilReport {
  pub reading: SoilReading,
  pub health:  SoilHealth,
}

impl fmt::Display for SoilReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Soil Health: {}\nNitrogen: {}%, Phosphorus: {}%, Potassium: {}%\nAdvice: {}",
      self.health.label(),
      self.reading.nitrogen,
      self.reading.phosphorus,
      self.reading.potassium,
      self.health.advice(),
    )
  }
}

/// Healthy iff every nutrient is strictly above [`NUTRIENT_THRESHOLD`].
pub fn soil_health(reading: SoilReading) -> SoilReport {
  let healthy = [reading.nitrogen, reading.phosphorus, reading.potassium]
    .iter()
    .all(|v| *v > NUTRIENT_THRESHOLD);
  let health = if healthy { SoilHealth::Healthy } else { SoilHealth::NeedsImprovement };
  SoilReport { reading, health }
}

// ─── Market price ────────────────────────────────────────────────────────────

/// Placeholder price quote. Not backed by any market data.
pub fn market_price(crop: &str) -> String {
  format!("Market Price for {crop}: Approx. ₹50/kg (Check local markets for real-time data)")
}
