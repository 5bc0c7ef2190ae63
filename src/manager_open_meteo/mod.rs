use std::time::Duration;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use thiserror::Error;
use ureq::Agent;
use crate::models::open_meteo::HourlyResponse;

#[derive(Error, Debug)]
pub enum OpenMeteoError {
    #[error("OpenMeteoError::OpenMeteo: {0}")]
    OpenMeteo(String),
    #[error("OpenMeteoError::Document: {0}")]
    Document(String),
}
impl From<ureq::Error> for OpenMeteoError {
    fn from(e: ureq::Error) -> Self { OpenMeteoError::OpenMeteo(e.to_string()) }
}
impl From<serde_json::Error> for OpenMeteoError {
    fn from(e: serde_json::Error) -> Self { OpenMeteoError::Document(e.to_string()) }
}
impl From<chrono::ParseError> for OpenMeteoError {
    fn from(e: chrono::ParseError) -> Self { OpenMeteoError::Document(e.to_string()) }
}

/// One hour of forecast, local time of the requested time zone
#[derive(Debug, Clone, PartialEq)]
pub struct HourValues {
    pub time: NaiveDateTime,
    /// Wind speed at 10 m in km/h
    pub wind_speed: f64,
    /// Precipitation in mm
    pub precipitation: f64,
}

/// Struct for fetching hourly wind and precipitation forecasts from Open-Meteo
pub struct OpenMeteo {
    agent: Agent,
}

impl OpenMeteo {
    pub fn new() -> OpenMeteo {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build();

        OpenMeteo { agent: config.into() }
    }

    /// Retrieves hourly wind speed and precipitation with local times in the given time zone
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    /// * 'tz' - time zone the returned times are given in
    /// * 'forecast_days' - number of days to forecast, today included
    pub fn get_hourly(&self, lat: f64, long: f64, tz: Tz, forecast_days: u32) -> Result<Vec<HourValues>, OpenMeteoError> {
        let json = self.agent
            .get("https://api.open-meteo.com/v1/forecast")
            .query("latitude", lat.to_string())
            .query("longitude", long.to_string())
            .query("hourly", "windspeed_10m,precipitation")
            .query("timezone", tz.name())
            .query("forecast_days", forecast_days.to_string())
            .call()?
            .body_mut()
            .read_to_string()?;

        parse_hourly(&json)
    }
}

/// Parses the hourly document, missing values count as zero
///
/// # Arguments
///
/// * 'json' - the Open-Meteo response document
fn parse_hourly(json: &str) -> Result<Vec<HourValues>, OpenMeteoError> {
    let response: HourlyResponse = serde_json::from_str(json)?;
    let hourly = response.hourly;

    if hourly.time.len() != hourly.windspeed_10m.len() || hourly.time.len() != hourly.precipitation.len() {
        return Err(OpenMeteoError::Document("hourly series length mismatch".to_string()));
    }

    let mut result: Vec<HourValues> = Vec::with_capacity(hourly.time.len());
    for (i, t) in hourly.time.iter().enumerate() {
        result.push(HourValues {
            time: NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M")?,
            wind_speed: hourly.windspeed_10m[i].unwrap_or(0.0),
            precipitation: hourly.precipitation[i].unwrap_or(0.0),
        });
    }

    Ok(result)
}
