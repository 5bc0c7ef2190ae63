use std::time::Duration;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use ureq::Agent;
use crate::models::owm::{Current, Forecast, ForecastRecord, OneCall};
use crate::streaks::ForecastSample;

const OWM_DOMAIN: &str = "https://api.openweathermap.org";

#[derive(Error, Debug)]
pub enum OwmError {
    #[error("OwmError::OWM: {0}")]
    OWM(String),
    #[error("OwmError::Document: {0}")]
    Document(String),
}
impl From<ureq::Error> for OwmError {
    fn from(e: ureq::Error) -> Self {
        OwmError::OWM(e.to_string())
    }
}
impl From<serde_json::Error> for OwmError {
    fn from(e: serde_json::Error) -> Self {
        OwmError::Document(e.to_string())
    }
}

/// Current wind and pressure at a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentWeather {
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Air pressure in hPa
    pub pressure: f64,
}

/// Struct for fetching forecasts, alerts and current weather from OpenWeatherMap
pub struct OWM {
    agent: Agent,
    api_key: String,
    domain: String,
}

impl OWM {
    /// Returns an OWM struct ready for requests against OpenWeatherMap
    ///
    /// # Arguments
    ///
    /// * 'api_key' - OpenWeatherMap api key
    pub fn new(api_key: String) -> OWM {
        Self::with_domain(api_key, OWM_DOMAIN)
    }

    fn with_domain(api_key: String, domain: &str) -> OWM {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build();

        let agent = config.into();

        Self { agent, api_key, domain: domain.to_string() }
    }

    /// Retrieves the 5 day / 3 hour forecast for a location and returns it as
    /// forecast samples localized to the given time zone.
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude for the point to get forecasts for
    /// * 'long' - longitude for the point to get forecasts for
    /// * 'tz' - time zone of the location
    pub fn get_forecast(&self, lat: f64, long: f64, tz: Tz) -> Result<Vec<ForecastSample>, OwmError> {
        let json = self.get("/data/2.5/forecast", lat, long, None)?;
        let forecast: Forecast = serde_json::from_str(&json)?;

        forecast.list.into_iter()
            .map(|r| to_sample(r, tz))
            .collect()
    }

    /// Retrieves active weather alerts for a location, each as "event: description"
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    pub fn get_alerts(&self, lat: f64, long: f64) -> Result<Vec<String>, OwmError> {
        let json = self.get("/data/3.0/onecall", lat, long, Some("current,minutely,hourly,daily"))?;
        let one_call: OneCall = serde_json::from_str(&json)?;

        Ok(one_call.alerts.into_iter()
            .map(|a| format!("{}: {}",
                             a.event.unwrap_or("Warnung".to_string()),
                             a.description.unwrap_or_default()))
            .collect())
    }

    /// Retrieves current wind and pressure for a location
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    pub fn get_current(&self, lat: f64, long: f64) -> Result<CurrentWeather, OwmError> {
        let json = self.get("/data/2.5/weather", lat, long, None)?;
        let current: Current = serde_json::from_str(&json)?;

        Ok(CurrentWeather {
            wind_speed: current.wind.map_or(0.0, |w| w.speed),
            pressure: current.main.and_then(|m| m.pressure).unwrap_or(1013.0),
        })
    }

    fn get(&self, path: &str, lat: f64, long: f64, exclude: Option<&str>) -> Result<String, OwmError> {
        let mut request = self.agent
            .get(format!("{}{}", self.domain, path))
            .query("lat", lat.to_string())
            .query("lon", long.to_string())
            .query("appid", &self.api_key)
            .query("units", "metric");
        if let Some(exclude) = exclude {
            request = request.query("exclude", exclude);
        }

        let json = request
            .call()?
            .body_mut()
            .read_to_string()?;

        Ok(json)
    }
}

/// Converts a forecast record, absent rain or wind counts as zero
///
/// # Arguments
///
/// * 'record' - the record from the forecast document
/// * 'tz' - time zone to localize the timestamp to
fn to_sample(record: ForecastRecord, tz: Tz) -> Result<ForecastSample, OwmError> {
    let timestamp = DateTime::<Utc>::from_timestamp(record.dt, 0)
        .ok_or(OwmError::Document(format!("timestamp out of range: {}", record.dt)))?
        .with_timezone(&tz);

    Ok(ForecastSample {
        timestamp,
        rain_amount: record.rain.and_then(|r| r.three_hours).unwrap_or(0.0),
        wind_speed: record.wind.map_or(0.0, |w| w.speed),
    })
}
