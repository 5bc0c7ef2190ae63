use std::{env, fs};
use chrono_tz::Tz;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::streaks::Thresholds;

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct GeoRef {
    pub name: String,
    pub lat: f64,
    pub long: f64,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Default)]
pub struct OpenWeatherMap {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
pub struct WorldTides {
    pub api_key: Option<String>,
    pub lat: f64,
    pub long: f64,
    pub cache_file: String,
    #[serde(default = "default_cache_days")]
    pub cache_days: i64,
    #[serde(default = "default_length_days")]
    pub length_days: i64,
}

/// Alerts, rain streak and calm morning merged into one calendar file
#[derive(Deserialize)]
pub struct WeatherEvents {
    pub output_file: String,
    pub timezone: Tz,
    pub alert_location: GeoRef,
    pub rain_location: GeoRef,
    pub calm_location: GeoRef,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_weather_events_uids")]
    pub uids: EventUids,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct EventUids {
    pub alerts: String,
    pub rain_streak: String,
    pub calm_morning: String,
}

/// Daily overview with sun and tide times
#[derive(Deserialize)]
pub struct PhotoTimes {
    pub output_file: String,
    pub prodid: String,
    pub timezone: Tz,
    pub location: GeoRef,
    #[serde(default = "default_photo_days")]
    pub days: i64,
}

/// Storm and rain days warnings from hourly data
#[derive(Deserialize)]
pub struct Warnings {
    pub output_file: String,
    pub timezone: Tz,
    pub storm_location: GeoRef,
    pub rain_location: GeoRef,
    #[serde(default = "default_storm_wind_kmh")]
    pub storm_wind_kmh: f64,
    #[serde(default = "default_rain_hour_share")]
    pub rain_hour_share: f64,
    #[serde(default = "default_min_rain_days")]
    pub min_rain_days: usize,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

/// Storm surge warning from current wind and pressure
#[derive(Deserialize)]
pub struct StormSurge {
    pub output_file: String,
    pub timezone: Tz,
    pub location: GeoRef,
    #[serde(default = "default_surge_wind_kmh")]
    pub wind_kmh: f64,
    #[serde(default = "default_surge_pressure_hpa")]
    pub pressure_hpa: f64,
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub open_weather_map: OpenWeatherMap,
    pub world_tides: Option<WorldTides>,
    pub weather_events: Option<WeatherEvents>,
    pub photo_times: Option<PhotoTimes>,
    pub warnings: Option<Warnings>,
    pub storm_surge: Option<StormSurge>,
}

fn default_cache_days() -> i64 { 7 }
fn default_length_days() -> i64 { 28 }
fn default_photo_days() -> i64 { 14 }
fn default_storm_wind_kmh() -> f64 { 100.0 }
fn default_rain_hour_share() -> f64 { 0.5 }
fn default_min_rain_days() -> usize { 3 }
fn default_forecast_days() -> u32 { 7 }
fn default_surge_wind_kmh() -> f64 { 70.0 }
fn default_surge_pressure_hpa() -> f64 { 1000.0 }

fn default_weather_events_uids() -> EventUids {
    EventUids {
        alerts: "wetterwarnung@dk".to_string(),
        rain_streak: "regenserie@rebild".to_string(),
        calm_morning: "calmmorning@rubjerg".to_string(),
    }
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// API keys given in the environment (OPENWEATHERMAP_API_KEY and WORLDTIDES_API_KEY)
/// take precedence over those in the file.
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let mut config = parse_config(&toml)?;

    if let Ok(key) = env::var("OPENWEATHERMAP_API_KEY") {
        config.open_weather_map.api_key = Some(key);
    }
    if let Some(tides) = config.world_tides.as_mut() {
        if let Ok(key) = env::var("WORLDTIDES_API_KEY") {
            tides.api_key = Some(key);
        }
    }

    Ok(config)
}

/// Parses and validates a configuration document
///
/// # Arguments
///
/// * 'toml' - the configuration as a toml string
fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml)?;

    if config.weather_events.is_none() && config.photo_times.is_none()
        && config.warnings.is_none() && config.storm_surge.is_none() {
        return Err(ConfigError::from("no job configured"));
    }
    if let Some(w) = &config.weather_events {
        if w.thresholds.min_streak_days == 0 {
            return Err(ConfigError::from("min_streak_days must be at least 1"));
        }
    }
    if let Some(w) = &config.warnings {
        if !(0.0..=1.0).contains(&w.rain_hour_share) {
            return Err(ConfigError::from("rain_hour_share must be between 0 and 1"));
        }
    }

    for location in locations(&config) {
        check_coordinates(&location.name, location.lat, location.long)?;
    }
    if let Some(t) = &config.world_tides {
        check_coordinates("world_tides", t.lat, t.long)?;
    }

    Ok(config)
}

/// All configured job locations
fn locations(config: &Config) -> Vec<&GeoRef> {
    let mut locations = Vec::new();
    if let Some(w) = &config.weather_events {
        locations.extend([&w.alert_location, &w.rain_location, &w.calm_location]);
    }
    if let Some(p) = &config.photo_times {
        locations.push(&p.location);
    }
    if let Some(w) = &config.warnings {
        locations.extend([&w.storm_location, &w.rain_location]);
    }
    if let Some(s) = &config.storm_surge {
        locations.push(&s.location);
    }

    locations
}

fn check_coordinates(name: &str, lat: f64, long: f64) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&long) {
        return Err(ConfigError(format!("invalid coordinates for {}: {}, {}", name, lat, long)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[general]
log_path = "wettercal.log"
log_level = "info"
log_to_stdout = true

[weather_events]
output_file = "doc/wettereignisse-dk.ics"
timezone = "Europe/Copenhagen"
alert_location = { name = "Rubjerg Knude", lat = 57.4417, long = 9.7543 }
rain_location = { name = "Rebild Baker", lat = 56.8961, long = 9.9260 }
calm_location = { name = "Rubjerg Knude", lat = 57.4417, long = 9.7543 }
"#;

    #[test]
    fn defaults_are_filled_in() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.general.log_level, LevelFilter::Info);
        let w = config.weather_events.unwrap();
        assert_eq!(w.timezone, chrono_tz::Europe::Copenhagen);
        assert_eq!(w.thresholds, Thresholds::default());
        assert_eq!(w.uids.rain_streak, "regenserie@rebild");
        assert!(config.photo_times.is_none());
        assert!(config.open_weather_map.api_key.is_none());
    }

    #[test]
    fn thresholds_can_be_overridden() {
        let toml = format!("{}{}", MINIMAL, r#"
[weather_events.thresholds]
rain_samples_per_day = 3
include_trailing_streak = false
"#);
        let t = parse_config(&toml).unwrap().weather_events.unwrap().thresholds;
        assert_eq!(t.rain_samples_per_day, 3);
        assert_eq!(t.min_streak_days, 3);
        assert!(!t.include_trailing_streak);
    }

    #[test]
    fn config_without_jobs_is_rejected() {
        let toml = r#"
[general]
log_path = "wettercal.log"
log_level = "warn"
log_to_stdout = false
"#;
        assert!(parse_config(toml).is_err());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let toml = MINIMAL.replace("Europe/Copenhagen", "Europe/Atlantis");
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let toml = MINIMAL.replace(
            "calm_location = { name = \"Rubjerg Knude\", lat = 57.4417, long = 9.7543 }",
            "calm_location = { name = \"Rubjerg Knude\", lat = 95.0, long = 9.7543 }");
        let Err(e) = parse_config(&toml) else { panic!("latitude 95 accepted") };
        assert!(e.to_string().contains("Rubjerg Knude"));

        let toml = format!("{}{}", MINIMAL, r#"
[world_tides]
lat = 54.3726
long = 188.6489
cache_file = "tide_cache.json"
"#);
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, MINIMAL).unwrap();
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert!(config.weather_events.is_some());
    }
}
