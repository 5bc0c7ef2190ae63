use chrono::{NaiveDate, TimeDelta};
use crate::manager_open_meteo::HourValues;
use crate::manager_owm::CurrentWeather;

/// Conversion factor from m/s to km/h
const MS_TO_KMH: f64 = 3.6;

/// Returns the max hourly wind speed of the given date if it reaches the storm threshold
///
/// # Arguments
///
/// * 'hours' - hourly forecast in local time
/// * 'date' - the date to check, normally tomorrow
/// * 'storm_wind_kmh' - storm threshold in km/h
pub fn storm_on_date(hours: &[HourValues], date: NaiveDate, storm_wind_kmh: f64) -> Option<f64> {
    let max_wind = hours.iter()
        .filter(|h| h.time.date() == date)
        .map(|h| h.wind_speed)
        .fold(0.0, f64::max);

    if max_wind >= storm_wind_kmh { Some(max_wind) } else { None }
}

/// Counts consecutive days from `first_day` where the share of hours with precipitation
/// reaches `rain_hour_share`. Counting stops at the first day below the share or without data.
///
/// # Arguments
///
/// * 'hours' - hourly forecast in local time
/// * 'first_day' - the day to start counting from, normally today
/// * 'max_days' - max number of days to look at
/// * 'rain_hour_share' - min share (0-1) of rainy hours for a rain day
pub fn consecutive_rain_days(hours: &[HourValues], first_day: NaiveDate, max_days: u32, rain_hour_share: f64) -> usize {
    let mut rain_days = 0;
    for offset in 0..max_days {
        let day = first_day + TimeDelta::days(offset as i64);
        let day_hours = hours.iter().filter(|h| h.time.date() == day).collect::<Vec<&HourValues>>();
        if day_hours.is_empty() {
            break;
        }
        let rainy = day_hours.iter().filter(|h| h.precipitation > 0.0).count();
        if rainy as f64 / day_hours.len() as f64 >= rain_hour_share {
            rain_days += 1;
        } else {
            break;
        }
    }

    rain_days
}

/// Builds the storm surge warning text from current wind and pressure, None if calm
///
/// # Arguments
///
/// * 'current' - current weather at the location
/// * 'wind_kmh' - wind threshold in km/h
/// * 'pressure_hpa' - pressure at or below which to warn
pub fn storm_surge_warning(current: &CurrentWeather, wind_kmh: f64, pressure_hpa: f64) -> Option<String> {
    let wind = current.wind_speed * MS_TO_KMH;
    let mut messages: Vec<String> = Vec::new();

    if wind >= wind_kmh {
        messages.push(format!("Sturmwarnung: starker Wind ({:.1} km/h)", wind));
    }
    if current.pressure <= pressure_hpa {
        messages.push(format!("Niedriger Luftdruck ({} hPa)", current.pressure));
    }

    if messages.is_empty() { None } else { Some(messages.join(" | ")) }
}
