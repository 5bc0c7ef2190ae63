use std::collections::BTreeMap;
use std::path::Path;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use crate::calendar::{Calendar, CalendarEvent, EventTime};
use crate::config::{Config, GeoRef, PhotoTimes, StormSurge, Warnings, WeatherEvents};
use crate::errors::WorkerError;
use crate::initialization::Mgr;
use crate::manager_owm::OWM;
use crate::manager_sun::Sun;
use crate::manager_tides::tides_by_date;
use crate::photo_times::day_overview;
use crate::streaks::{detect_calm_after_storm, detect_rain_streak, CalmMorningEvent, Detection, RainStreak, Thresholds};
use crate::warnings::{consecutive_rain_days, storm_on_date, storm_surge_warning};

/// Runs every configured job. A failing job is logged and doesn't stop the others.
///
/// Returns the number of failed jobs
///
/// # Arguments
///
/// * 'config' - the configuration
/// * 'mgr' - service clients
pub fn run(config: &Config, mgr: &Mgr) -> usize {
    let mut results: Vec<(&str, Result<(), WorkerError>)> = Vec::new();

    if let Some(cfg) = &config.weather_events {
        results.push(("weather_events", weather_events(cfg, mgr)));
    }
    if let Some(cfg) = &config.photo_times {
        results.push(("photo_times", photo_times(cfg, mgr)));
    }
    if let Some(cfg) = &config.warnings {
        results.push(("warnings", warnings(cfg, mgr)));
    }
    if let Some(cfg) = &config.storm_surge {
        results.push(("storm_surge", storm_surge(cfg, mgr)));
    }

    let mut failed = 0;
    for (job, result) in results {
        match result {
            Ok(()) => info!("job {} done", job),
            Err(e) => {
                error!("job {} failed: {}", job, e);
                failed += 1;
            },
        }
    }

    failed
}

/// Weather alerts, rain streak and calm morning after storm, merged into an existing
/// calendar where earlier versions of the same events are replaced
fn weather_events(cfg: &WeatherEvents, mgr: &Mgr) -> Result<(), WorkerError> {
    let path = Path::new(&cfg.output_file);
    let uids = [cfg.uids.alerts.as_str(), cfg.uids.rain_streak.as_str(), cfg.uids.calm_morning.as_str()];
    let mut calendar = Calendar::load_retaining(path, "-//Wettereignisse DK//", &uids)?;
    let now = Utc::now().with_timezone(&cfg.timezone);

    match fetch_alerts(mgr.owm.as_ref(), &cfg.alert_location) {
        Detection::Found(alerts) => calendar.add_event(alerts_event(&alerts, now, &cfg.uids.alerts)),
        Detection::Nothing => info!("no weather alerts for {}", cfg.alert_location.name),
        Detection::FetchFailed(reason) => warn!("weather alerts skipped: {}", reason),
    }

    match rain_streak(mgr.owm.as_ref(), &cfg.rain_location, cfg.timezone, &cfg.thresholds) {
        Detection::Found(streak) => {
            info!("rain streak in {}: {} days from {}", cfg.rain_location.name, streak.length, streak.start_date);
            calendar.add_event(rain_streak_event(&streak, &cfg.rain_location.name, &cfg.uids.rain_streak));
        },
        Detection::Nothing => info!("no rain streak in {}", cfg.rain_location.name),
        Detection::FetchFailed(reason) => warn!("rain streak skipped: {}", reason),
    }

    match Sun::new(cfg.calm_location.lat, cfg.calm_location.long, cfg.timezone) {
        Ok(sun) => match calm_morning(mgr.owm.as_ref(), &sun, &cfg.calm_location, cfg.timezone, &cfg.thresholds) {
            Detection::Found(event) => {
                info!("calm morning at {} on {}", cfg.calm_location.name, event.date);
                calendar.add_event(calm_morning_event(&event, &cfg.calm_location.name, cfg.timezone, &cfg.uids.calm_morning));
            },
            Detection::Nothing => info!("no calm morning after storm at {}", cfg.calm_location.name),
            Detection::FetchFailed(reason) => warn!("calm morning skipped: {}", reason),
        },
        Err(e) => error!("calm morning skipped, no sunrise for {}: {}", cfg.calm_location.name, e),
    }

    calendar.save(path)?;
    info!("calendar updated: {}", cfg.output_file);

    Ok(())
}

fn fetch_alerts(owm: Option<&OWM>, location: &GeoRef) -> Detection<Vec<String>> {
    let Some(owm) = owm else {
        return Detection::FetchFailed("no OpenWeatherMap api key".to_string());
    };
    match owm.get_alerts(location.lat, location.long) {
        Ok(alerts) if alerts.is_empty() => Detection::Nothing,
        Ok(alerts) => Detection::Found(alerts),
        Err(e) => Detection::FetchFailed(e.to_string()),
    }
}

fn rain_streak(owm: Option<&OWM>, location: &GeoRef, tz: Tz, t: &Thresholds) -> Detection<RainStreak> {
    let Some(owm) = owm else {
        return Detection::FetchFailed("no OpenWeatherMap api key".to_string());
    };
    match owm.get_forecast(location.lat, location.long, tz) {
        Ok(samples) => detect_rain_streak(&samples, t.rain_samples_per_day, t.min_streak_days, t.include_trailing_streak).into(),
        Err(e) => Detection::FetchFailed(e.to_string()),
    }
}

fn calm_morning(owm: Option<&OWM>, sun: &Sun, location: &GeoRef, tz: Tz, t: &Thresholds) -> Detection<CalmMorningEvent> {
    let Some(owm) = owm else {
        return Detection::FetchFailed("no OpenWeatherMap api key".to_string());
    };
    match owm.get_forecast(location.lat, location.long, tz) {
        Ok(samples) => detect_calm_after_storm(&samples, |d| sun.sunrise(d), t.storm_wind, t.calm_wind).into(),
        Err(e) => Detection::FetchFailed(e.to_string()),
    }
}

fn alerts_event(alerts: &[String], now: DateTime<Tz>, uid: &str) -> CalendarEvent {
    CalendarEvent::new(
        uid.to_string(),
        "⚠️ Wetterwarnungen".to_string(),
        EventTime::DateTime(now),
        EventTime::DateTime(now + TimeDelta::hours(1)))
        .with_description(alerts.join("\n\n"))
}

fn rain_streak_event(streak: &RainStreak, name: &str, uid: &str) -> CalendarEvent {
    CalendarEvent::new(
        uid.to_string(),
        format!("🌧️ {} Tage Regen in {} ab {}", streak.length, name, streak.start_date.format("%d.%m.")),
        EventTime::Date(streak.start_date),
        EventTime::Date(streak.start_date + TimeDelta::days(1)))
}

/// The calm morning is placed at sunrise and lasts one hour
fn calm_morning_event(event: &CalmMorningEvent, name: &str, tz: Tz, uid: &str) -> CalendarEvent {
    let sunrise = event.sunrise.with_timezone(&tz);
    CalendarEvent::new(
        uid.to_string(),
        format!("🌬️ Ruhiger Morgen nach Sturm am {}", name),
        EventTime::DateTime(sunrise),
        EventTime::DateTime(sunrise + TimeDelta::hours(1)))
        .with_description(format!("Wind zum Sonnenaufgang: {:.1} m/s", event.sample.wind_speed))
}

/// One overview event per day with sun and tide times
fn photo_times(cfg: &PhotoTimes, mgr: &Mgr) -> Result<(), WorkerError> {
    let tz = cfg.timezone;
    let sun = Sun::new(cfg.location.lat, cfg.location.long, tz)?;

    let tide_data = mgr.tides.as_ref().map(|t| t.get_tides()).unwrap_or_default();
    info!("{} tide extremes available", tide_data.extremes.len());
    let tides = tides_by_date(&tide_data.extremes, tz);

    let mut calendar = Calendar::new(&cfg.prodid);
    let now = Utc::now().with_timezone(&tz);
    let today = now.date_naive();

    for offset in 0..cfg.days {
        let date = today + TimeDelta::days(offset);
        match overview_event(&sun, date, tz, &tides) {
            Ok(event) => calendar.add_event(event),
            Err(e) => warn!("no overview for {}: {}", date, e),
        }
    }

    if mgr.owm.is_some() {
        match fetch_alerts(mgr.owm.as_ref(), &cfg.location) {
            Detection::Found(alerts) => {
                let uid = format!("wetterwarnung-{}@fotozeiten", today.format("%Y%m%d"));
                let mut event = alerts_event(&alerts, now, &uid);
                event.summary = "⚠️ Wetterwarnung".to_string();
                calendar.add_event(event);
            },
            Detection::Nothing => info!("no weather alerts for {}", cfg.location.name),
            Detection::FetchFailed(reason) => warn!("weather alerts skipped: {}", reason),
        }
    }

    calendar.save(Path::new(&cfg.output_file))?;
    info!("calendar written: {} with {} events", cfg.output_file, calendar.len());

    Ok(())
}

fn overview_event(
    sun: &Sun,
    date: NaiveDate,
    tz: Tz,
    tides: &BTreeMap<NaiveDate, Vec<(String, DateTime<Tz>)>>) -> Result<CalendarEvent, WorkerError> {

    let sun_times = sun.sun_times(date)?;
    let day_tides = tides.get(&date).map(|t| t.as_slice()).unwrap_or(&[]);

    let start = local_midnight(tz, date)?;
    let end = local_midnight(tz, date + TimeDelta::days(1))?;

    Ok(CalendarEvent::new(
        format!("tagesueberblick-{}@fotozeiten", date.format("%Y%m%d")),
        "📋 Tagesüberblick".to_string(),
        EventTime::DateTime(start),
        EventTime::DateTime(end))
        .with_description(day_overview(&sun_times, day_tides)))
}

fn local_midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>, WorkerError> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or(WorkerError::new("photo_times", format!("no local midnight on {}", date)))
}

/// Storm tomorrow and consecutive rain days from hourly Open-Meteo data
fn warnings(cfg: &Warnings, mgr: &Mgr) -> Result<(), WorkerError> {
    let tz = cfg.timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let tomorrow = today + TimeDelta::days(1);

    let storm_hours = mgr.open_meteo.get_hourly(cfg.storm_location.lat, cfg.storm_location.long, tz, cfg.forecast_days)?;
    let rain_hours = mgr.open_meteo.get_hourly(cfg.rain_location.lat, cfg.rain_location.long, tz, cfg.forecast_days)?;

    let storm = storm_on_date(&storm_hours, tomorrow, cfg.storm_wind_kmh);
    let rain_days = consecutive_rain_days(&rain_hours, today, cfg.forecast_days, cfg.rain_hour_share);

    let mut calendar = Calendar::new("-//Wetterwarnungen Fotozeiten//");
    if let Some(wind) = storm {
        info!("storm warning for {}: {:.0} km/h", cfg.storm_location.name, wind);
        calendar.add_event(storm_event(&cfg.storm_location.name, wind, today));
    }
    if rain_days >= cfg.min_rain_days {
        info!("rain warning for {}: {} days", cfg.rain_location.name, rain_days);
        calendar.add_event(rain_days_event(&cfg.rain_location.name, rain_days, today));
    }

    calendar.save(Path::new(&cfg.output_file))?;
    info!("calendar written: {} with {} events", cfg.output_file, calendar.len());

    Ok(())
}

fn storm_event(name: &str, wind: f64, today: NaiveDate) -> CalendarEvent {
    CalendarEvent::new(
        format!("sturmwarnung-{}@wetterwarnungen", today.format("%Y%m%d")),
        format!("Sturmwarnung {}: {} km/h", name, wind.trunc()),
        EventTime::Date(today),
        EventTime::Date(today + TimeDelta::days(1)))
        .with_description(format!("Morgen wird Sturm mit {} km/h erwartet.", wind.trunc()))
}

fn rain_days_event(name: &str, days: usize, today: NaiveDate) -> CalendarEvent {
    CalendarEvent::new(
        format!("regenwarnung-{}@wetterwarnungen", today.format("%Y%m%d")),
        format!("{} Tage Regen in {}", days, name),
        EventTime::Date(today),
        EventTime::Date(today + TimeDelta::days(1)))
        .with_description(format!("{} Tage in Folge Regen vorhergesagt.", days))
}

/// Storm surge warning from current wind and air pressure
fn storm_surge(cfg: &StormSurge, mgr: &Mgr) -> Result<(), WorkerError> {
    let owm = mgr.owm.as_ref()
        .ok_or(WorkerError::new("storm_surge", "no OpenWeatherMap api key".to_string()))?;

    let current = owm.get_current(cfg.location.lat, cfg.location.long)?;
    match storm_surge_warning(&current, cfg.wind_kmh, cfg.pressure_hpa) {
        Some(text) => {
            info!("storm surge warning for {}, writing {}", cfg.location.name, cfg.output_file);
            let now = Utc::now().with_timezone(&cfg.timezone);
            let mut calendar = Calendar::new(&format!("-//Fotozeiten//Wetterwarnung {}//", cfg.location.name));
            calendar.add_event(storm_surge_event(&cfg.location.name, text, now));
            calendar.save(Path::new(&cfg.output_file))?;
        },
        None => info!("no storm surge warning for {}", cfg.location.name),
    }

    Ok(())
}

fn storm_surge_event(name: &str, text: String, now: DateTime<Tz>) -> CalendarEvent {
    CalendarEvent::new(
        format!("wetterwarnung-{}@fotozeiten", now.format("%Y%m%d")),
        format!("⚠️ Wetterwarnung {}", name),
        EventTime::DateTime(now),
        EventTime::DateTime(now + TimeDelta::hours(1)))
        .with_description(text)
        .with_location(name.to_string())
}
