use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use ureq::Agent;
use crate::models::world_tides::{TideData, TideExtreme};

const WORLD_TIDES_URL: &str = "https://www.worldtides.info/api/v2";

/// Struct for fetching tide extremes from WorldTides with a file cache in front
pub struct WorldTides {
    agent: Agent,
    url: String,
    api_key: String,
    lat: f64,
    long: f64,
    length_secs: i64,
    cache_file: PathBuf,
    cache_duration: Duration,
}

impl WorldTides {
    /// Returns a WorldTides struct
    ///
    /// # Arguments
    ///
    /// * 'api_key' - WorldTides api key
    /// * 'lat' - latitude of the tide station area
    /// * 'long' - longitude of the tide station area
    /// * 'length_days' - number of days of tides to request
    /// * 'cache_file' - path to the json cache file
    /// * 'cache_days' - number of days a cache file is valid
    pub fn new(api_key: String, lat: f64, long: f64, length_days: i64, cache_file: &str, cache_days: i64) -> WorldTides {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(20)))
            .build();

        Self {
            agent: config.into(),
            url: WORLD_TIDES_URL.to_string(),
            api_key,
            lat,
            long,
            length_secs: length_days * 24 * 3600,
            cache_file: PathBuf::from(cache_file),
            cache_duration: Duration::from_secs(cache_days.max(0) as u64 * 24 * 3600),
        }
    }

    /// Returns tide data from the cache if it is fresh, otherwise from WorldTides.
    /// A successful fetch overwrites the cache. If the fetch fails a stale cache is used
    /// and if there is no readable cache either, empty data is returned.
    pub fn get_tides(&self) -> TideData {
        if self.cache_is_fresh() {
            match read_cache(&self.cache_file) {
                Ok(data) => {
                    info!("tides loaded from cache {}", self.cache_file.display());
                    return data;
                },
                Err(e) => warn!("failed to read tide cache: {:#}", e),
            }
        }

        info!("fetching tides from WorldTides");
        match self.fetch() {
            Ok((data, json)) => {
                if let Err(e) = write_cache(&self.cache_file, &json) {
                    warn!("failed to write tide cache: {:#}", e);
                }
                data
            },
            Err(e) => {
                warn!("failed to fetch tides: {:#}", e);
                if self.cache_file.exists() {
                    match read_cache(&self.cache_file) {
                        Ok(data) => {
                            warn!("using stale tide cache {}", self.cache_file.display());
                            return data;
                        },
                        Err(e) => warn!("failed to read stale tide cache: {:#}", e),
                    }
                }
                TideData::default()
            },
        }
    }

    fn cache_is_fresh(&self) -> bool {
        fs::metadata(&self.cache_file)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age < self.cache_duration)
    }

    fn fetch(&self) -> Result<(TideData, String)> {
        let json = self.agent
            .get(self.url.as_str())
            .query("extremes", "")
            .query("lat", self.lat.to_string())
            .query("lon", self.long.to_string())
            .query("length", self.length_secs.to_string())
            .query("key", &self.api_key)
            .call()
            .context("tide request")?
            .body_mut()
            .read_to_string()
            .context("tide response body")?;

        let data: TideData = serde_json::from_str(&json).context("tide document")?;
        if let Some(error) = data.other.get("error") {
            bail!("WorldTides error: {}", error);
        }

        Ok((data, json))
    }
}

fn read_cache(path: &Path) -> Result<TideData> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let data = serde_json::from_str(&json)
        .with_context(|| format!("parsing {}", path.display()))?;

    Ok(data)
}

fn write_cache(path: &Path, json: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

    Ok(())
}

/// Groups tide extremes by local date, each as (type, local time) in input order
///
/// # Arguments
///
/// * 'extremes' - tide extremes from WorldTides
/// * 'tz' - time zone to group in
pub fn tides_by_date(extremes: &[TideExtreme], tz: Tz) -> BTreeMap<NaiveDate, Vec<(String, DateTime<Tz>)>> {
    let mut result: BTreeMap<NaiveDate, Vec<(String, DateTime<Tz>)>> = BTreeMap::new();
    for e in extremes {
        if let Some(utc) = DateTime::<Utc>::from_timestamp(e.dt, 0) {
            let local = utc.with_timezone(&tz);
            result.entry(local.date_naive()).or_default().push((e.tide_type.clone(), local));
        }
    }

    result
}
