use std::env;
use log::{info, warn};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General};
use crate::errors::InitError;
use crate::manager_open_meteo::OpenMeteo;
use crate::manager_owm::OWM;
use crate::manager_tides::WorldTides;

/// Log line pattern for both file and console
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} - {m}{n}";

/// Clients for the forecast services, the optional ones are None when no api key is given
pub struct Mgr {
    pub owm: Option<OWM>,
    pub open_meteo: OpenMeteo,
    pub tides: Option<WorldTides>,
}

/// Loads config, sets up logging and returns config and service clients
///
/// The config file is given by the CONFIG_PATH environment variable, default config.toml
pub fn init() -> Result<(Config, Mgr), InitError> {
    let config_path = env::var("CONFIG_PATH").unwrap_or("config.toml".to_string());
    let config = load_config(&config_path)?;

    setup_logger(&config.general)?;

    info!("wettercal version: {}", env!("CARGO_PKG_VERSION"));

    let owm = config.open_weather_map.api_key.clone().map(OWM::new);
    if owm.is_none() {
        warn!("no OpenWeatherMap api key, alerts and 3-hour forecasts are skipped");
    }

    let tides = config.world_tides.as_ref().map(|t| {
        if t.api_key.is_none() {
            warn!("no WorldTides api key, only cached tides can be used");
        }
        WorldTides::new(t.api_key.clone().unwrap_or_default(), t.lat, t.long, t.length_days, &t.cache_file, t.cache_days)
    });

    Ok((config, Mgr { owm, open_meteo: OpenMeteo::new(), tides }))
}

/// Sets up log4rs with a file appender and, if configured, a console appender
///
/// # Arguments
///
/// * 'general' - general config holding log path and level
fn setup_logger(general: &General) -> Result<(), InitError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&general.log_path)?;

    let mut builder = LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let log_config = builder.build(root.build(general.log_level))?;
    log4rs::init_config(log_config)?;

    Ok(())
}
