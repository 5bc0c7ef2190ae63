use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;
use crate::manager_open_meteo::OpenMeteoError;
use crate::manager_owm::OwmError;
use crate::manager_sun::SunError;

#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("CalendarError::File: {0}")]
    File(#[from] std::io::Error),
    #[error("CalendarError::Document: {0}")]
    Document(String),
}

pub struct InitError(pub String);

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InitError: {}", self.0)
    }
}
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<std::io::Error> for InitError {
    fn from(e: std::io::Error) -> Self { InitError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for InitError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { InitError(e.to_string()) }
}
impl From<log::SetLoggerError> for InitError {
    fn from(e: log::SetLoggerError) -> Self { InitError(e.to_string()) }
}

/// Error from a single job, carries the job name so the log line tells which calendar was lost
#[derive(Debug)]
pub struct WorkerError {
    job: &'static str,
    msg: String,
}

impl WorkerError {
    pub fn new(job: &'static str, msg: String) -> WorkerError {
        WorkerError { job, msg }
    }
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "WorkerError [{}]: {}", self.job, self.msg)
    }
}
impl std::error::Error for WorkerError {}

impl From<CalendarError> for WorkerError {
    fn from(e: CalendarError) -> Self { WorkerError { job: "calendar", msg: e.to_string() } }
}
impl From<OwmError> for WorkerError {
    fn from(e: OwmError) -> Self { WorkerError { job: "openweathermap", msg: e.to_string() } }
}
impl From<OpenMeteoError> for WorkerError {
    fn from(e: OpenMeteoError) -> Self { WorkerError { job: "open-meteo", msg: e.to_string() } }
}
impl From<SunError> for WorkerError {
    fn from(e: SunError) -> Self { WorkerError { job: "sun", msg: e.to_string() } }
}
