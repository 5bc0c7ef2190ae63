use serde::Deserialize;

#[derive(Deserialize)]
pub struct Hourly {
    pub time: Vec<String>,
    pub windspeed_10m: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
}

#[derive(Deserialize)]
pub struct HourlyResponse {
    pub hourly: Hourly,
}
