use serde::Deserialize;

#[derive(Deserialize)]
pub struct Rain {
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

#[derive(Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Deserialize)]
pub struct ForecastRecord {
    pub dt: i64,
    pub rain: Option<Rain>,
    pub wind: Option<Wind>,
}

#[derive(Deserialize)]
pub struct Forecast {
    pub list: Vec<ForecastRecord>,
}

#[derive(Deserialize)]
pub struct Alert {
    pub event: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct OneCall {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

#[derive(Deserialize)]
pub struct Main {
    pub pressure: Option<f64>,
}

#[derive(Deserialize)]
pub struct Current {
    pub main: Option<Main>,
    pub wind: Option<Wind>,
}
