use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TideExtreme {
    pub dt: i64,
    #[serde(rename = "type")]
    pub tide_type: String,
}

/// WorldTides response, other fields of the document are kept so the cache holds it whole
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TideData {
    #[serde(default)]
    pub extremes: Vec<TideExtreme>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}
