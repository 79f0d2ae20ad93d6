use serde::{Deserialize, Serialize};

use super::de_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "holiday")]
    pub name: String,
    #[serde(rename = "holiday_date")]
    pub date: String,
    #[serde(rename = "holiday_description", default)]
    pub description: Option<String>,
}
