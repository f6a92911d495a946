// src/schedule/models.rs
use serde::{Deserialize, Deserializer, Serialize};

/// One schedule page picked out of a document, ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantPage {
    /// 1-based page number in the source document.
    pub page_number: usize,
    pub text: String,
    pub is_continuation: bool,
}

/// A single line item of a schedule of investments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(rename = "Security Name", default, deserialize_with = "lenient_string")]
    pub security_name: Option<String>,
    #[serde(
        rename = "Security Type",
        alias = "Security type",
        default,
        deserialize_with = "lenient_string"
    )]
    pub security_type: Option<String>,
    #[serde(rename = "Sector", default, deserialize_with = "lenient_string")]
    pub sector: Option<String>,
    #[serde(rename = "Country", default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(rename = "Number of Shares", default, deserialize_with = "lenient_string")]
    pub number_of_shares: Option<String>,
    // The published output key is spelled "Principle".
    #[serde(rename = "Principle", default, deserialize_with = "lenient_string")]
    pub principal: Option<String>,
    #[serde(rename = "Market Value", default, deserialize_with = "lenient_string")]
    pub market_value: Option<String>,
}

/// The structured schedule of one fund.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRecord {
    #[serde(rename = "Fund Name", default, deserialize_with = "lenient_string")]
    pub fund_name: Option<String>,
    #[serde(rename = "Report Date", default, deserialize_with = "lenient_string")]
    pub report_date: Option<String>,
    #[serde(rename = "Schedule of Investments", default, deserialize_with = "null_as_empty")]
    pub holdings: Vec<Holding>,
}

/// Top-level output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub funds: Vec<FundRecord>,
}

/// Accepts strings, numbers and booleans; the model is loose about quoting figures.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a string or number, found {}", other))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Holding>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Holding>>::deserialize(deserializer)?.unwrap_or_default())
}
