// src/extraction/prompt.rs
use serde::Serialize;

const ROLE_PROMPT: &str = "You are parsing the Schedule of Investments document of a mutual fund.";

const TASK_PROMPT: &str = "Extract the Fund Name and the Report Date in ISO format. \
Extract a list of each holding item within the schedule of investments. Each holding item should contain the following values: \
Security Name, Security Type, Sector, Country, Number of Shares, Principle Amount, Market Value. \
If a value is not present, it should be returned as null.";

const FORMAT_PROMPT: &str = r#"Response should be a single JSON object in the format
{
    "Fund Name": Fund Name,
    "Report Date": Report Date,
    "Schedule of Investments": [
        {
            "Security Name": Security Name,
            "Security Type": Security Type,
            "Sector": Business Sector,
            "Country": Country,
            "Number of Shares": Number of Shares,
            "Principle": Principal Amount,
            "Market Value": Market Value
        }
    ]
}"#;

const EXAMPLE_PROMPT: &str = r#"Example:
{
    "Fund Name": "The Hartford Balanced Income Fund",
    "Report Date": "2023-04-30",
    "Schedule of Investments": [
        {
            "Security Name": "JetBlue Airways Corp",
            "Security Type": "Convertible Bonds",
            "Sector": "Airlines",
            "Country": "Canada",
            "Number of Shares": "12345",
            "Principle": "$1,499,000",
            "Market Value": "$1,167,870"
        },
        {
            "Security Name": "Block, Inc.",
            "Security Type": null,
            "Sector": null,
            "Country": null,
            "Number of Shares": null,
            "Principle": "$1,499,000",
            "Market Value": "$1,167,870"
        }
    ]
}"#;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// The instruction message followed by the page text.
pub fn messages(page_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: [ROLE_PROMPT, TASK_PROMPT, FORMAT_PROMPT, EXAMPLE_PROMPT].join("\n\n"),
        },
        ChatMessage {
            role: "user",
            content: page_text.to_string(),
        },
    ]
}
