use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder shown for missing records and undefined rates.
pub const EMPTY_CELL: &str = "-";

/// Formats an elapsed time in milliseconds as `M'SS'mmm` (e.g. `1'23'456`).
pub fn format_record(record_ms: Option<u64>) -> String {
    let Some(ms) = record_ms.filter(|ms| *ms > 0) else {
        return EMPTY_CELL.to_string();
    };
    let minutes = ms / 60_000;
    let seconds = (ms / 1_000) % 60;
    let millis = ms % 1_000;
    format!("{minutes}'{seconds:02}'{millis:03}")
}

/// Formats a rate computed by [`crate::kart_record::rate`] for a table cell.
pub fn format_rate(rate: Option<u32>) -> String {
    match rate {
        Some(pct) => format!("{pct}%"),
        None => EMPTY_CELL.to_string(),
    }
}

/// The API sends records either as JSON numbers or as numeric strings.
/// Anything else is treated as "no record".
pub fn de_record_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(record_from_value))
}

fn record_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v.round() as u64)
            })
        }
        _ => None,
    }
}
