mod order;
mod page;
mod product;
mod report;
mod stats;
mod user;
mod vendor;

pub use order::*;
pub use page::*;
pub use product::*;
pub use report::*;
pub use stats::*;
pub use user::*;
pub use vendor::*;

/// Accepts either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
/// (read as midnight UTC). `null` and absence both mean "not provided".
pub(crate) mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Some(d.and_time(NaiveTime::MIN).and_utc()))
            .map_err(|_| D::Error::custom(format!("invalid date: {}", raw)))
    }
}
