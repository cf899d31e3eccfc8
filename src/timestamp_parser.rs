use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Handles parsing the timestamps found in `svn log --xml` output and the
/// day-granular dates accepted on the command line
pub struct TimestampParser;

impl TimestampParser {
    /// Parse an entry timestamp into a DateTime<Utc>
    /// Handles both Z suffix and explicit offsets
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let trimmed = timestamp_str.trim();

        // `Z` means the same thing as `+00:00`
        let timestamp = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
            Some(stripped) => format!("{stripped}+00:00"),
            None => trimmed.to_string(),
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
            return Ok(dt.with_timezone(&Utc));
        }

        // No offset: assume UTC
        if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(naive.and_utc());
        }

        if let Ok(date) = NaiveDate::parse_from_str(&timestamp, "%Y-%m-%d") {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }

    /// Parse a `YYYY-MM-DD` command-line date as midnight UTC
    pub fn parse_day(day_str: &str) -> Result<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(day_str, "%Y-%m-%d").map_err(|_| {
            anyhow::anyhow!("Invalid date format: '{}'. Use YYYY-MM-DD.", day_str)
        })?;
        Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}
