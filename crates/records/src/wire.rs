//! Serde helpers for backend column formats.

/// `time` columns: written as `HH:MM:SS`, read from `HH:MM:SS` or `HH:MM`.
pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WITH_SECONDS: &str = "%H:%M:%S";
    const WITH_FRACTION: &str = "%H:%M:%S%.f";
    const WITHOUT_SECONDS: &str = "%H:%M";

    pub(crate) fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(WITH_SECONDS).to_string())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw:?}")))
    }

    pub(crate) fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, WITH_FRACTION)
            .or_else(|_| NaiveTime::parse_from_str(raw, WITHOUT_SECONDS))
            .ok()
    }

}
