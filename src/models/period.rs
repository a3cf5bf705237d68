use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Recency window understood by the BuildingInfo `_updated` / `_apion` filters.
///
/// The API encodes windows as small numeric strings. `as_code` yields the
/// value sent upstream; `from_code` accepts only those canonical codes, while
/// `from_setting` also understands the older notification-settings values that
/// may still be stored in user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdatePeriod {
    #[default]
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
}

impl UpdatePeriod {
    pub const ALL: [UpdatePeriod; 4] = [
        UpdatePeriod::Today,
        UpdatePeriod::Yesterday,
        UpdatePeriod::LastWeek,
        UpdatePeriod::LastMonth,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            UpdatePeriod::Today => "3",
            UpdatePeriod::Yesterday => "-1.1",
            UpdatePeriod::LastWeek => "-7.1",
            UpdatePeriod::LastMonth => "-30.1",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpdatePeriod::Today => "today",
            UpdatePeriod::Yesterday => "yesterday",
            UpdatePeriod::LastWeek => "last 7 days",
            UpdatePeriod::LastMonth => "last 30 days",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|p| p.as_code() == code)
    }

    /// Lenient parse for stored preferences.
    pub fn from_setting(value: &str) -> Option<Self> {
        if let Some(period) = Self::from_code(value) {
            return Some(period);
        }
        match value.trim() {
            "3.1" => Some(UpdatePeriod::Yesterday),
            "0.7" => Some(UpdatePeriod::LastWeek),
            // The old settings screen offered windows wider than a month;
            // the widest window the feed supports is used for all of them.
            "1" | "1.1" | "2" => Some(UpdatePeriod::LastMonth),
            _ => None,
        }
    }
}

impl fmt::Display for UpdatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl Serialize for UpdatePeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> Deserialize<'de> for UpdatePeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        UpdatePeriod::from_setting(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown update period: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_codes_only() {
        assert_eq!(UpdatePeriod::from_code("3"), Some(UpdatePeriod::Today));
        assert_eq!(UpdatePeriod::from_code("-1.1"), Some(UpdatePeriod::Yesterday));
        assert_eq!(UpdatePeriod::from_code("-7.1"), Some(UpdatePeriod::LastWeek));
        assert_eq!(UpdatePeriod::from_code("-30.1"), Some(UpdatePeriod::LastMonth));
        assert_eq!(UpdatePeriod::from_code("0.7"), None);
        assert_eq!(UpdatePeriod::from_code("7"), None);
        assert_eq!(UpdatePeriod::from_code(""), None);
    }

    #[test]
    fn test_legacy_settings_are_normalised() {
        assert_eq!(UpdatePeriod::from_setting("3"), Some(UpdatePeriod::Today));
        assert_eq!(UpdatePeriod::from_setting("3.1"), Some(UpdatePeriod::Yesterday));
        assert_eq!(UpdatePeriod::from_setting("0.7"), Some(UpdatePeriod::LastWeek));
        assert_eq!(UpdatePeriod::from_setting("2"), Some(UpdatePeriod::LastMonth));
        assert_eq!(UpdatePeriod::from_setting("-7.1"), Some(UpdatePeriod::LastWeek));
        assert_eq!(UpdatePeriod::from_setting("weekly"), None);
    }

    #[test]
    fn test_serde_uses_api_code() {
        let json = serde_json::to_string(&UpdatePeriod::LastWeek).unwrap();
        assert_eq!(json, "\"-7.1\"");
        let parsed: UpdatePeriod = serde_json::from_str("\"0.7\"").unwrap();
        assert_eq!(parsed, UpdatePeriod::LastWeek);
    }
}
