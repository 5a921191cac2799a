//! User profile (from the platform) and the persisted user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public profile as returned by the Graph API user profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// UTC offset in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Persisted per-user record keyed by page-scoped id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub psid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Free-form user settings (`prefix`, `timezone`, ...).
    #[serde(default)]
    pub custom: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(psid: impl Into<String>) -> Self {
        Self {
            psid: psid.into(),
            ..Self::default()
        }
    }

    pub fn from_profile(psid: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            psid: psid.into(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            profile_pic: profile.profile_pic,
            locale: profile.locale,
            timezone: profile.timezone,
            gender: profile.gender,
            custom: Map::new(),
            last_active: None,
        }
    }

    /// Record carrying only one `custom` key; saving it leaves every other field intact.
    pub fn custom_update(psid: impl Into<String>, key: &str, value: Value) -> Self {
        let mut record = Self::new(psid);
        record.custom.insert(key.to_string(), value);
        record
    }

    /// Overlays `update` onto `self`.
    ///
    /// Present top-level fields replace the stored ones; `custom` is merged key by key so an
    /// update never drops settings it does not mention.
    pub fn merge(&mut self, update: UserRecord) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if !update.psid.is_empty() {
            self.psid = update.psid;
        }
        overlay(&mut self.first_name, update.first_name);
        overlay(&mut self.last_name, update.last_name);
        overlay(&mut self.profile_pic, update.profile_pic);
        overlay(&mut self.locale, update.locale);
        overlay(&mut self.timezone, update.timezone);
        overlay(&mut self.gender, update.gender);
        overlay(&mut self.last_active, update.last_active);
        self.custom.extend(update.custom);
    }

    /// Custom prefix, when set to a non-empty string.
    pub fn custom_prefix(&self) -> Option<&str> {
        self.custom_str("prefix")
    }

    /// Custom IANA timezone name, when set.
    pub fn custom_timezone(&self) -> Option<&str> {
        self.custom_str("timezone")
    }

    fn custom_str(&self, key: &str) -> Option<&str> {
        self.custom
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `"First Last"`, trimmed; empty when no name is known.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}
