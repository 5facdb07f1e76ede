use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A chat message as returned by the backend's live `messages:list` query.
///
/// Records are owned by the backend; the client only ever holds read
/// snapshots of them, plus one local placeholder while a reply streams in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    #[serde(rename = "_creationTime", with = "creation_time")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The two independently metered message classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Standard,
    Premium,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the backend's `subscriptions:status` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub tier: String,
    pub standard_used: u64,
    pub standard_limit: u64,
    pub premium_used: u64,
    pub premium_limit: u64,
    /// Purchased top-ups, added on top of the tier limit.
    #[serde(default)]
    pub standard_credits: u64,
    #[serde(default)]
    pub premium_credits: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "creation_time::option")]
    pub period_end: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    /// (used, limit, credits) for one message class.
    pub fn counters(&self, kind: MessageType) -> (u64, u64, u64) {
        match kind {
            MessageType::Standard => (self.standard_used, self.standard_limit, self.standard_credits),
            MessageType::Premium => (self.premium_used, self.premium_limit, self.premium_credits),
        }
    }
}

/// Backend timestamps are float milliseconds since the Unix epoch.
pub mod creation_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(dt.timestamp_micros() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let millis = f64::deserialize(d)?;
        from_millis(millis).ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
    }

    pub fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_micros((millis * 1000.0).round() as i64)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<f64>::deserialize(d)? {
                Some(millis) => super::from_millis(millis)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}"))),
                None => Ok(None),
            }
        }
    }
}
