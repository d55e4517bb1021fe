use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;

/// A persisted visit as returned by `GET /api/users/{user_id}/visits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// ISO alpha-3 code.
    pub country_code: String,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisit {
    pub country_code: String,
    pub visited_at: DateTime<Utc>,
}

impl NewVisit {
    pub fn now(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            visited_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub country_count: u32,
    #[serde(default)]
    pub country_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

impl LeaderboardQuery {
    pub fn effective_limit(&self, max: u32) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, max.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_limit_defaults_and_clamps() {
        assert_eq!(LeaderboardQuery { limit: None }.effective_limit(100), 10);
        assert_eq!(LeaderboardQuery { limit: Some(0) }.effective_limit(100), 1);
        assert_eq!(LeaderboardQuery { limit: Some(500) }.effective_limit(100), 100);
        assert_eq!(LeaderboardQuery { limit: Some(25) }.effective_limit(20), 20);
    }

    #[test]
    fn profile_omits_missing_avatar() {
        let profile = Profile {
            display_name: "Ada".into(),
            avatar_url: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"display_name":"Ada"}"#);
    }

    #[test]
    fn leaderboard_entry_tolerates_missing_optional_fields() {
        let entry: LeaderboardEntry = serde_json::from_str(
            r#"{"user_id":"u1","display_name":null,"country_count":3}"#,
        )
        .unwrap();
        assert_eq!(entry.country_count, 3);
        assert!(entry.country_codes.is_empty());
        assert!(entry.avatar_url.is_none());
    }

    #[test]
    fn visit_record_parses_rfc3339_timestamps() {
        let record: VisitRecord = serde_json::from_str(
            r#"{"country_code":"FRA","visited_at":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.country_code, "FRA");
        assert_eq!(record.visited_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }
}
