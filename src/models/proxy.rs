use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

static IPV4_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("IPv4 literal pattern is valid")
});

/// Region partition used by random selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegionFlag {
    /// Any available proxy
    #[default]
    Any,
    /// Available proxies that cannot bypass the GFW (flag 1)
    Domestic,
    /// Available proxies that can bypass the GFW (flag 2)
    Bypass,
}

impl RegionFlag {
    /// Map a caller-supplied integer flag; unknown values select from the whole pool.
    pub fn from_flag(flag: i64) -> Self {
        match flag {
            1 => RegionFlag::Domestic,
            2 => RegionFlag::Bypass,
            _ => RegionFlag::Any,
        }
    }

    /// Required `can_bypass_gfw` value, or `None` when either is eligible
    pub fn bypass_requirement(&self) -> Option<bool> {
        match self {
            RegionFlag::Any => None,
            RegionFlag::Domestic => Some(false),
            RegionFlag::Bypass => Some(true),
        }
    }

    /// Check whether a record is eligible under this flag
    pub fn admits(&self, record: &ProxyRecord) -> bool {
        record.available
            && self
                .bypass_requirement()
                .is_none_or(|bypass| record.can_bypass_gfw == bypass)
    }
}

impl std::fmt::Display for RegionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegionFlag::Any => "any",
            RegionFlag::Domestic => "domestic",
            RegionFlag::Bypass => "bypass",
        };
        write!(f, "{}", name)
    }
}

/// Stored state for one upstream proxy endpoint
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProxyRecord {
    pub id: i64,
    pub url: String,
    /// First dotted-quad found in `url`, display only
    pub ip: String,
    pub consuming_time: i64,
    /// Reserved usage counter, never mutated by the store
    pub count: i64,
    /// Reserved selection weight, never read by selection
    pub weight: i64,
    pub retry: i64,
    pub available: bool,
    pub can_bypass_gfw: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Counts over the live (not soft-deleted) part of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, Default)]
pub struct PoolSummary {
    pub total: i64,
    pub available: i64,
    pub bypass: i64,
}

/// Extract the first IPv4 dotted-quad literal from a proxy URL.
///
/// Returns an empty string when none is present.
pub fn extract_ip(url: &str) -> String {
    IPV4_LITERAL
        .find(url)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
