//! Proxy selection strategies
//!
//! Both strategies run inside the store as a single query; this module only
//! names them so callers and configuration can pick one.

/// Strategy types for proxy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    /// Uniform random pick among eligible records, partitioned by region
    #[default]
    Random,
    /// Available record with the smallest consuming time
    LeastTime,
}

impl RotationStrategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "least_time" | "leasttime" | "least-time" | "least_timed" | "fastest" => {
                Self::LeastTime
            }
            _ => Self::Random,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::LeastTime => "least_time",
        }
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
