//! Query strategy knob controlling retrieval depth and synthesis budget.

use serde::{Deserialize, Serialize};

/// Per-query strategy: how much to retrieve and how much to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// Widest retrieval, largest synthesis budget.
    Comprehensive,
    /// Balanced defaults.
    Focused,
    /// Fewest sources, tightest budget, lowest latency.
    Rapid,
}

impl Default for QueryStrategy {
    fn default() -> Self {
        Self::Focused
    }
}

impl QueryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Focused => "focused",
            Self::Rapid => "rapid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "comprehensive" => Some(Self::Comprehensive),
            "focused" => Some(Self::Focused),
            "rapid" => Some(Self::Rapid),
            _ => None,
        }
    }

    /// Minimum vector-store score for the fast knowledge path.
    pub fn score_threshold(&self) -> f64 {
        match self {
            Self::Comprehensive => 0.60,
            Self::Focused => 0.70,
            Self::Rapid => 0.80,
        }
    }

    /// Maximum documents rendered into the fast-path context block.
    pub fn max_context_documents(&self) -> usize {
        match self {
            Self::Comprehensive => 5,
            Self::Focused => 3,
            Self::Rapid => 2,
        }
    }

    /// Completion token budget for synthesis.
    pub fn max_completion_tokens(&self) -> u32 {
        match self {
            Self::Comprehensive => 2000,
            Self::Focused => 1000,
            Self::Rapid => 500,
        }
    }

    /// Top-N after the ensemble rerank.
    pub fn ensemble_top_n(&self) -> usize {
        match self {
            Self::Comprehensive => 20,
            Self::Focused => 10,
            Self::Rapid => 5,
        }
    }

    /// Sampling temperature for synthesis. Rapid runs coldest.
    pub fn temperature(&self) -> f32 {
        match self {
            Self::Comprehensive => 0.4,
            Self::Focused => 0.25,
            Self::Rapid => 0.1,
        }
    }
}

impl std::fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
