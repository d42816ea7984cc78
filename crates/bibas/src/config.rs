//! Scoring configuration.
//!
//! Every knob is a named field with a documented default, so a caller whose
//! target encodes "positive" as state 0 has to say so explicitly.

use crate::error::BibasError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the source variable is brought to each of its states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Mode {
    /// Condition on `source = i` (evidence).
    #[default]
    Observe,
    /// Force `do(source = i)`, severing the source from its parents.
    Intervene,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Observe => "observe",
            Mode::Intervene => "intervene",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = BibasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observe" | "observation" => Ok(Mode::Observe),
            "intervene" | "intervention" | "do" => Ok(Mode::Intervene),
            _ => Err(BibasError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = BibasError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Options for a single pairwise score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Index of the target state whose probability shift is measured.
    pub positive_state: usize,
    pub mode: Mode,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_state: 1,
            mode: Mode::Observe,
        }
    }
}

impl ScoreConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_positive_state(mut self, state: usize) -> Self {
        self.positive_state = state;
        self
    }
}

/// Options for ranking every source against one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    #[serde(flatten)]
    pub score: ScoreConfig,
    /// Score sources on the rayon pool instead of one by one.
    pub parallel: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            score: ScoreConfig::default(),
            parallel: true,
        }
    }
}

impl RankConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            score: ScoreConfig::new(mode),
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BibasError> {
        serde_json::from_str(json).map_err(|e| BibasError::InvalidConfig(e.to_string()))
    }
}

/// What a matrix does with non-binary nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Reject the whole matrix if any node is non-binary.
    #[default]
    Strict,
    /// Mark cells whose target is non-binary as undefined.
    Lenient,
}

/// Node order used when a matrix is built over the whole network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOrder {
    /// Lexicographic by name.
    #[default]
    Sorted,
    /// Declaration order of the network.
    Network,
}

/// Options for the full pairwise matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    #[serde(flatten)]
    pub score: ScoreConfig,
    pub binary_policy: BinaryPolicy,
    pub order: NodeOrder,
    /// Score cells on the rayon pool instead of one by one.
    pub parallel: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            score: ScoreConfig::default(),
            binary_policy: BinaryPolicy::Strict,
            order: NodeOrder::Sorted,
            parallel: true,
        }
    }
}

impl MatrixConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            score: ScoreConfig::new(mode),
            ..Self::default()
        }
    }

    pub fn lenient(mut self) -> Self {
        self.binary_policy = BinaryPolicy::Lenient;
        self
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BibasError> {
        serde_json::from_str(json).map_err(|e| BibasError::InvalidConfig(e.to_string()))
    }
}
