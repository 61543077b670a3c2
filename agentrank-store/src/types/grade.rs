//! Communication grades

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProgressError;

/// Unit of communication feedback. Only these four values are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Grade {
    Bad,
    Neutral,
    Good,
    Excellence,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Self::Bad, Self::Neutral, Self::Good, Self::Excellence];

    /// Score delta this grade applies
    pub fn value(self) -> i64 {
        match self {
            Self::Bad => -1,
            Self::Neutral => 1,
            Self::Good => 2,
            Self::Excellence => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bad => "bad",
            Self::Neutral => "neutral",
            Self::Good => "good",
            Self::Excellence => "excellence",
        }
    }
}

impl TryFrom<i64> for Grade {
    type Error = ProgressError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Bad),
            1 => Ok(Self::Neutral),
            2 => Ok(Self::Good),
            5 => Ok(Self::Excellence),
            other => Err(ProgressError::InvalidGrade(other)),
        }
    }
}

impl From<Grade> for i64 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the grade name or its numeric value
impl FromStr for Grade {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bad" => Ok(Self::Bad),
            "neutral" => Ok(Self::Neutral),
            "good" => Ok(Self::Good),
            "excellence" | "excellent" => Ok(Self::Excellence),
            other => {
                let value: i64 = other
                    .parse()
                    .map_err(|_| ProgressError::Serialization(format!("unknown grade: {s}")))?;
                Self::try_from(value)
            }
        }
    }
}
