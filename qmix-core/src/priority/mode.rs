use crate::error::QmixError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Policy turning td-errors into sampling priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PrioritizationMode {
    /// Equal priority for every episode.
    #[serde(rename = "UNIFORM")]
    Uniform,

    /// Priority proportional to `rank^-alpha`, episodes ranked by descending td-error.
    #[serde(rename = "RANK-BASED")]
    RankBased,

    /// Priority proportional to `|td_error| + eps`.
    #[serde(rename = "PROPORTIONAL")]
    Proportional,
}

impl FromStr for PrioritizationMode {
    type Err = QmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNIFORM" => Ok(Self::Uniform),
            "RANK-BASED" => Ok(Self::RankBased),
            "PROPORTIONAL" => Ok(Self::Proportional),
            _ => Err(QmixError::UnsupportedPrioritization(s.to_string())),
        }
    }
}

impl fmt::Display for PrioritizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uniform => "UNIFORM",
            Self::RankBased => "RANK-BASED",
            Self::Proportional => "PROPORTIONAL",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        for mode in [
            PrioritizationMode::Uniform,
            PrioritizationMode::RankBased,
            PrioritizationMode::Proportional,
        ] {
            assert_eq!(mode.to_string().parse::<PrioritizationMode>(), Ok(mode));
        }
        assert_eq!(
            "BSU".parse::<PrioritizationMode>(),
            Err(QmixError::UnsupportedPrioritization("BSU".to_string()))
        );
    }
}
