use crate::cfg::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How RTK fixed samples accumulate towards a stable survey.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FixPolicy {
    /// Every RTK fixed sample counts towards the required fix duration,
    /// whatever happened in between. Loss of fix only pauses the accumulation.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "cumulative"))]
    Cumulative,
    /// Only the ongoing uninterrupted run of RTK fixed samples counts.
    /// Any non fixed tick discards the window accumulated so far.
    #[cfg_attr(feature = "serde", serde(alias = "contiguous"))]
    Contiguous,
}

impl std::fmt::Display for FixPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cumulative => write!(f, "cumulative"),
            Self::Contiguous => write!(f, "contiguous"),
        }
    }
}

impl std::str::FromStr for FixPolicy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cumulative" => Ok(Self::Cumulative),
            "contiguous" => Ok(Self::Contiguous),
            _ => Err(Error::UnknownFixPolicy(s.to_string())),
        }
    }
}

/// Sign convention applied to decoded coordinates.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LongitudeConvention {
    /// Apply the N/S and E/W hemisphere indicators of the sentence.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "hemisphere"))]
    Hemisphere,
    /// Latitude is always positive and longitude always negated,
    /// whatever the indicators say. Only valid for northern/western
    /// hemisphere deployments.
    #[cfg_attr(feature = "serde", serde(alias = "always_west", alias = "west"))]
    AlwaysWest,
}

impl std::fmt::Display for LongitudeConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hemisphere => write!(f, "hemisphere"),
            Self::AlwaysWest => write!(f, "always-west"),
        }
    }
}

impl std::str::FromStr for LongitudeConvention {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hemisphere" => Ok(Self::Hemisphere),
            "always-west" | "always_west" | "west" => Ok(Self::AlwaysWest),
            _ => Err(Error::UnknownLongitudeConvention(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FixPolicy, LongitudeConvention};
    use std::str::FromStr;

    #[test]
    fn policy_parsing() {
        for (desc, expected) in [
            ("cumulative", FixPolicy::Cumulative),
            (" Contiguous", FixPolicy::Contiguous),
        ] {
            let policy = FixPolicy::from_str(desc).unwrap();
            assert_eq!(policy, expected);
            assert_eq!(FixPolicy::from_str(&policy.to_string()).unwrap(), policy);
        }
        assert!(FixPolicy::from_str("sliding").is_err());
    }

    #[test]
    fn convention_parsing() {
        assert_eq!(
            LongitudeConvention::from_str("always-west").unwrap(),
            LongitudeConvention::AlwaysWest
        );
        assert_eq!(
            LongitudeConvention::from_str("Hemisphere").unwrap(),
            LongitudeConvention::Hemisphere
        );
        assert!(LongitudeConvention::from_str("east").is_err());
    }
}
