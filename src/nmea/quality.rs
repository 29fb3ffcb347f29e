use crate::constants::RTK_FIXED_QUALITY;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GGA fix quality indicator
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FixQuality {
    /// Invalid or no position
    #[default]
    NoFix,
    /// Autonomous GNSS fix
    Autonomous,
    /// Differential GNSS fix (SBAS, DGPS)
    Differential,
    /// PPS fix
    Pps,
    /// RTK solution with fixed ambiguities: centimeter level
    RtkFixed,
    /// RTK solution with float ambiguities: decimeter level
    RtkFloat,
    /// Dead reckoning
    DeadReckoning,
    /// Manual input mode
    Manual,
    /// Simulator
    Simulation,
    /// Vendor specific code
    Unknown(u8),
}

impl From<u8> for FixQuality {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::NoFix,
            1 => Self::Autonomous,
            2 => Self::Differential,
            3 => Self::Pps,
            RTK_FIXED_QUALITY => Self::RtkFixed,
            5 => Self::RtkFloat,
            6 => Self::DeadReckoning,
            7 => Self::Manual,
            8 => Self::Simulation,
            code => Self::Unknown(code),
        }
    }
}

impl FixQuality {
    /// Quality code, as reported by the receiver
    pub fn code(&self) -> u8 {
        match self {
            Self::NoFix => 0,
            Self::Autonomous => 1,
            Self::Differential => 2,
            Self::Pps => 3,
            Self::RtkFixed => RTK_FIXED_QUALITY,
            Self::RtkFloat => 5,
            Self::DeadReckoning => 6,
            Self::Manual => 7,
            Self::Simulation => 8,
            Self::Unknown(code) => *code,
        }
    }

    /// True if this is an RTK fixed solution,
    /// the only quality that advances the survey.
    pub fn is_rtk_fixed(&self) -> bool {
        *self == Self::RtkFixed
    }
}

impl std::fmt::Display for FixQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFix => write!(f, "no-fix"),
            Self::Autonomous => write!(f, "autonomous"),
            Self::Differential => write!(f, "differential"),
            Self::Pps => write!(f, "pps"),
            Self::RtkFixed => write!(f, "rtk-fixed"),
            Self::RtkFloat => write!(f, "rtk-float"),
            Self::DeadReckoning => write!(f, "dead-reckoning"),
            Self::Manual => write!(f, "manual"),
            Self::Simulation => write!(f, "simulation"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

#[cfg(test)]
mod test {
    use super::FixQuality;

    #[test]
    fn quality_codes() {
        for code in 0..=12_u8 {
            let quality = FixQuality::from(code);
            assert_eq!(quality.code(), code);
            assert_eq!(quality.is_rtk_fixed(), code == 4);
        }
        assert_eq!(FixQuality::from(5), FixQuality::RtkFloat);
        assert_eq!(FixQuality::from(9), FixQuality::Unknown(9));
    }
}
