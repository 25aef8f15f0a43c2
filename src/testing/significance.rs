//! Significance tiers for adjusted p-values

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SubtypeError;
use crate::stats::format_pvalue;

/// Significance tier of an adjusted p-value
///
/// `< 0.0001` is `***`; `< 0.001` and `< 0.01` share `**`; `< 0.05` is `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Significance {
    #[serde(rename = "")]
    NotSignificant,
    #[serde(rename = "*")]
    Weak,
    #[serde(rename = "**")]
    Moderate,
    #[serde(rename = "***")]
    Strong,
}

impl Significance {
    /// Tier for an adjusted p-value; absent values are not significant
    pub fn from_padj(padj: Option<f64>) -> Self {
        match padj {
            Some(p) if p < 0.0001 => Significance::Strong,
            Some(p) if p < 0.01 => Significance::Moderate,
            Some(p) if p < 0.05 => Significance::Weak,
            _ => Significance::NotSignificant,
        }
    }

    /// Label string; empty when not significant
    pub fn label(&self) -> &'static str {
        match self {
            Significance::NotSignificant => "",
            Significance::Weak => "*",
            Significance::Moderate => "**",
            Significance::Strong => "***",
        }
    }

    pub fn is_significant(&self) -> bool {
        *self != Significance::NotSignificant
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Significance {
    type Err = SubtypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Significance::NotSignificant),
            "*" => Ok(Significance::Weak),
            "**" => Ok(Significance::Moderate),
            "***" => Ok(Significance::Strong),
            other => Err(SubtypeError::InvalidInput {
                reason: format!("Unknown significance label '{}'", other),
            }),
        }
    }
}

/// Display string: adjusted p-value to two significant figures followed by its label
pub fn display_padj(padj: f64) -> String {
    format!("{}{}", format_pvalue(padj), Significance::from_padj(Some(padj)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(Significance::from_padj(Some(0.00001)), Significance::Strong);
        assert_eq!(Significance::from_padj(Some(0.0005)), Significance::Moderate);
        assert_eq!(Significance::from_padj(Some(0.005)), Significance::Moderate);
        assert_eq!(Significance::from_padj(Some(0.03)), Significance::Weak);
        assert_eq!(Significance::from_padj(Some(0.05)), Significance::NotSignificant);
        assert_eq!(Significance::from_padj(None), Significance::NotSignificant);
        assert_eq!(Significance::from_padj(Some(f64::NAN)), Significance::NotSignificant);
    }

    #[test]
    fn test_label_round_trip() {
        for tier in [
            Significance::NotSignificant,
            Significance::Weak,
            Significance::Moderate,
            Significance::Strong,
        ] {
            assert_eq!(tier.label().parse::<Significance>().unwrap(), tier);
        }
        assert!("****".parse::<Significance>().is_err());
    }

    #[test]
    fn test_display_padj() {
        assert_eq!(display_padj(0.0012345), "0.0012**");
        assert_eq!(display_padj(0.049535), "0.05*");
        assert_eq!(display_padj(1.0), "1");
    }
}
