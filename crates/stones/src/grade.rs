//! Ordinal grade scales (color, clarity, cut) and how they compare.
//!
//! Every scale is an explicit, total rank table: each grade a diamond can carry
//! has exactly one rank, higher is better. "Similar" grades are at most one rank
//! apart.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use gemledger_core::{DomainError, ValueObject};

/// An ordinal grade drawn from a fixed rank scale.
pub trait Grade: Copy + Eq + core::fmt::Debug {
    /// Position on the scale (best grade has the highest rank).
    fn rank(self) -> u8;

    /// Trade label, e.g. `"VVS1"` or `"Very Good"`.
    fn label(self) -> &'static str;

    fn rank_distance(self, other: Self) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    fn is_similar(self, other: Self) -> bool {
        self.rank_distance(other) <= 1
    }
}

macro_rules! grade_scale {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => ($label:literal, $rank:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every grade on the scale, best first.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl Grade for $name {
            fn rank(self) -> u8 {
                match self {
                    $($name::$variant => $rank,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl ValueObject for $name {}

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|g| g.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| DomainError::validation(format!("unknown {} grade '{s}'", $kind)))
            }
        }
    };
}

grade_scale! {
    /// GIA color scale, colorless (D) to tinted (Z+).
    ColorGrade, "color" {
        D => ("D", 10),
        E => ("E", 9),
        F => ("F", 8),
        G => ("G", 7),
        H => ("H", 6),
        I => ("I", 5),
        J => ("J", 4),
        K => ("K", 3),
        L => ("L", 2),
        M => ("M", 1),
        ZPlus => ("Z+", 0),
    }
}

grade_scale! {
    /// Clarity scale, flawless to heavily included.
    ClarityGrade, "clarity" {
        FL => ("FL", 10),
        IF => ("IF", 9),
        VVS1 => ("VVS1", 8),
        VVS2 => ("VVS2", 7),
        VS1 => ("VS1", 6),
        VS2 => ("VS2", 5),
        SI1 => ("SI1", 4),
        SI2 => ("SI2", 3),
        I1 => ("I1", 2),
        I2 => ("I2", 1),
        I3 => ("I3", 0),
    }
}

grade_scale! {
    /// Cut scale.
    CutGrade, "cut" {
        Excellent => ("Excellent", 4),
        VeryGood => ("Very Good", 3),
        Good => ("Good", 2),
        Fair => ("Fair", 1),
        Poor => ("Poor", 0),
    }
}

/// How strictly one grade attribute must agree with the base diamond.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    #[default]
    Similar,
    Any,
}

impl MatchMode {
    pub fn accepts<G: Grade>(self, base: G, candidate: G) -> bool {
        match self {
            MatchMode::Exact => base == candidate,
            MatchMode::Similar => base.is_similar(candidate),
            MatchMode::Any => true,
        }
    }
}

impl ValueObject for MatchMode {}

/// Score penalty for one grade of a set member relative to the base.
pub fn grade_penalty<G: Grade>(base: G, member: G) -> f64 {
    if base == member {
        0.0
    } else if base.is_similar(member) {
        5.0
    } else {
        15.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_strictly_descending<G: Grade>(all: &[G]) {
        for pair in all.windows(2) {
            assert!(
                pair[0].rank() > pair[1].rank(),
                "{:?} should outrank {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn rank_tables_are_total_and_ordered() {
        assert_eq!(ColorGrade::ALL.len(), 11);
        assert_eq!(ClarityGrade::ALL.len(), 11);
        assert_eq!(CutGrade::ALL.len(), 5);

        assert_strictly_descending(ColorGrade::ALL);
        assert_strictly_descending(ClarityGrade::ALL);
        assert_strictly_descending(CutGrade::ALL);

        assert_eq!(ColorGrade::D.rank(), 10);
        assert_eq!(ColorGrade::ZPlus.rank(), 0);
        assert_eq!(ClarityGrade::FL.rank(), 10);
        assert_eq!(ClarityGrade::I3.rank(), 0);
        assert_eq!(CutGrade::Excellent.rank(), 4);
        assert_eq!(CutGrade::Poor.rank(), 0);
    }

    #[test]
    fn similarity_is_one_rank() {
        assert!(ColorGrade::G.is_similar(ColorGrade::H));
        assert!(ColorGrade::G.is_similar(ColorGrade::G));
        assert!(!ColorGrade::G.is_similar(ColorGrade::I));
        assert!(ClarityGrade::VS1.is_similar(ClarityGrade::VVS2));
        assert!(!ClarityGrade::VS1.is_similar(ClarityGrade::SI1));
        assert!(CutGrade::VeryGood.is_similar(CutGrade::Excellent));
    }

    #[test]
    fn similarity_is_symmetric() {
        for a in ClarityGrade::ALL {
            for b in ClarityGrade::ALL {
                assert_eq!(a.is_similar(*b), b.is_similar(*a));
            }
        }
    }

    #[test]
    fn match_modes() {
        assert!(MatchMode::Exact.accepts(CutGrade::Good, CutGrade::Good));
        assert!(!MatchMode::Exact.accepts(CutGrade::Good, CutGrade::VeryGood));
        assert!(MatchMode::Similar.accepts(CutGrade::Good, CutGrade::VeryGood));
        assert!(!MatchMode::Similar.accepts(CutGrade::Good, CutGrade::Excellent));
        assert!(MatchMode::Any.accepts(CutGrade::Poor, CutGrade::Excellent));
    }

    #[test]
    fn penalties() {
        assert_eq!(grade_penalty(ColorGrade::F, ColorGrade::F), 0.0);
        assert_eq!(grade_penalty(ColorGrade::F, ColorGrade::G), 5.0);
        assert_eq!(grade_penalty(ColorGrade::F, ColorGrade::J), 15.0);
    }

    #[test]
    fn labels_parse_and_serialize() {
        assert_eq!("Very Good".parse::<CutGrade>().unwrap(), CutGrade::VeryGood);
        assert_eq!("vvs1".parse::<ClarityGrade>().unwrap(), ClarityGrade::VVS1);
        assert_eq!("Z+".parse::<ColorGrade>().unwrap(), ColorGrade::ZPlus);
        assert!(matches!(
            "Q".parse::<ColorGrade>(),
            Err(DomainError::Validation(_))
        ));

        assert_eq!(serde_json::to_string(&CutGrade::VeryGood).unwrap(), "\"Very Good\"");
        assert_eq!(
            serde_json::from_str::<ColorGrade>("\"Z+\"").unwrap(),
            ColorGrade::ZPlus
        );
        assert_eq!(ClarityGrade::SI2.to_string(), "SI2");
    }
}
