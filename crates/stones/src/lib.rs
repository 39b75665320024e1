//! Stone inventory module: diamonds, grade rank scales and the stone-matching
//! engine.
//!
//! Pure domain logic only: no IO, no persistence. Callers hand in the pool of
//! diamonds and get matched sets back.

pub mod diamond;
pub mod grade;
pub mod matching;
pub mod session;

pub use diamond::{CertificationLab, Diamond, DiamondId, InventoryStatus, Shape};
pub use grade::{ClarityGrade, ColorGrade, CutGrade, Grade, MatchMode, grade_penalty};
pub use matching::{
    MatchedSet, MatchingCriteria, ShapeFilter, carat_difference_pct, find_matches, match_score,
};
pub use session::{MatchingSession, SearchState, SessionCommand};
