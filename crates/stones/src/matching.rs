//! Stone-matching engine.
//!
//! Groups available diamonds into sets (pairs, suites) whose carat weights lie
//! within a tolerance of a base stone and whose grades agree per attribute, then
//! ranks the sets by a homogeneity score.
//!
//! Discovery is greedy and deterministic:
//! - shapes are processed in order of first appearance in the pool,
//! - each shape group is stably sorted by carat (ascending),
//! - every stone in turn is tried as a base; once a set is emitted the scan
//!   skips past as many positions as the set consumed.

use serde::{Deserialize, Serialize};

use gemledger_core::{DomainError, DomainResult, ValueObject};

use crate::diamond::{Diamond, Shape};
use crate::grade::{MatchMode, grade_penalty};

/// Shape restriction for a matching run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeFilter {
    #[default]
    Any,
    Only(Shape),
}

impl ShapeFilter {
    pub fn allows(self, shape: Shape) -> bool {
        match self {
            ShapeFilter::Any => true,
            ShapeFilter::Only(s) => s == shape,
        }
    }
}

/// Criteria for a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingCriteria {
    pub shape: ShapeFilter,
    /// Allowed carat deviation from the base stone, in percent of the base weight.
    pub carat_tolerance: f64,
    pub color_match: MatchMode,
    pub clarity_match: MatchMode,
    pub cut_match: MatchMode,
    /// Smallest set worth reporting (2 = pairs).
    pub min_set_size: usize,
}

impl Default for MatchingCriteria {
    fn default() -> Self {
        Self {
            shape: ShapeFilter::Any,
            carat_tolerance: 5.0,
            color_match: MatchMode::Similar,
            clarity_match: MatchMode::Similar,
            cut_match: MatchMode::Similar,
            min_set_size: 2,
        }
    }
}

impl ValueObject for MatchingCriteria {}

impl MatchingCriteria {
    pub fn validate(&self) -> DomainResult<()> {
        if self.min_set_size < 2 {
            return Err(DomainError::validation("minimum set size must be at least 2"));
        }
        if !(self.carat_tolerance.is_finite() && self.carat_tolerance >= 0.0) {
            return Err(DomainError::validation(
                "carat tolerance must be a finite, non-negative percentage",
            ));
        }
        Ok(())
    }

    /// Whether `candidate` may join a set anchored on `base`.
    pub fn accepts(&self, base: &Diamond, candidate: &Diamond) -> bool {
        carat_difference_pct(base, candidate) <= self.carat_tolerance
            && self.color_match.accepts(base.color, candidate.color)
            && self.clarity_match.accepts(base.clarity, candidate.clarity)
            && self.cut_match.accepts(base.cut, candidate.cut)
    }
}

/// A group of mutually compatible diamonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSet {
    /// `set-N`, N being the 1-based discovery order.
    pub id: String,
    pub shape: Shape,
    /// Base stone first.
    pub diamonds: Vec<Diamond>,
    pub total_carats: f64,
    /// Mean retail price (smallest currency unit).
    pub average_price: f64,
    /// Homogeneity in `[0, 100]`; higher is a closer match.
    pub match_score: f64,
}

impl MatchedSet {
    fn from_members(id: String, shape: Shape, diamonds: Vec<Diamond>) -> Self {
        let total_carats = diamonds.iter().map(|d| d.carat).sum();
        let average_price = if diamonds.is_empty() {
            0.0
        } else {
            diamonds.iter().map(|d| d.retail_price as f64).sum::<f64>() / diamonds.len() as f64
        };
        let match_score = match_score(&diamonds);

        Self {
            id,
            shape,
            diamonds,
            total_carats,
            average_price,
            match_score,
        }
    }

    pub fn len(&self) -> usize {
        self.diamonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diamonds.is_empty()
    }

    pub fn base(&self) -> Option<&Diamond> {
        self.diamonds.first()
    }
}

/// Carat deviation of `other` from `base`, in percent of the base weight.
///
/// The base must have passed [`Diamond::check_magnitude`].
pub fn carat_difference_pct(base: &Diamond, other: &Diamond) -> f64 {
    (base.carat - other.carat).abs() / base.carat * 100.0
}

/// Heuristic homogeneity score for a set, base first.
///
/// Starts at 100; every member after the base costs twice its carat deviation
/// (in percent) plus 5 per similar grade and 15 per dissimilar grade. Clamped to
/// `[0, 100]`. Sets of fewer than two stones score 0.
pub fn match_score(diamonds: &[Diamond]) -> f64 {
    let Some((base, rest)) = diamonds.split_first() else {
        return 0.0;
    };
    if rest.is_empty() {
        return 0.0;
    }

    let mut score = 100.0;
    for member in rest {
        score -= carat_difference_pct(base, member) * 2.0;
        score -= grade_penalty(base.color, member.color);
        score -= grade_penalty(base.clarity, member.clarity);
        score -= grade_penalty(base.cut, member.cut);
    }

    score.clamp(0.0, 100.0)
}

/// Find matched sets in `pool`, best score first.
///
/// Unavailable stones never match. Stones with an unusable carat weight are
/// rejected individually (logged) without failing the run. The only error is
/// invalid criteria; an empty pool or an oversized minimum yields no sets.
pub fn find_matches(pool: &[Diamond], criteria: &MatchingCriteria) -> DomainResult<Vec<MatchedSet>> {
    criteria.validate()?;

    let groups = group_candidates(pool, criteria);
    let candidates: usize = groups.iter().map(|(_, g)| g.len()).sum();

    let mut sets: Vec<MatchedSet> = Vec::new();

    for (shape, mut group) in groups {
        tracing::debug!(%shape, diamonds = group.len(), "processing shape group");

        if group.len() < criteria.min_set_size {
            tracing::debug!(
                %shape,
                diamonds = group.len(),
                min_set_size = criteria.min_set_size,
                "not enough diamonds for a set"
            );
            continue;
        }

        // Stable: equal weights keep pool order.
        group.sort_by(|a, b| a.carat.total_cmp(&b.carat));

        let mut i = 0;
        while i < group.len() {
            let base = group[i];
            let mut members: Vec<&Diamond> = vec![base];

            for (j, &candidate) in group.iter().enumerate() {
                if j != i && criteria.accepts(base, candidate) {
                    members.push(candidate);
                }
            }

            if members.len() >= criteria.min_set_size {
                let consumed = members.len();
                let set = MatchedSet::from_members(
                    format!("set-{}", sets.len() + 1),
                    shape,
                    members.into_iter().cloned().collect(),
                );
                tracing::debug!(
                    set_id = %set.id,
                    diamonds = set.len(),
                    score = set.match_score,
                    "found matching set"
                );
                sets.push(set);

                // Greedy: don't rediscover the same cluster from its other members.
                i += consumed - 1;
            }

            i += 1;
        }
    }

    sets.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

    tracing::info!(sets = sets.len(), candidates, "stone matching finished");

    Ok(sets)
}

/// Available, well-formed stones allowed by the shape filter, grouped by shape
/// in order of first appearance.
fn group_candidates<'a>(
    pool: &'a [Diamond],
    criteria: &MatchingCriteria,
) -> Vec<(Shape, Vec<&'a Diamond>)> {
    let mut groups: Vec<(Shape, Vec<&Diamond>)> = Vec::new();

    for diamond in pool {
        if !diamond.is_available() || !criteria.shape.allows(diamond.shape) {
            continue;
        }
        if let Err(err) = diamond.check_magnitude() {
            tracing::warn!(diamond_id = %diamond.id, error = %err, "diamond rejected from matching");
            continue;
        }

        match groups.iter_mut().find(|(shape, _)| *shape == diamond.shape) {
            Some((_, group)) => group.push(diamond),
            None => groups.push((diamond.shape, vec![diamond])),
        }
    }

    groups
}
