//! Matching session: the state behind an interactive stone-matching screen.
//!
//! The session is a plain value driven by [`MatchingSession::update`], so a
//! front-end only has to render the current state and forward user actions as
//! [`SessionCommand`]s.

use serde::{Deserialize, Serialize};

use gemledger_core::{DomainError, DomainResult};

use crate::diamond::Diamond;
use crate::matching::{MatchedSet, MatchingCriteria, find_matches};

/// Outcome of the most recent search.
///
/// `NotSearched` and `NoMatches` are deliberately distinct: one means the user
/// has not run a search with the current criteria, the other that they did and
/// nothing matched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchState {
    #[default]
    NotSearched,
    NoMatches,
    Found {
        sets: Vec<MatchedSet>,
        /// Index into `sets`; 0 (best score) after every search.
        selected: usize,
    },
}

/// User actions on the matching screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SetCriteria(MatchingCriteria),
    Search(Vec<Diamond>),
    Select(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchingSession {
    criteria: MatchingCriteria,
    search: SearchState,
}

impl MatchingSession {
    pub fn new(criteria: MatchingCriteria) -> DomainResult<Self> {
        criteria.validate()?;
        Ok(Self {
            criteria,
            search: SearchState::NotSearched,
        })
    }

    pub fn criteria(&self) -> &MatchingCriteria {
        &self.criteria
    }

    pub fn state(&self) -> &SearchState {
        &self.search
    }

    pub fn has_searched(&self) -> bool {
        !matches!(self.search, SearchState::NotSearched)
    }

    pub fn no_matches_found(&self) -> bool {
        matches!(self.search, SearchState::NoMatches)
    }

    pub fn sets(&self) -> &[MatchedSet] {
        match &self.search {
            SearchState::Found { sets, .. } => sets,
            _ => &[],
        }
    }

    pub fn selected_set(&self) -> Option<&MatchedSet> {
        match &self.search {
            SearchState::Found { sets, selected } => sets.get(*selected),
            _ => None,
        }
    }

    /// Apply one user action. On error the session is left unchanged.
    pub fn update(&mut self, command: SessionCommand) -> DomainResult<()> {
        match command {
            SessionCommand::SetCriteria(criteria) => {
                criteria.validate()?;
                self.criteria = criteria;
                // Results from older criteria would be misleading.
                self.search = SearchState::NotSearched;
            }
            SessionCommand::Search(pool) => {
                let sets = find_matches(&pool, &self.criteria)?;
                self.search = if sets.is_empty() {
                    SearchState::NoMatches
                } else {
                    SearchState::Found { sets, selected: 0 }
                };
            }
            SessionCommand::Select(set_id) => match &mut self.search {
                SearchState::Found { sets, selected } => {
                    let idx = sets
                        .iter()
                        .position(|s| s.id == set_id)
                        .ok_or_else(DomainError::not_found)?;
                    *selected = idx;
                }
                _ => {
                    return Err(DomainError::validation(
                        "no matched sets to select from; run a search first",
                    ));
                }
            },
            SessionCommand::Reset => {
                self.search = SearchState::NotSearched;
            }
        }
        Ok(())
    }
}
