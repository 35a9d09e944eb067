//! Movie / source selection state
//!
//! The dashboard browses reviews either by movie or by source. At most one
//! entity is selected at a time; `Selection` being a single tagged value makes
//! that structural. Transitions are pure: each returns a new state.
//!
//! Every transition bumps `generation`. A review fetch records the generation
//! it started under, and its result is dropped if the generation has moved on
//! by the time it completes, so the latest request wins over the latest
//! response.

use mrv_common::models::Review;
use serde::{Deserialize, Serialize};

use crate::sources::review_domain;

/// Which list the operator is browsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseMode {
    #[default]
    ByMovie,
    BySource,
}

/// Currently selected entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    /// Movie ems_id
    Movie(String),
    /// Source domain
    Source(String),
}

/// Browse mode, selection and request generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub mode: BrowseMode,
    pub selection: Selection,
    pub generation: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a movie; any source selection is cleared
    pub fn select_movie(&self, ems_id: impl Into<String>) -> Self {
        self.transition(self.mode, Selection::Movie(ems_id.into()))
    }

    /// Select a source domain; any movie selection is cleared
    pub fn select_source(&self, domain: impl Into<String>) -> Self {
        self.transition(self.mode, Selection::Source(domain.into()))
    }

    /// Switch browse mode; both selections are cleared
    pub fn switch_mode(&self, mode: BrowseMode) -> Self {
        self.transition(mode, Selection::None)
    }

    fn transition(&self, mode: BrowseMode, selection: Selection) -> Self {
        Self {
            mode,
            selection,
            generation: self.generation.wrapping_add(1),
        }
    }

    pub fn selected_movie(&self) -> Option<&str> {
        match &self.selection {
            Selection::Movie(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_source(&self) -> Option<&str> {
        match &self.selection {
            Selection::Source(domain) => Some(domain),
            _ => None,
        }
    }

    /// Whether a result fetched under `generation` still belongs to this state
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Reviews visible under the current selection
    ///
    /// Movie: exact movie_id match. Source: same domain extraction as the
    /// aggregation. Nothing selected: empty.
    pub fn filter_reviews<'a>(&self, reviews: &'a [Review]) -> Vec<&'a Review> {
        match &self.selection {
            Selection::None => Vec::new(),
            Selection::Movie(ems_id) => reviews.iter().filter(|r| &r.movie_id == ems_id).collect(),
            Selection::Source(domain) => reviews
                .iter()
                .filter(|r| review_domain(r).as_deref() == Some(domain.as_str()))
                .collect(),
        }
    }
}
