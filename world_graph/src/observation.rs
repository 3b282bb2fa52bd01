//! Observation definitions - snapshots of the environment as reported by the game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{GraphError, Result};

/// One environment snapshot: where the agent is, what it carries, what it can
/// see, and what it may try next.
///
/// Observations are inbound data from the game adapter; the store never hands
/// them back out. Incidental formatting (whitespace, ordering, duplicates) is
/// tolerated here and erased during canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Name of the current location as the environment reports it.
    pub location: String,

    /// Items the agent is carrying.
    pub inventory: Vec<String>,

    /// Items visible at the current location.
    pub visible_items: Vec<String>,

    /// Actions the environment offers from this state.
    pub available_actions: Vec<String>,

    /// Current score. A mutable attribute of the state, not part of its
    /// identity under the default fingerprint policy.
    pub score: i64,

    /// Whether the game reported this state as terminal.
    pub terminal: bool,

    /// Whether the terminal state is a win.
    pub victory: bool,
}

impl Observation {
    /// Create an observation at the given location with no items or actions.
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            inventory: Vec::new(),
            visible_items: Vec::new(),
            available_actions: Vec::new(),
            score: 0,
            terminal: false,
            victory: false,
        }
    }

    /// Add an inventory item.
    pub fn with_inventory(mut self, item: impl Into<String>) -> Self {
        self.inventory.push(item.into());
        self
    }

    /// Add a visible item.
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.visible_items.push(item.into());
        self
    }

    /// Add an available action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.available_actions.push(action.into());
        self
    }

    /// Add multiple available actions.
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Set the score.
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    /// Mark the observation as terminal, optionally as a victory.
    pub fn with_terminal(mut self, victory: bool) -> Self {
        self.terminal = true;
        self.victory = victory;
        self
    }

    /// Check that the observation is well-formed.
    ///
    /// The location must contain visible text and every offered action must be
    /// non-blank. Duplicate entries are legal; canonicalization collapses them.
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(GraphError::Validation("location must not be empty".into()));
        }
        for action in &self.available_actions {
            if action.trim().is_empty() {
                return Err(GraphError::Validation(
                    "available actions must not be blank".into(),
                ));
            }
        }
        for item in self.inventory.iter().chain(&self.visible_items) {
            if item.trim().is_empty() {
                return Err(GraphError::Validation("item names must not be blank".into()));
            }
        }
        Ok(())
    }

    /// The action set after canonicalization: trimmed, whitespace-collapsed,
    /// deduplicated, sorted.
    pub fn canonical_actions(&self) -> BTreeSet<String> {
        canonical_set(&self.available_actions)
    }
}

/// Collapse a free-text field: trim and squeeze inner whitespace runs.
pub(crate) fn canonical_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize a list of names into a sorted, deduplicated set.
pub(crate) fn canonical_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| canonical_text(v))
        .filter(|v| !v.is_empty())
        .collect()
}
