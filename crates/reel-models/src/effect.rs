//! Detected visual effects.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Fixed vocabulary of effects the detector can report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectLabel {
    RapidTransitions,
    ColorFilters,
    TextOverlay,
    SlowMotion,
}

impl EffectLabel {
    pub const ALL: &'static [EffectLabel] = &[
        EffectLabel::RapidTransitions,
        EffectLabel::ColorFilters,
        EffectLabel::TextOverlay,
        EffectLabel::SlowMotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectLabel::RapidTransitions => "rapid transitions",
            EffectLabel::ColorFilters => "color filters",
            EffectLabel::TextOverlay => "text overlay",
            EffectLabel::SlowMotion => "slow motion",
        }
    }
}

impl fmt::Display for EffectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grow-only set of effect labels.
///
/// There is deliberately no removal API: once a label is observed during a pass
/// it stays in the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EffectSet(BTreeSet<EffectLabel>);

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label. Returns `true` if it was not present yet.
    pub fn insert(&mut self, label: EffectLabel) -> bool {
        self.0.insert(label)
    }

    pub fn contains(&self, label: EffectLabel) -> bool {
        self.0.contains(&label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EffectLabel> + '_ {
        self.0.iter().copied()
    }

    pub fn is_superset(&self, other: &EffectSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<EffectLabel> for EffectSet {
    fn from_iter<I: IntoIterator<Item = EffectLabel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
