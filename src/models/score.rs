use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Task fields sent to the scoring provider. Embedded verbatim in the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRequest {
    pub task_type: String,
    pub effort_description: String,
    pub ability_description: String,
}

impl ScoreRequest {
    pub fn new(
        task_type: impl Into<String>,
        effort_description: impl Into<String>,
        ability_description: impl Into<String>,
    ) -> Self {
        Self {
            task_type: task_type.into(),
            effort_description: effort_description.into(),
            ability_description: ability_description.into(),
        }
    }
}

/// Effort and ability scores, both always within `MIN_SCORE..=MAX_SCORE`.
///
/// The only way to build one is through [`ScorePair::clamped`] or the
/// [`ScorePair::FALLBACK`] constant, so out-of-range values are unrepresentable.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct ScorePair {
    effort_score: u8,
    ability_score: u8,
}

impl ScorePair {
    /// Returned whenever scoring cannot complete reliably.
    pub const FALLBACK: ScorePair = ScorePair {
        effort_score: 5,
        ability_score: 5,
    };

    pub fn clamped(effort: u32, ability: u32) -> Self {
        Self {
            effort_score: clamp_score(effort),
            ability_score: clamp_score(ability),
        }
    }

    pub fn effort_score(&self) -> u8 {
        self.effort_score
    }

    pub fn ability_score(&self) -> u8 {
        self.ability_score
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

fn clamp_score(value: u32) -> u8 {
    value.clamp(u32::from(MIN_SCORE), u32::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_pulls_values_into_range() {
        let pair = ScorePair::clamped(0, 42);
        assert_eq!(pair.effort_score(), 1);
        assert_eq!(pair.ability_score(), 10);

        let pair = ScorePair::clamped(7, 3);
        assert_eq!((pair.effort_score(), pair.ability_score()), (7, 3));
    }

    #[test]
    fn fallback_is_five_five() {
        assert_eq!(ScorePair::FALLBACK, ScorePair::clamped(5, 5));
        assert!(ScorePair::clamped(5, 5).is_fallback());
    }
}
