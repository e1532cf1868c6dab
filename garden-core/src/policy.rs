//! Growth decision policy.
//!
//! A policy looks at one lineage and picks its next [`Action`]. The engine
//! is generic over [`GrowthPolicy`] so tests can force specific actions.

use rand::Rng;

use crate::config::GrowthConfig;
use crate::lineage::{Action, StemLineage};

/// Chooses the next action for a growing lineage.
pub trait GrowthPolicy {
    /// ### Parameters
    /// - `lineage` - The lineage about to act; always still growing.
    /// - `cycle` - Index of the current growth cycle.
    /// - `rng` - Random source for stochastic policies.
    fn decide<R: Rng>(&self, lineage: &StemLineage, cycle: usize, rng: &mut R) -> Action;
}

/// Unnormalized action weights for one decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionWeights {
    pub grow: f32,
    pub split: f32,
    pub flower: f32,
}

impl ActionWeights {
    pub fn total(&self) -> f32 {
        self.grow + self.split + self.flower
    }
}

/// The height-driven weighted policy used for real plants.
///
/// Rules, in priority order:
/// 1. Below `early_growth_progress` of the height budget, always grow.
/// 2. Within three segments of a split, grow with a high fixed chance.
/// 3. Otherwise sample grow / split / flower from [`WeightedPolicy::weights`].
#[derive(Clone, Copy, Debug)]
pub struct WeightedPolicy {
    cfg: GrowthConfig,
}

impl WeightedPolicy {
    pub fn new(cfg: GrowthConfig) -> Self {
        Self { cfg }
    }

    pub fn can_split(&self, lineage: &StemLineage) -> bool {
        lineage.current_height - lineage.last_split_height >= self.cfg.min_split_spacing
    }

    pub fn can_flower(&self, lineage: &StemLineage) -> bool {
        lineage.last_action != Action::Flower
    }

    /// Computes the unnormalized weights of rule 3.
    ///
    /// - grow: `max(floor, base - progress)`
    /// - split: `min(cap, progress * rate) * decay^depth`, zero when splitting
    ///   is blocked by spacing or depth
    /// - flower: `min(cap, progress)`, zero right after a flower
    pub fn weights(&self, lineage: &StemLineage) -> ActionWeights {
        let cfg = &self.cfg;
        let progress = lineage.progress();

        let grow = (cfg.grow_weight_base - progress).max(cfg.grow_weight_floor);

        let split = if self.can_split(lineage) && lineage.split_depth < cfg.max_split_depth {
            (progress * cfg.split_weight_rate).min(cfg.split_weight_cap)
                * cfg.split_depth_decay.powi(lineage.split_depth as i32)
        } else {
            0.0
        };

        let flower = if self.can_flower(lineage) {
            progress.min(cfg.flower_weight_cap)
        } else {
            0.0
        };

        ActionWeights { grow, split, flower }
    }
}

impl GrowthPolicy for WeightedPolicy {
    fn decide<R: Rng>(&self, lineage: &StemLineage, _cycle: usize, rng: &mut R) -> Action {
        if lineage.progress() < self.cfg.early_growth_progress {
            return Action::Grow;
        }

        if let Some(&chance) = self
            .cfg
            .post_split_grow_chance
            .get(lineage.segments_since_split as usize)
            && rng.random::<f32>() < chance
        {
            return Action::Grow;
        }

        let w = self.weights(lineage);
        let total = w.total();
        if total <= 0.0 {
            return Action::Grow;
        }

        let grow = w.grow / total;
        let split = w.split / total;
        let draw = rng.random::<f32>();

        if draw < grow {
            Action::Grow
        } else if draw < grow + split {
            Action::Split
        } else if self.can_flower(lineage) {
            Action::Flower
        } else {
            Action::Grow
        }
    }
}

/// A policy that always returns the same action.
#[derive(Clone, Copy, Debug)]
pub struct FixedPolicy(pub Action);

impl GrowthPolicy for FixedPolicy {
    fn decide<R: Rng>(&self, _lineage: &StemLineage, _cycle: usize, _rng: &mut R) -> Action {
        self.0
    }
}
