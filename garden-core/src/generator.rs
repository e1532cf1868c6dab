use glam::Vec2;
use rand::Rng;

use crate::config::GrowthConfig;
use crate::engine::{GrowthReport, LineageEngine};
use crate::lineage::StemLineage;
use crate::plant::PlantStructure;
use crate::policy::{GrowthPolicy, WeightedPolicy};
use crate::types::StemVariant;

/// A freshly generated, still invisible plant.
#[derive(Clone, Debug)]
pub struct GeneratedPlant {
    pub structure: PlantStructure,
    pub report: GrowthReport,
}

/// Produces complete plant structures before any animation starts.
#[derive(Clone, Debug)]
pub struct PlantGenerator<P = WeightedPolicy> {
    engine: LineageEngine<P>,
    cfg: GrowthConfig,
}

impl PlantGenerator<WeightedPolicy> {
    pub fn new(cfg: GrowthConfig) -> Self {
        Self::with_policy(WeightedPolicy::new(cfg), cfg)
    }
}

impl<P: GrowthPolicy> PlantGenerator<P> {
    pub fn with_policy(policy: P, cfg: GrowthConfig) -> Self {
        Self {
            engine: LineageEngine::new(policy, cfg),
            cfg,
        }
    }

    /// Generates one plant rooted at `origin`.
    ///
    /// A stem variant is chosen uniformly, then a single root lineage with
    /// `max_height = target_height` is grown to completion. The whole call
    /// is synchronous; the same RNG state always yields the same plant.
    ///
    /// ### Parameters
    /// - `origin` - Seed position on the ground line (canvas space).
    /// - `target_height` - Height budget of the root lineage.
    /// - `rng` - Random source for variant choice and growth.
    pub fn pre_generate<R: Rng>(
        &self,
        origin: Vec2,
        target_height: f32,
        rng: &mut R,
    ) -> GeneratedPlant {
        let variant = StemVariant::ALL[rng.random_range(0..StemVariant::ALL.len())];
        let mut structure = PlantStructure::new(origin, variant);
        let root = StemLineage::new_root(
            origin.x,
            target_height,
            variant,
            self.cfg.min_split_spacing,
        );

        let report = self.engine.generate(&mut structure, root, rng);
        GeneratedPlant { structure, report }
    }
}
