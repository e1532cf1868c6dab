//! Session configuration.
//!
//! Every tunable of the garden lives here, grouped by concern. Defaults match
//! the shipped experience; [`GardenConfig::load`] layers files and
//! `GARDEN_`-prefixed environment variables on top of them.

use config::{Config, Environment, File};
use glam::Vec2;
use serde::Deserialize;

use crate::error::GardenError;
use crate::types::Millis;

/// Parameters of the procedural growth algorithm.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Height of one stem segment.
    pub segment_height: f32,
    /// Default plant height for click-planted seeds.
    pub target_height: f32,
    /// Safety cap on growth cycles per plant.
    pub max_cycles: usize,
    /// Height progress below which a lineage always grows.
    pub early_growth_progress: f32,
    /// Grow probabilities for 0, 1 and 2 segments since the last split.
    pub post_split_grow_chance: [f32; 3],
    /// Minimum height between two splits of one lineage.
    pub min_split_spacing: f32,
    /// Grow weight is `grow_weight_base - progress`, at least `grow_weight_floor`.
    pub grow_weight_base: f32,
    pub grow_weight_floor: f32,
    /// Split weight is `progress * split_weight_rate`, at most `split_weight_cap`.
    pub split_weight_rate: f32,
    pub split_weight_cap: f32,
    /// Flower weight is `progress`, at most `flower_weight_cap`.
    pub flower_weight_cap: f32,
    /// Lineages at this depth or deeper never split.
    pub max_split_depth: u32,
    /// Multiplier applied to the split weight per depth level.
    pub split_depth_decay: f32,
    /// Horizontal offset of the near-vertical child after a split.
    pub steep_offset: f32,
    /// Horizontal offset of the diagonal child after a split.
    pub shallow_offset: f32,
    /// Upper bound of the height budget lost by the steep child.
    pub steep_height_loss: f32,
    /// Upper bound of the height budget lost by the shallow child.
    pub shallow_height_loss: f32,
    /// Distance from the stem to the center of a flower branch cluster.
    pub flower_branch_reach: f32,
    /// Horizontal distance between balloons of a flower branch.
    pub flower_spacing: f32,
    /// Full range of the vertical jitter of flower branch balloons.
    pub flower_jitter: f32,
    /// Horizontal distance between balloons of a terminal crown.
    pub crown_spacing: f32,
    /// Height of a crown's balloons above the final tip.
    pub crown_lift: f32,
    /// Full range of the vertical jitter of crown balloons.
    pub crown_jitter: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            segment_height: 8.0,
            target_height: 170.0,
            max_cycles: 50,
            early_growth_progress: 0.1,
            post_split_grow_chance: [0.95, 0.85, 0.75],
            min_split_spacing: 16.0,
            grow_weight_base: 0.6,
            grow_weight_floor: 0.2,
            split_weight_rate: 0.8,
            split_weight_cap: 0.4,
            flower_weight_cap: 0.5,
            max_split_depth: 3,
            split_depth_decay: 0.7,
            steep_offset: 1.0,
            shallow_offset: 4.0,
            steep_height_loss: 10.0,
            shallow_height_loss: 20.0,
            flower_branch_reach: 12.0,
            flower_spacing: 8.0,
            flower_jitter: 6.0,
            crown_spacing: 10.0,
            crown_lift: 15.0,
            crown_jitter: 8.0,
        }
    }
}

/// Canvas geometry.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub canvas_size: Vec2,
    /// Canvas y of the ground line; plants grow upwards from here.
    pub ground_y: f32,
    /// Half extents used to hit-test gifts and gems.
    pub reward_half_size: Vec2,
    /// Where scripted seeds start before `plant_seed`.
    pub script_seed: Vec2,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_size: Vec2::new(640.0, 480.0),
            ground_y: 190.0,
            reward_half_size: Vec2::new(8.0, 8.0),
            script_seed: Vec2::new(320.0, 50.0),
        }
    }
}

/// Admission control counters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Seeds available to the player at session start.
    pub seeds: u32,
    pub max_plants_per_session: usize,
    pub max_active_stems: usize,
    /// Reward ids cycle through `1..=reward_count`.
    pub reward_count: u32,
    /// Place a gem reward below every finished plant.
    pub gems_enabled: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            seeds: 18,
            max_plants_per_session: 20,
            max_active_stems: 50,
            reward_count: 18,
            gems_enabled: false,
        }
    }
}

/// Animation durations, all in milliseconds.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub reveal_interval: Millis,
    pub intro_slide: Millis,
    pub ending_slide: Millis,
    pub seed_fall: Millis,
    pub ending_spawn_min: Millis,
    pub ending_spawn_max: Millis,
    pub zoom_in: Millis,
    pub zoom_out: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reveal_interval: 50,
            intro_slide: 1200,
            ending_slide: 1500,
            seed_fall: 500,
            ending_spawn_min: 250,
            ending_spawn_max: 500,
            zoom_in: 1000,
            zoom_out: 800,
        }
    }
}

/// `GARDEN_<SECTION>__<KEY>` variables. The prefix separator has to be set
/// on its own, otherwise `config` reuses `__` after the prefix as well.
fn environment() -> Environment {
    Environment::with_prefix("GARDEN")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    pub growth: GrowthConfig,
    pub scene: SceneConfig,
    pub admission: AdmissionConfig,
    pub timing: TimingConfig,
}

impl GardenConfig {
    /// Loads configuration for the given profile.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `config/default.toml` (optional)
    /// 2. `config/{profile}.toml` (optional)
    /// 3. Environment variables with prefix `GARDEN_` and `__` as the
    ///    nesting separator, e.g. `GARDEN_ADMISSION__SEEDS=5`.
    ///
    /// Missing keys fall back to [`GardenConfig::default`].
    ///
    /// ### Errors
    /// Returns [`GardenError::Config`] if a source cannot be parsed and
    /// [`GardenError::InvalidConfig`] if the merged values are unusable.
    pub fn load(profile: &str) -> Result<Self, GardenError> {
        Self::load_with_env(profile, environment())
    }

    fn load_with_env(profile: &str, env: Environment) -> Result<Self, GardenError> {
        let cfg: GardenConfig = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the values the algorithms divide by or sample ranges from.
    pub fn validate(&self) -> Result<(), GardenError> {
        let invalid = |msg: &str| Err(GardenError::InvalidConfig(msg.to_string()));

        if self.growth.segment_height <= 0.0 {
            return invalid("growth.segment_height must be positive");
        }
        if self.growth.target_height <= 0.0 {
            return invalid("growth.target_height must be positive");
        }
        if self.growth.steep_height_loss < 0.0 || self.growth.shallow_height_loss < 0.0 {
            return invalid("growth height losses must not be negative");
        }
        if self.timing.ending_spawn_min > self.timing.ending_spawn_max {
            return invalid("timing.ending_spawn_min exceeds timing.ending_spawn_max");
        }
        if self.admission.reward_count == 0 {
            return invalid("admission.reward_count must be at least 1");
        }
        if self.scene.canvas_size.x <= 0.0 || self.scene.canvas_size.y <= 0.0 {
            return invalid("scene.canvas_size must be positive");
        }
        Ok(())
    }
}
