//! Lineage growth engine.
//!
//! The engine grows every lineage of one plant in lock-step cycles:
//! 1. Snapshot the active lineages. Children spawned during a cycle only
//!    start acting in the next one.
//! 2. Retire lineages that reached their height budget, giving each one
//!    that is still growing a terminal [`Crown`](crate::plant::Crown).
//! 3. Ask the [`GrowthPolicy`] for every other lineage and apply the
//!    chosen [`Action`] to the plant structure.
//!
//! The loop ends when no lineage is left or after
//! [`GrowthConfig::max_cycles`] cycles, whichever comes first.

use glam::Vec2;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::GrowthConfig;
use crate::lineage::{Action, LineageStatus, StemLineage};
use crate::plant::{BranchKind, Flower, PlantStructure};
use crate::policy::GrowthPolicy;
use crate::types::{BalloonColor, Direction, LineageId};

/// Record of one split event.
#[derive(Clone, Debug)]
pub struct SplitRecord {
    pub parent: LineageId,
    /// Parent height at the moment of the split.
    pub height: f32,
    pub children: [LineageId; 2],
}

/// Outcome of one [`LineageEngine::generate`] run.
#[derive(Clone, Debug, Default)]
pub struct GrowthReport {
    /// Number of cycles executed.
    pub cycles: usize,
    /// Lineages that terminated normally, in retirement order.
    pub retired: Vec<StemLineage>,
    /// Lineages still active when the cycle cap was hit.
    pub abandoned: Vec<StemLineage>,
    pub splits: Vec<SplitRecord>,
}

impl GrowthReport {
    /// Total number of lineages the plant ever had.
    pub fn lineage_count(&self) -> usize {
        self.retired.len() + self.abandoned.len()
    }
}

/// Grows the lineages of a single plant until all of them terminate.
#[derive(Clone, Debug)]
pub struct LineageEngine<P> {
    policy: P,
    cfg: GrowthConfig,
}

impl<P: GrowthPolicy> LineageEngine<P> {
    pub fn new(policy: P, cfg: GrowthConfig) -> Self {
        Self { policy, cfg }
    }

    /// Runs the growth loop for `root` and writes its output into `plant`.
    ///
    /// Heights are measured upwards from `plant.origin.y`; emitted elements
    /// use canvas coordinates where smaller y is higher on screen.
    ///
    /// ### Parameters
    /// - `plant` - Structure receiving segments, branches and crowns.
    /// - `root` - The initial lineage; its id must be `0`.
    /// - `rng` - Random source shared with the policy.
    ///
    /// ### Returns
    /// A [`GrowthReport`] with every lineage that existed during the run.
    pub fn generate<R: Rng>(
        &self,
        plant: &mut PlantStructure,
        root: StemLineage,
        rng: &mut R,
    ) -> GrowthReport {
        let mut report = GrowthReport::default();
        let mut active = vec![root];
        let mut next_id: LineageId = 1;

        while !active.is_empty() && report.cycles < self.cfg.max_cycles {
            let cycle = report.cycles;
            let snapshot = std::mem::take(&mut active);
            let mut spawned = Vec::new();

            for mut lineage in snapshot {
                if lineage.is_finished() {
                    if lineage.status == LineageStatus::Growing {
                        self.add_crown(plant, &mut lineage, rng);
                    }
                    report.retired.push(lineage);
                    continue;
                }

                match self.policy.decide(&lineage, cycle, rng) {
                    Action::Grow => self.grow(plant, &mut lineage),
                    Action::Split => {
                        let children = self.split(plant, &mut lineage, next_id, rng);
                        next_id += 2;
                        report.splits.push(SplitRecord {
                            parent: lineage.id,
                            height: children[0].spawn_height,
                            children: [children[0].id, children[1].id],
                        });
                        spawned.extend(children);
                    }
                    Action::Flower => self.flower(plant, &mut lineage, rng),
                }
                active.push(lineage);
            }

            active.extend(spawned);
            report.cycles += 1;
        }

        if !active.is_empty() {
            warn!(
                cycles = report.cycles,
                abandoned = active.len(),
                "growth cycle cap reached, abandoning active lineages"
            );
        }
        report.abandoned = active;

        debug!(
            cycles = report.cycles,
            segments = plant.segments.len(),
            branches = plant.branches.len(),
            crowns = plant.crowns.len(),
            lineages = report.lineage_count(),
            "plant generated"
        );
        report
    }

    /// Canvas y of the lineage's current tip.
    #[inline]
    fn tip_y(&self, plant: &PlantStructure, lineage: &StemLineage) -> f32 {
        plant.origin.y - lineage.current_height
    }

    /// Appends one segment above the tip and raises the lineage.
    fn grow(&self, plant: &mut PlantStructure, lineage: &mut StemLineage) {
        let h = self.cfg.segment_height;
        let y = self.tip_y(plant, lineage) - h;
        plant.add_segment(Vec2::new(lineage.x, y));

        lineage.current_height += h;
        lineage.segments_since_split += 1;
        lineage.last_action = Action::Grow;
    }

    /// Ends `lineage` with a diagonal split and returns its two children.
    ///
    /// The shallow child leans towards the split direction, the steep
    /// child sits just past the stem on the opposite side.
    fn split<R: Rng>(
        &self,
        plant: &mut PlantStructure,
        lineage: &mut StemLineage,
        first_id: LineageId,
        rng: &mut R,
    ) -> [StemLineage; 2] {
        let y = self.tip_y(plant, lineage);
        let direction = random_direction(rng);
        plant.add_branch(
            Vec2::new(lineage.x, y),
            direction,
            BranchKind::DiagonalSplit,
            Vec::new(),
        );

        let steep_x = lineage.x + direction.opposite().sign() * self.cfg.steep_offset;
        let shallow_x = lineage.x + direction.sign() * self.cfg.shallow_offset;

        let children = match direction {
            Direction::Left => {
                let steep_max =
                    lineage.max_height - rng.random::<f32>() * self.cfg.steep_height_loss;
                let shallow_max =
                    lineage.max_height - rng.random::<f32>() * self.cfg.shallow_height_loss;
                [
                    StemLineage::new_child(lineage, first_id, steep_x, steep_max),
                    StemLineage::new_child(lineage, first_id + 1, shallow_x, shallow_max),
                ]
            }
            Direction::Right => {
                let shallow_max =
                    lineage.max_height - rng.random::<f32>() * self.cfg.shallow_height_loss;
                let steep_max =
                    lineage.max_height - rng.random::<f32>() * self.cfg.steep_height_loss;
                [
                    StemLineage::new_child(lineage, first_id, shallow_x, shallow_max),
                    StemLineage::new_child(lineage, first_id + 1, steep_x, steep_max),
                ]
            }
        };

        lineage.current_height = lineage.max_height;
        lineage.last_action = Action::Split;
        lineage.status = LineageStatus::EndedBySplit;
        children
    }

    /// Ends `lineage` with a horizontal branch carrying 2-3 balloons.
    fn flower<R: Rng>(&self, plant: &mut PlantStructure, lineage: &mut StemLineage, rng: &mut R) {
        let y = self.tip_y(plant, lineage);
        let direction = random_direction(rng);
        let center = lineage.x + direction.sign() * self.cfg.flower_branch_reach;

        let count = rng.random_range(2..=3);
        let flowers = (0..count)
            .map(|i| {
                let dx = spread(i, count) * self.cfg.flower_spacing;
                let dy = (rng.random::<f32>() - 0.5) * self.cfg.flower_jitter;
                Flower::new(Vec2::new(center + dx, y + dy), random_color(rng))
            })
            .collect();

        plant.add_branch(
            Vec2::new(lineage.x, y),
            direction,
            BranchKind::FlowerBranch,
            flowers,
        );

        lineage.current_height = lineage.max_height;
        lineage.last_action = Action::Flower;
        lineage.status = LineageStatus::EndedByFlower;
    }

    /// Places the terminal cluster of a lineage that ran out of height.
    fn add_crown<R: Rng>(
        &self,
        plant: &mut PlantStructure,
        lineage: &mut StemLineage,
        rng: &mut R,
    ) {
        let y = self.tip_y(plant, lineage);
        let count = rng.random_range(2..=3);
        let flowers = (0..count)
            .map(|i| {
                let dx = spread(i, count) * self.cfg.crown_spacing;
                let jitter = (rng.random::<f32>() - 0.5) * self.cfg.crown_jitter;
                let dy = jitter - self.cfg.crown_lift;
                Flower::new(Vec2::new(lineage.x + dx, y + dy), random_color(rng))
            })
            .collect();

        plant.add_crown(Vec2::new(lineage.x, y), flowers);
        lineage.status = LineageStatus::EndedByFlower;
    }
}

/// Position of item `i` of `count` relative to the cluster center, in slots.
#[inline]
fn spread(i: u32, count: u32) -> f32 {
    i as f32 - (count as f32 - 1.0) / 2.0
}

pub(crate) fn random_direction<R: Rng>(rng: &mut R) -> Direction {
    if rng.random_bool(0.5) {
        Direction::Left
    } else {
        Direction::Right
    }
}

pub(crate) fn random_color<R: Rng>(rng: &mut R) -> BalloonColor {
    BalloonColor::ALL[rng.random_range(0..BalloonColor::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FixedPolicy, WeightedPolicy};
    use crate::types::StemVariant;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const GROUND: f32 = 190.0;

    fn root(max_height: f32) -> StemLineage {
        StemLineage::new_root(100.0, max_height, StemVariant::Straight, 16.0)
    }

    fn empty_plant() -> PlantStructure {
        PlantStructure::new(Vec2::new(100.0, GROUND), StemVariant::Straight)
    }

    #[test]
    fn forced_grow_yields_segments_then_one_crown() {
        let engine = LineageEngine::new(FixedPolicy(Action::Grow), GrowthConfig::default());
        let mut plant = empty_plant();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let report = engine.generate(&mut plant, root(40.0), &mut rng);

        assert_eq!(plant.segments.len(), 5);
        assert_eq!(plant.crowns.len(), 1);
        assert!(plant.branches.is_empty());

        // Segments stack upwards from the ground, 8 units each.
        let ys: Vec<f32> = plant.segments.iter().map(|s| s.pos.y).collect();
        assert_eq!(ys, vec![182.0, 174.0, 166.0, 158.0, 150.0]);

        // The crown floats above the final tip at height 40.
        let crown = &plant.crowns[0];
        assert_eq!(crown.pos, Vec2::new(100.0, GROUND - 40.0));
        assert!((2..=3).contains(&crown.flowers.len()));
        for f in &crown.flowers {
            assert!(f.pos.y < crown.pos.y);
        }

        assert_eq!(report.retired.len(), 1);
        assert!(report.retired[0].has_ending_flower());
        assert!(report.abandoned.is_empty());
        // 5 grow cycles + 1 retirement cycle.
        assert_eq!(report.cycles, 6);
    }

    #[test]
    fn forced_flower_ends_root_with_branch_and_no_crown() {
        let engine = LineageEngine::new(FixedPolicy(Action::Flower), GrowthConfig::default());
        let mut plant = empty_plant();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let report = engine.generate(&mut plant, root(170.0), &mut rng);

        assert!(plant.segments.is_empty());
        assert!(plant.crowns.is_empty());
        assert_eq!(plant.branches.len(), 1);

        let branch = &plant.branches[0];
        assert_eq!(branch.kind, BranchKind::FlowerBranch);
        assert!((2..=3).contains(&branch.flowers.len()));

        // Flowers sit on the side the branch points to.
        let side = branch.direction.sign();
        for f in &branch.flowers {
            assert!((f.pos.x - branch.pos.x) * side > 0.0);
            assert!((f.pos.y - branch.pos.y).abs() <= 3.0);
        }

        assert_eq!(report.retired.len(), 1);
        assert!(report.retired[0].has_ending_flower());
    }

    #[test]
    fn always_split_policy_is_stopped_by_cycle_cap() {
        // A policy that always splits never terminates by itself; children
        // are still created two per split and the cycle cap stops the run.
        let mut cfg = GrowthConfig::default();
        cfg.max_cycles = 4;
        let engine = LineageEngine::new(FixedPolicy(Action::Split), cfg);
        let mut plant = empty_plant();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let report = engine.generate(&mut plant, root(170.0), &mut rng);

        assert_eq!(report.cycles, 4);
        for split in &report.splits {
            assert_eq!(split.children.len(), 2);
        }
        assert!(plant.branches.iter().all(|b| b.kind == BranchKind::DiagonalSplit));
        assert!(!report.abandoned.is_empty());
    }

    #[test]
    fn split_children_offsets_and_budgets() {
        let engine = LineageEngine::new(FixedPolicy(Action::Split), GrowthConfig::default());
        let mut plant = empty_plant();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut parent = root(170.0);
        parent.current_height = 64.0;

        let children = engine.split(&mut plant, &mut parent, 1, &mut rng);
        let direction = plant.branches[0].direction;

        assert!(parent.ended_by_split());
        assert_eq!(parent.current_height, parent.max_height);

        let (shallow, steep) = match direction {
            Direction::Left => (&children[1], &children[0]),
            Direction::Right => (&children[0], &children[1]),
        };
        assert_eq!(shallow.x, 100.0 + direction.sign() * 4.0);
        assert_eq!(steep.x, 100.0 - direction.sign() * 1.0);
        assert!(shallow.max_height > 150.0 && shallow.max_height <= 170.0);
        assert!(steep.max_height > 160.0 && steep.max_height <= 170.0);

        for c in &children {
            assert_eq!(c.split_depth, 1);
            assert_eq!(c.current_height, 64.0);
            assert_eq!(c.parent, Some(0));
        }
    }

    #[test]
    fn weighted_generation_terminates_every_lineage_once() {
        let cfg = GrowthConfig::default();
        let engine = LineageEngine::new(WeightedPolicy::new(cfg), cfg);

        for seed in 0..200 {
            let mut plant = empty_plant();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let report = engine.generate(&mut plant, root(170.0), &mut rng);

            assert!(report.abandoned.is_empty(), "seed {seed} hit the cycle cap");
            for l in &report.retired {
                assert_ne!(l.status, LineageStatus::Growing, "seed {seed}");
                assert!(l.has_ending_flower() != l.ended_by_split(), "seed {seed}");
                assert!(l.split_depth <= 3, "seed {seed}");
            }
            assert_eq!(report.lineage_count(), 1 + 2 * report.splits.len());

            for split in &report.splits {
                let find = |id| report.retired.iter().find(|l| l.id == id);
                let parent = find(split.parent).expect("parent retired");
                for child in split.children {
                    let child = find(child).expect("child retired");
                    assert_eq!(child.parent, Some(parent.id), "seed {seed}");
                    assert_eq!(child.split_depth, parent.split_depth + 1, "seed {seed}");
                    assert_eq!(child.spawn_height, split.height, "seed {seed}");
                    assert_eq!(child.last_split_height, split.height, "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn crown_and_flower_geometry_follow_config() {
        let mut cfg = GrowthConfig::default();
        cfg.crown_spacing = 20.0;
        cfg.crown_lift = 30.0;
        cfg.crown_jitter = 0.0;
        cfg.flower_spacing = 5.0;
        cfg.flower_jitter = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let grower = LineageEngine::new(FixedPolicy(Action::Grow), cfg);
        let mut plant = empty_plant();
        grower.generate(&mut plant, root(16.0), &mut rng);
        let crown = &plant.crowns[0];
        for pair in crown.flowers.windows(2) {
            assert_eq!(pair[1].pos.x - pair[0].pos.x, 20.0);
        }
        assert!(crown.flowers.iter().all(|f| f.pos.y == crown.pos.y - 30.0));

        let flowerer = LineageEngine::new(FixedPolicy(Action::Flower), cfg);
        let mut plant = empty_plant();
        flowerer.generate(&mut plant, root(170.0), &mut rng);
        let branch = &plant.branches[0];
        for pair in branch.flowers.windows(2) {
            assert_eq!(pair[1].pos.x - pair[0].pos.x, 5.0);
        }
        assert!(branch.flowers.iter().all(|f| f.pos.y == branch.pos.y));
    }
}
