//! The garden session.
//!
//! [`GardenState`] owns everything a single run needs: the flow state, the
//! seed counter, every plant with its reveal queue, rewards, balloons,
//! roots, the camera and the task scheduler. The caller drives it with
//! [`GardenState::tick`] once per frame and forwards canvas clicks to
//! [`GardenState::handle_click`]; everything else is read through
//! accessors.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::GardenConfig;
use crate::flow::{AppState, FlowController, Transition};
use crate::generator::PlantGenerator;
use crate::plant::{Flower, PlantStructure};
use crate::reveal::RevealQueue;
use crate::scene::{
    Camera, EndingBalloon, EndingSpawner, FallingSeed, Reward, RewardDeck, RewardKind,
    RisingBalloon, Root,
};
use crate::tasks::{CameraTween, RootGrowth, Scheduler, Task, TaskHandle};
use crate::types::{Millis, PlantId, SeedId};

/// Zoom level used when focusing a single balloon.
pub const FLOWER_ZOOM: f32 = 3.0;
/// Roots start this far below the ground line.
const ROOT_DEPTH: f32 = 20.0;
/// Gems sit this far below the ground line.
const GEM_DEPTH: f32 = 50.0;

/// What a click in the garden did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A seed started falling.
    PlantRequested(SeedId),
    /// A gift was opened; carries its reward id.
    GiftOpened(u32),
    GemOpened(u32),
    Noop,
}

/// Why a planting was turned down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NoSeeds,
    PlantCapReached,
    StemCapReached,
}

/// One generated plant plus its reveal progress.
#[derive(Clone, Debug)]
pub struct PlantEntry {
    pub structure: PlantStructure,
    pub queue: RevealQueue,
    /// Active stems still held by this plant; zero once fully revealed.
    stems: usize,
}

impl PlantEntry {
    pub fn is_revealed(&self) -> bool {
        self.queue.is_finished()
    }
}

#[derive(Debug)]
pub struct GardenState {
    cfg: GardenConfig,
    rng: ChaCha8Rng,
    now: Millis,
    flow: FlowController,
    generator: PlantGenerator,

    seeds_left: u32,
    active_stems: usize,
    next_seed: SeedId,
    deck: RewardDeck,

    plants: Vec<PlantEntry>,
    falling: Vec<FallingSeed>,
    rewards: Vec<Reward>,
    rising: Vec<RisingBalloon>,
    ending_balloons: Vec<EndingBalloon>,
    spawner: Option<EndingSpawner>,
    roots: Vec<Root>,
    camera: Camera,

    scheduler: Scheduler,
    script_seed: Vec2,
    script_seed_landed: bool,
}

impl GardenState {
    /// Creates a session with a randomly seeded RNG.
    pub fn new(cfg: GardenConfig) -> Self {
        Self::with_seed(cfg, rand::random())
    }

    /// Creates a session whose every random choice follows `seed`.
    pub fn with_seed(cfg: GardenConfig, seed: u64) -> Self {
        info!(seed, seeds = cfg.admission.seeds, "garden session created");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            now: 0,
            flow: FlowController::new(cfg.timing),
            generator: PlantGenerator::new(cfg.growth),
            seeds_left: cfg.admission.seeds,
            active_stems: 0,
            next_seed: 0,
            deck: RewardDeck::new(cfg.admission.reward_count),
            plants: Vec::new(),
            falling: Vec::new(),
            rewards: Vec::new(),
            rising: Vec::new(),
            ending_balloons: Vec::new(),
            spawner: None,
            roots: Vec::new(),
            camera: Camera::default(),
            scheduler: Scheduler::new(),
            script_seed: cfg.scene.script_seed,
            script_seed_landed: false,
            cfg,
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Milliseconds since the session started.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn state(&self) -> AppState {
        self.flow.state()
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.flow.transition()
    }

    pub fn transition_progress(&self) -> Option<f32> {
        self.flow.transition_progress(self.now)
    }

    pub fn seeds_left(&self) -> u32 {
        self.seeds_left
    }

    pub fn active_stems(&self) -> usize {
        self.active_stems
    }

    pub fn plants(&self) -> &[PlantEntry] {
        &self.plants
    }

    pub fn falling_seeds(&self) -> &[FallingSeed] {
        &self.falling
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn rising_balloons(&self) -> &[RisingBalloon] {
        &self.rising
    }

    pub fn ending_balloons(&self) -> &[EndingBalloon] {
        &self.ending_balloons
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Position of the scripted seed.
    pub fn script_seed(&self) -> Vec2 {
        self.script_seed
    }

    /// Every balloon of every plant, in plant order.
    pub fn flowers(&self) -> impl Iterator<Item = &Flower> {
        self.plants.iter().flat_map(|p| p.structure.flowers())
    }

    pub fn is_finished(&self, handle: TaskHandle) -> bool {
        self.scheduler.is_finished(handle)
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_count()
    }

    // ---------------------------------------------------------------------
    // Frame loop
    // ---------------------------------------------------------------------

    /// Advances the session by `dt_ms` milliseconds.
    ///
    /// Order: flow transition, pending tasks, rising balloons, ending
    /// balloons. Tasks spawned during this call first run on the next one.
    pub fn tick(&mut self, dt_ms: Millis) {
        self.now += dt_ms;
        let dt_secs = dt_ms as f32 / 1000.0;

        if self.flow.update(self.now) == Some(AppState::Ending) {
            let t = self.cfg.timing;
            self.spawner = Some(EndingSpawner::new(
                self.now,
                t.ending_spawn_min,
                t.ending_spawn_max,
            ));
        }

        self.drive_tasks();

        for balloon in &mut self.rising {
            balloon.update(dt_secs);
        }

        self.ending_balloons.retain_mut(|b| b.update(dt_secs));
        if let Some(spawner) = &mut self.spawner {
            spawner.spawn_due(
                self.now,
                self.cfg.scene.canvas_size,
                &mut self.rng,
                &mut self.ending_balloons,
            );
        }
    }

    fn drive_tasks(&mut self) {
        let pending = self.scheduler.take_pending();
        let mut still_running = Vec::with_capacity(pending.len());

        for (handle, mut task) in pending {
            if !self.poll_task(&mut task) {
                still_running.push((handle, task));
            }
        }

        self.scheduler.restore(still_running);
    }

    /// ### Returns
    /// `true` when the task completed.
    fn poll_task(&mut self, task: &mut Task) -> bool {
        match task {
            Task::SeedFall(id) => self.poll_seed(*id),
            Task::Reveal(id) => self.poll_reveal(*id),
            Task::Roots(growth) => growth.poll(self.now, &mut self.roots),
            Task::Camera(tween) => {
                self.camera = tween.sample(self.now);
                tween.is_complete(self.now)
            }
            Task::Delay { until } => self.now >= *until,
        }
    }

    fn poll_seed(&mut self, id: SeedId) -> bool {
        let Some(idx) = self.falling.iter().position(|s| s.id == id) else {
            return true;
        };
        if !self.falling[idx].update(self.now, self.cfg.timing.seed_fall) {
            return false;
        }
        let seed = self.falling.remove(idx);
        self.land(seed);
        true
    }

    /// Plants the gift of a landed seed and, for clicked seeds, its plant.
    fn land(&mut self, seed: FallingSeed) {
        let pos = Vec2::new(seed.pos.x, self.cfg.scene.ground_y);
        let reward_id = self.deck.draw();
        let reward = self.rewards.len();
        self.rewards.push(Reward::new(RewardKind::Gift, pos, reward_id, None));
        info!(seed = seed.id, reward_id, x = pos.x, "seed landed");

        match seed.grows {
            Some(height) => {
                let gift_top = pos.y - self.cfg.scene.reward_half_size.y;
                let balloons = RisingBalloon::spawn_for_gift(reward, pos, gift_top, &mut self.rng);
                self.rising.extend(balloons);

                let (plant, _) = self.start_plant(pos, height, 1);
                self.rewards[reward].plant = Some(plant);
            }
            None => self.script_seed_landed = true,
        }
    }

    /// Generates a plant at `origin` and schedules its reveal.
    ///
    /// ### Parameters
    /// - `reserved` - Stems already reserved for this plant at admission.
    fn start_plant(
        &mut self,
        origin: Vec2,
        height: f32,
        reserved: usize,
    ) -> (PlantId, TaskHandle) {
        let generated = self.generator.pre_generate(origin, height, &mut self.rng);
        let stems = generated.report.lineage_count().max(1);
        self.active_stems = self.active_stems.saturating_sub(reserved) + stems;

        let id = self.plants.len();
        let mut queue =
            RevealQueue::build(id, &generated.structure, self.cfg.timing.reveal_interval);
        queue.start(self.now);
        info!(
            plant = id,
            x = origin.x,
            height,
            elements = queue.len(),
            stems,
            active_stems = self.active_stems,
            "plant generated"
        );

        self.plants.push(PlantEntry {
            structure: generated.structure,
            queue,
            stems,
        });
        (id, self.scheduler.spawn(Task::Reveal(id)))
    }

    fn poll_reveal(&mut self, id: PlantId) -> bool {
        let now = self.now;
        let Some(entry) = self.plants.get_mut(id) else {
            return true;
        };
        entry.queue.advance(&mut entry.structure, now);
        if !entry.queue.is_finished() {
            return false;
        }

        let released = std::mem::take(&mut entry.stems);
        let origin = entry.structure.origin;
        self.active_stems = self.active_stems.saturating_sub(released);
        debug!(plant = id, released, active_stems = self.active_stems, "plant revealed");

        if self.cfg.admission.gems_enabled {
            let pos = Vec2::new(origin.x, self.cfg.scene.ground_y + GEM_DEPTH);
            let reward_id = self.deck.draw();
            self.rewards.push(Reward::new(RewardKind::Gem, pos, reward_id, Some(id)));
        }
        true
    }

    // ---------------------------------------------------------------------
    // Clicks
    // ---------------------------------------------------------------------

    /// Routes a click in canvas coordinates.
    ///
    /// On the splash screen any click starts the intro. In the garden,
    /// pending gifts are hit first, then gems, and otherwise a seed is
    /// planted at the click position. Every other state ignores clicks.
    pub fn handle_click(&mut self, pos: Vec2) -> ClickOutcome {
        match self.flow.state() {
            AppState::Splash => {
                self.flow.click_splash(self.now);
                ClickOutcome::Noop
            }
            AppState::Main => self.click_garden(pos),
            state => {
                debug!(?state, "click ignored");
                ClickOutcome::Noop
            }
        }
    }

    fn click_garden(&mut self, pos: Vec2) -> ClickOutcome {
        if let Some(i) = self.hit_reward(pos, RewardKind::Gift) {
            return self.open_reward(i);
        }
        if let Some(i) = self.hit_reward(pos, RewardKind::Gem) {
            return self.open_reward(i);
        }
        match self.plant_at(pos) {
            Ok(seed) => ClickOutcome::PlantRequested(seed),
            Err(rejection) => {
                info!(?rejection, seeds_left = self.seeds_left, "planting rejected");
                ClickOutcome::Noop
            }
        }
    }

    fn hit_reward(&self, pos: Vec2, kind: RewardKind) -> Option<usize> {
        let half = self.cfg.scene.reward_half_size;
        self.rewards
            .iter()
            .position(|r| r.kind == kind && r.is_pending() && r.contains(pos, half))
    }

    fn open_reward(&mut self, i: usize) -> ClickOutcome {
        let reward = &mut self.rewards[i];
        reward.opened = true;
        let (kind, reward_id) = (reward.kind, reward.reward_id);

        let outcome = match kind {
            RewardKind::Gift => {
                // Opened gifts stay on the ground; their balloons go away.
                self.rising.retain(|b| b.reward != i);
                ClickOutcome::GiftOpened(reward_id)
            }
            RewardKind::Gem => {
                self.rewards[i].visible = false;
                ClickOutcome::GemOpened(reward_id)
            }
        };
        info!(?kind, reward_id, "reward opened");

        self.check_end_condition();
        outcome
    }

    /// Plants a clicked seed if the counter and both caps allow it.
    pub fn plant_at(&mut self, pos: Vec2) -> Result<SeedId, Rejection> {
        if self.seeds_left == 0 {
            return Err(Rejection::NoSeeds);
        }
        self.check_caps()?;

        self.seeds_left -= 1;
        let target = self.cfg.growth.target_height;
        let (seed, _) = self.drop_seed(pos, Some(target));
        info!(seed, x = pos.x, seeds_left = self.seeds_left, "seed planted");

        self.check_end_condition();
        Ok(seed)
    }

    fn check_caps(&self) -> Result<(), Rejection> {
        let growing = self.falling.iter().filter(|s| s.grows.is_some()).count();
        if self.plants.len() + growing >= self.cfg.admission.max_plants_per_session {
            return Err(Rejection::PlantCapReached);
        }
        if self.active_stems >= self.cfg.admission.max_active_stems {
            return Err(Rejection::StemCapReached);
        }
        Ok(())
    }

    /// Starts a seed falling from `pos` to the ground line.
    fn drop_seed(&mut self, pos: Vec2, grows: Option<f32>) -> (SeedId, TaskHandle) {
        self.next_seed += 1;
        let id = self.next_seed;
        if grows.is_some() {
            self.active_stems += 1;
        }
        self.falling.push(FallingSeed {
            id,
            pos,
            start_y: pos.y,
            end_y: self.cfg.scene.ground_y,
            started_at: self.now,
            grows,
        });
        (id, self.scheduler.spawn(Task::SeedFall(id)))
    }

    /// Starts the ending once every seed is used and no reward is waiting.
    fn check_end_condition(&mut self) {
        if self.seeds_left > 0 || self.rewards.iter().any(Reward::is_pending) {
            return;
        }
        if self.flow.begin_ending(self.now) {
            info!(plants = self.plants.len(), "all seeds used, ending started");
        }
    }

    // ---------------------------------------------------------------------
    // Scripting
    // ---------------------------------------------------------------------

    /// Moves the scripted seed; it can be planted again afterwards.
    pub fn place_seed(&mut self, x: f32, y: f32) {
        self.script_seed = Vec2::new(x, y);
        self.script_seed_landed = false;
    }

    /// Drops the scripted seed to the ground, leaving a gift.
    ///
    /// Does nothing if the seed already landed or a cap is reached. The seed
    /// counter is not touched.
    pub fn plant_seed(&mut self) -> TaskHandle {
        if self.script_seed_landed {
            return self.scheduler.resolved();
        }
        if let Err(rejection) = self.check_caps() {
            info!(?rejection, "scripted planting rejected");
            return self.scheduler.resolved();
        }
        self.drop_seed(self.script_seed, None).1
    }

    pub fn grow_roots(&mut self) -> TaskHandle {
        let base = Vec2::new(self.script_seed.x, self.cfg.scene.ground_y + ROOT_DEPTH);
        let growth = RootGrowth::new(base, self.now, &mut self.rng);
        debug!(roots = growth.len(), "roots growing");
        self.scheduler.spawn(Task::Roots(growth))
    }

    /// Generates a plant under the scripted seed and reveals it.
    pub fn grow_stem(&mut self, target_height: f32) -> TaskHandle {
        let origin = Vec2::new(self.script_seed.x, self.cfg.scene.ground_y);
        self.start_plant(origin, target_height, 0).1
    }

    /// Zooms onto the `index`-th balloon across all plants.
    pub fn zoom_to_flower(&mut self, index: usize) -> TaskHandle {
        let Some(target) = self.flowers().nth(index).map(|f| f.pos) else {
            debug!(index, "no balloon to zoom to");
            return self.scheduler.resolved();
        };
        let to = Camera::focused_on(target, FLOWER_ZOOM, self.cfg.scene.canvas_size);
        self.tween_camera(to, self.cfg.timing.zoom_in)
    }

    pub fn zoom_out(&mut self) -> TaskHandle {
        self.tween_camera(Camera::default(), self.cfg.timing.zoom_out)
    }

    fn tween_camera(&mut self, to: Camera, duration: Millis) -> TaskHandle {
        self.scheduler.spawn(Task::Camera(CameraTween {
            from: self.camera,
            to,
            started_at: self.now,
            duration,
        }))
    }

    pub fn wait(&mut self, ms: Millis) -> TaskHandle {
        self.scheduler.spawn(Task::Delay {
            until: self.now + ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_state(cfg: GardenConfig) -> GardenState {
        let mut g = GardenState::with_seed(cfg, 7);
        g.handle_click(Vec2::ZERO);
        g.tick(cfg.timing.intro_slide);
        assert_eq!(g.state(), AppState::Main);
        g
    }

    #[test]
    fn splash_click_never_plants() {
        let mut g = GardenState::with_seed(GardenConfig::default(), 1);
        assert_eq!(g.handle_click(Vec2::new(100.0, 100.0)), ClickOutcome::Noop);
        assert_eq!(g.state(), AppState::Transitioning);
        assert_eq!(g.seeds_left(), 18);

        // Clicks during the slide are ignored too.
        assert_eq!(g.handle_click(Vec2::new(100.0, 100.0)), ClickOutcome::Noop);
        assert!(g.falling_seeds().is_empty());
    }

    #[test]
    fn planted_seed_lands_then_grows() {
        let cfg = GardenConfig::default();
        let mut g = main_state(cfg);

        let outcome = g.handle_click(Vec2::new(200.0, 40.0));
        assert!(matches!(outcome, ClickOutcome::PlantRequested(_)));
        assert_eq!(g.seeds_left(), 17);
        assert_eq!(g.active_stems(), 1);
        assert_eq!(g.falling_seeds().len(), 1);

        g.tick(250);
        assert!(g.plants().is_empty());
        assert!(g.falling_seeds()[0].pos.y > 40.0);

        g.tick(250);
        assert!(g.falling_seeds().is_empty());
        assert_eq!(g.plants().len(), 1);
        assert_eq!(g.rewards().len(), 1);
        assert_eq!(g.rewards()[0].pos, Vec2::new(200.0, 190.0));
        assert_eq!(g.rewards()[0].plant, Some(0));
        assert!((4..=8).contains(&g.rising_balloons().len()));

        let stems = g.plants()[0].stems;
        assert!(stems >= 1);
        assert_eq!(g.active_stems(), stems);

        // Reveal runs to completion and hands the stems back.
        for _ in 0..400 {
            g.tick(50);
        }
        assert!(g.plants()[0].is_revealed());
        assert!(g.plants()[0].structure.is_fully_revealed());
        assert_eq!(g.active_stems(), 0);
    }

    #[test]
    fn gift_click_opens_and_clears_balloons() {
        let cfg = GardenConfig::default();
        let mut g = main_state(cfg);
        g.handle_click(Vec2::new(300.0, 100.0));
        g.tick(500);

        let id = g.rewards()[0].reward_id;
        assert_eq!(id, 1);
        assert_eq!(
            g.handle_click(Vec2::new(303.0, 186.0)),
            ClickOutcome::GiftOpened(id)
        );
        assert!(g.rising_balloons().is_empty());
        assert!(g.rewards()[0].opened);
        assert!(g.rewards()[0].visible);

        // An opened gift no longer catches clicks; this one plants instead.
        let again = g.handle_click(Vec2::new(303.0, 186.0));
        assert!(matches!(again, ClickOutcome::PlantRequested(_)));
    }

    #[test]
    fn empty_counter_rejects_without_side_effects() {
        let mut cfg = GardenConfig::default();
        cfg.admission.seeds = 0;
        let mut g = main_state(cfg);

        assert_eq!(g.plant_at(Vec2::new(10.0, 10.0)), Err(Rejection::NoSeeds));
        assert!(g.falling_seeds().is_empty());
        assert_eq!(g.active_stems(), 0);
    }

    #[test]
    fn plant_cap_counts_falling_seeds() {
        let mut cfg = GardenConfig::default();
        cfg.admission.max_plants_per_session = 2;
        let mut g = main_state(cfg);

        assert!(g.plant_at(Vec2::new(10.0, 10.0)).is_ok());
        assert!(g.plant_at(Vec2::new(60.0, 10.0)).is_ok());
        assert_eq!(
            g.plant_at(Vec2::new(110.0, 10.0)),
            Err(Rejection::PlantCapReached)
        );
        assert_eq!(g.seeds_left(), 16);
    }

    #[test]
    fn gems_appear_under_revealed_plants_when_enabled() {
        let mut cfg = GardenConfig::default();
        cfg.admission.gems_enabled = true;
        let mut g = main_state(cfg);

        g.handle_click(Vec2::new(400.0, 100.0));
        for _ in 0..400 {
            g.tick(50);
        }

        let gem = g
            .rewards()
            .iter()
            .position(|r| r.kind == RewardKind::Gem)
            .expect("gem after reveal");
        assert_eq!(g.rewards()[gem].pos, Vec2::new(400.0, 240.0));
        assert_eq!(g.rewards()[gem].reward_id, 2);

        assert_eq!(
            g.handle_click(Vec2::new(400.0, 240.0)),
            ClickOutcome::GemOpened(2)
        );
        assert!(!g.rewards()[gem].visible);
    }

    #[test]
    fn zoom_to_missing_flower_resolves_immediately() {
        let mut g = GardenState::with_seed(GardenConfig::default(), 3);
        let handle = g.zoom_to_flower(0);
        assert!(g.is_finished(handle));
        assert_eq!(g.pending_tasks(), 0);
    }

    #[test]
    fn zoom_in_and_out_move_the_camera() {
        let cfg = GardenConfig::default();
        let mut g = GardenState::with_seed(cfg, 9);
        let grown = g.grow_stem(120.0);
        for _ in 0..400 {
            g.tick(50);
        }
        assert!(g.is_finished(grown));

        let target = g.flowers().next().map(|f| f.pos).expect("a balloon");
        let zoom = g.zoom_to_flower(0);
        g.tick(500);
        assert!(!g.is_finished(zoom));
        g.tick(500);
        assert!(g.is_finished(zoom));
        assert_eq!(g.camera().zoom, FLOWER_ZOOM);
        let centre = g.camera().canvas_to_view(target);
        assert!((centre - cfg.scene.canvas_size / 2.0).length() < 1e-2);

        let out = g.zoom_out();
        g.tick(800);
        assert!(g.is_finished(out));
        assert_eq!(g.camera(), Camera::default());
    }
}
