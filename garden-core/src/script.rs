//! Sequential garden scripts.
//!
//! A [`Script`] is a queue of [`ScriptCommand`]s. Each call to
//! [`Script::step`] issues commands until one of them starts a task that is
//! still running, then waits for it on later steps. Commands that finish
//! immediately (moving the scripted seed, zooming to a missing balloon)
//! never cost a frame.

use std::collections::VecDeque;

use glam::Vec2;
use tracing::{debug, info};

use crate::garden::GardenState;
use crate::tasks::TaskHandle;
use crate::types::Millis;

#[derive(Clone, Debug, PartialEq)]
pub enum ScriptCommand {
    PlaceSeed(Vec2),
    PlantSeed,
    GrowRoots,
    GrowStem(f32),
    ZoomToFlower(usize),
    ZoomOut,
    Wait(Millis),
    /// Runs every inner command at once and waits for all of them.
    All(Vec<ScriptCommand>),
    /// Zooms onto each balloon that exists when this command is reached,
    /// pausing `dwell` on each, and zooms back out after every visit.
    TourFlowers { dwell: Millis },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStatus {
    Running,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Script {
    name: String,
    commands: VecDeque<ScriptCommand>,
    waiting: Vec<TaskHandle>,
    done: bool,
}

impl Script {
    pub fn new(name: impl Into<String>, commands: Vec<ScriptCommand>) -> Self {
        Self {
            name: name.into(),
            commands: commands.into(),
            waiting: Vec::new(),
            done: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commands not yet issued.
    pub fn remaining(&self) -> usize {
        self.commands.len()
    }

    pub fn is_finished(&self) -> bool {
        self.waiting.is_empty() && self.commands.is_empty()
    }

    /// Issues commands until one is still running or the script is done.
    pub fn step(&mut self, garden: &mut GardenState) -> ScriptStatus {
        loop {
            if self.waiting.iter().any(|h| !garden.is_finished(*h)) {
                return ScriptStatus::Running;
            }
            self.waiting.clear();

            let Some(command) = self.commands.pop_front() else {
                if !self.done {
                    self.done = true;
                    info!(script = %self.name, "script finished");
                }
                return ScriptStatus::Finished;
            };
            debug!(script = %self.name, ?command, "script command");
            self.issue(command, garden);
        }
    }

    fn issue(&mut self, command: ScriptCommand, garden: &mut GardenState) {
        match command {
            ScriptCommand::PlaceSeed(pos) => garden.place_seed(pos.x, pos.y),
            ScriptCommand::PlantSeed => self.waiting.push(garden.plant_seed()),
            ScriptCommand::GrowRoots => self.waiting.push(garden.grow_roots()),
            ScriptCommand::GrowStem(height) => self.waiting.push(garden.grow_stem(height)),
            ScriptCommand::ZoomToFlower(i) => self.waiting.push(garden.zoom_to_flower(i)),
            ScriptCommand::ZoomOut => self.waiting.push(garden.zoom_out()),
            ScriptCommand::Wait(ms) => self.waiting.push(garden.wait(ms)),
            ScriptCommand::All(inner) => {
                for command in inner {
                    self.issue(command, garden);
                }
            }
            ScriptCommand::TourFlowers { dwell } => {
                let count = garden.flowers().count();
                for i in (0..count).rev() {
                    self.commands.push_front(ScriptCommand::ZoomOut);
                    self.commands.push_front(ScriptCommand::Wait(dwell));
                    self.commands.push_front(ScriptCommand::ZoomToFlower(i));
                }
            }
        }
    }

    /// Plants the scripted seed, grows roots, then a plant of `height`.
    pub fn basic(height: f32) -> Self {
        Self::new(
            "basic",
            vec![
                ScriptCommand::PlantSeed,
                ScriptCommand::Wait(500),
                ScriptCommand::GrowRoots,
                ScriptCommand::Wait(500),
                ScriptCommand::GrowStem(height),
            ],
        )
    }

    /// Four plants side by side at different heights.
    pub fn garden_party() -> Self {
        const PLANTS: [(f32, f32); 4] = [
            (200.0, 160.0),
            (280.0, 200.0),
            (360.0, 140.0),
            (440.0, 180.0),
        ];

        let mut commands = Vec::new();
        for (x, height) in PLANTS {
            commands.push(ScriptCommand::PlaceSeed(Vec2::new(x, 50.0)));
            commands.push(ScriptCommand::PlantSeed);
            commands.push(ScriptCommand::All(vec![
                ScriptCommand::GrowRoots,
                ScriptCommand::GrowStem(height),
            ]));
            commands.push(ScriptCommand::Wait(500));
        }
        Self::new("garden_party", commands)
    }

    /// Grows one tall plant and visits each of its balloons.
    pub fn flower_tour() -> Self {
        Self::new(
            "flower_tour",
            vec![
                ScriptCommand::PlantSeed,
                ScriptCommand::All(vec![
                    ScriptCommand::GrowRoots,
                    ScriptCommand::GrowStem(200.0),
                ]),
                ScriptCommand::Wait(500),
                ScriptCommand::TourFlowers { dwell: 1500 },
            ],
        )
    }

    /// Looks up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(Self::basic(170.0)),
            "garden_party" => Some(Self::garden_party()),
            "flower_tour" => Some(Self::flower_tour()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GardenConfig;
    use crate::scene::{Camera, RewardKind};

    fn run(script: &mut Script, garden: &mut GardenState, max_frames: usize) -> usize {
        for frame in 0..max_frames {
            if script.step(garden) == ScriptStatus::Finished {
                return frame;
            }
            garden.tick(16);
        }
        panic!("script {} did not finish", script.name());
    }

    #[test]
    fn basic_script_plants_roots_and_stem() {
        let mut garden = GardenState::with_seed(GardenConfig::default(), 21);
        let mut script = Script::basic(150.0);

        run(&mut script, &mut garden, 5_000);

        assert!(script.is_finished());
        assert_eq!(garden.plants().len(), 1);
        assert!(garden.plants()[0].is_revealed());
        assert_eq!(garden.plants()[0].structure.origin.x, 320.0);
        assert!(!garden.roots().is_empty());
        // The scripted seed leaves a gift but never touches the counter.
        assert_eq!(garden.rewards().len(), 1);
        assert_eq!(garden.rewards()[0].kind, RewardKind::Gift);
        assert_eq!(garden.seeds_left(), 18);
    }

    #[test]
    fn landed_script_seed_is_not_planted_twice() {
        let mut garden = GardenState::with_seed(GardenConfig::default(), 2);
        let mut script = Script::new(
            "twice",
            vec![ScriptCommand::PlantSeed, ScriptCommand::PlantSeed],
        );
        run(&mut script, &mut garden, 1_000);
        assert_eq!(garden.rewards().len(), 1);
    }

    #[test]
    fn garden_party_grows_four_plants() {
        let mut garden = GardenState::with_seed(GardenConfig::default(), 5);
        let mut script = Script::garden_party();
        run(&mut script, &mut garden, 20_000);

        let xs: Vec<f32> = garden.plants().iter().map(|p| p.structure.origin.x).collect();
        assert_eq!(xs, vec![200.0, 280.0, 360.0, 440.0]);
        assert_eq!(garden.rewards().len(), 4);
    }

    #[test]
    fn flower_tour_ends_zoomed_out() {
        let mut garden = GardenState::with_seed(GardenConfig::default(), 8);
        let mut script = Script::flower_tour();
        run(&mut script, &mut garden, 50_000);

        assert_eq!(garden.camera(), Camera::default());
        assert!(garden.flowers().count() >= 1);
    }

    #[test]
    fn instant_commands_do_not_wait_a_frame() {
        let mut garden = GardenState::with_seed(GardenConfig::default(), 1);
        let mut script = Script::new(
            "instant",
            vec![
                ScriptCommand::PlaceSeed(Vec2::new(10.0, 10.0)),
                ScriptCommand::ZoomToFlower(3),
            ],
        );
        assert_eq!(script.step(&mut garden), ScriptStatus::Finished);
        assert_eq!(garden.script_seed(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(Script::preset("garden_party").map(|s| s.remaining()), Some(16));
        assert!(Script::preset("nope").is_none());
    }
}
