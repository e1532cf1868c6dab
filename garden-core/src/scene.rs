//! Session entities that live next to the plants: seeds in flight,
//! clickable rewards, decorative balloons, roots and the camera.

use glam::Vec2;
use rand::Rng;

use crate::engine::random_color;
use crate::types::{BalloonColor, Millis, PlantId, SeedId};

/// Vertical extent of a drawn balloon; used to drop balloons that left
/// the top of the canvas.
pub const BALLOON_EXTENT: f32 = 36.0;

/// A seed falling from the click position to the ground.
#[derive(Clone, Debug)]
pub struct FallingSeed {
    pub id: SeedId,
    pub pos: Vec2,
    pub start_y: f32,
    pub end_y: f32,
    pub started_at: Millis,
    /// Plant height to grow on landing; `None` for scripted seeds that only
    /// leave a gift behind.
    pub grows: Option<f32>,
}

impl FallingSeed {
    /// Moves the seed along its linear fall.
    ///
    /// ### Returns
    /// `true` once the seed reached the ground.
    pub fn update(&mut self, now: Millis, duration: Millis) -> bool {
        let progress = if duration == 0 {
            1.0
        } else {
            (now.saturating_sub(self.started_at) as f32 / duration as f32).min(1.0)
        };
        self.pos.y = self.start_y + (self.end_y - self.start_y) * progress;
        progress >= 1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardKind {
    /// Left behind by every landed seed.
    Gift,
    /// Optional marker below a finished plant.
    Gem,
}

/// A clickable reward. Pending rewards hold back the ending.
#[derive(Clone, Debug)]
pub struct Reward {
    pub kind: RewardKind,
    pub pos: Vec2,
    pub reward_id: u32,
    pub plant: Option<PlantId>,
    pub opened: bool,
    pub visible: bool,
}

impl Reward {
    pub fn new(kind: RewardKind, pos: Vec2, reward_id: u32, plant: Option<PlantId>) -> Self {
        Self {
            kind,
            pos,
            reward_id,
            plant,
            opened: false,
            visible: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.visible && !self.opened
    }

    pub fn contains(&self, p: Vec2, half_size: Vec2) -> bool {
        let d = (p - self.pos).abs();
        d.x <= half_size.x && d.y <= half_size.y
    }
}

/// Hands out reward ids `1..=count` in order, wrapping around.
#[derive(Clone, Debug)]
pub struct RewardDeck {
    next: u32,
    count: u32,
}

impl RewardDeck {
    pub fn new(count: u32) -> Self {
        Self {
            next: 0,
            count: count.max(1),
        }
    }

    pub fn draw(&mut self) -> u32 {
        let id = self.next + 1;
        self.next = (self.next + 1) % self.count;
        id
    }
}

/// A balloon rising from a landed gift and stopping at its target height.
#[derive(Clone, Debug)]
pub struct RisingBalloon {
    pub pos: Vec2,
    pub target_y: f32,
    /// Where the string attaches on the gift.
    pub anchor: Vec2,
    pub color: BalloonColor,
    /// Units per second.
    pub speed: f32,
    pub rising: bool,
    /// Index of the gift in the garden's reward list.
    pub reward: usize,
}

impl RisingBalloon {
    /// Spawns the 4-8 balloons of a freshly landed gift.
    pub fn spawn_for_gift<R: Rng>(
        reward: usize,
        anchor: Vec2,
        gift_top: f32,
        rng: &mut R,
    ) -> Vec<RisingBalloon> {
        let count: u32 = rng.random_range(4..=8);
        (0..count)
            .map(|i| {
                let rise = rng.random_range(60..150) as f32;
                let spread = (i as f32 - (count as f32 - 1.0) / 2.0) * 12.0;
                let jitter = (rng.random::<f32>() - 0.5) * 8.0;
                RisingBalloon {
                    pos: Vec2::new(anchor.x + spread + jitter, gift_top),
                    target_y: gift_top - rise,
                    anchor,
                    color: random_color(rng),
                    speed: rng.random_range(18.0..36.0),
                    rising: true,
                    reward,
                }
            })
            .collect()
    }

    pub fn update(&mut self, dt_secs: f32) {
        if !self.rising {
            return;
        }
        self.pos.y -= self.speed * dt_secs;
        if self.pos.y <= self.target_y {
            self.pos.y = self.target_y;
            self.rising = false;
        }
    }
}

/// A balloon drifting up across the ending screen.
#[derive(Clone, Debug)]
pub struct EndingBalloon {
    pub pos: Vec2,
    pub color: BalloonColor,
    pub speed: f32,
}

impl EndingBalloon {
    /// ### Returns
    /// `false` once the balloon left the top of the canvas.
    pub fn update(&mut self, dt_secs: f32) -> bool {
        self.pos.y -= self.speed * dt_secs;
        self.pos.y + BALLOON_EXTENT >= 0.0
    }
}

/// Emits ending balloons at random intervals, forever.
#[derive(Clone, Debug)]
pub struct EndingSpawner {
    next_at: Millis,
    min_gap: Millis,
    max_gap: Millis,
}

impl EndingSpawner {
    pub fn new(now: Millis, min_gap: Millis, max_gap: Millis) -> Self {
        Self {
            next_at: now,
            min_gap,
            max_gap: max_gap.max(min_gap),
        }
    }

    /// Spawns every balloon due at `now`.
    pub fn spawn_due<R: Rng>(
        &mut self,
        now: Millis,
        canvas: Vec2,
        rng: &mut R,
        out: &mut Vec<EndingBalloon>,
    ) {
        while now >= self.next_at {
            out.push(EndingBalloon {
                pos: Vec2::new(rng.random_range(0.0..canvas.x), canvas.y + 50.0),
                color: random_color(rng),
                speed: rng.random_range(30.0..120.0),
            });
            // A zero gap would never leave this loop.
            self.next_at += rng.random_range(self.min_gap..=self.max_gap).max(1);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootKind {
    Main,
    Branch,
    Small,
}

#[derive(Clone, Copy, Debug)]
pub struct Root {
    pub pos: Vec2,
    pub angle: f32,
    pub kind: RootKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Top-left corner of the view in canvas space.
    pub pos: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Camera that centers `target` at `zoom` on a canvas of `canvas` size.
    pub fn focused_on(target: Vec2, zoom: f32, canvas: Vec2) -> Self {
        Self {
            pos: target - canvas / (2.0 * zoom),
            zoom,
        }
    }

    pub fn lerp(&self, other: &Camera, t: f32) -> Camera {
        Camera {
            pos: self.pos.lerp(other.pos, t),
            zoom: self.zoom + (other.zoom - self.zoom) * t,
        }
    }

    /// Maps a point in view space back to canvas space.
    pub fn view_to_canvas(&self, p: Vec2) -> Vec2 {
        p / self.zoom + self.pos
    }

    pub fn canvas_to_view(&self, p: Vec2) -> Vec2 {
        (p - self.pos) * self.zoom
    }
}
