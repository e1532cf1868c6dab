//! Frame-polled background work.
//!
//! Every animation that outlives a single frame (a falling seed, a plant
//! reveal, root growth, a camera move, a plain delay) is a [`Task`] owned by
//! the [`Scheduler`]. Callers get a [`TaskHandle`] back and poll
//! [`Scheduler::is_finished`] instead of awaiting anything; the garden
//! drives all pending tasks once per tick.
//!
//! Handles are issued in increasing order, so an issued handle that is no
//! longer pending has finished. Completed tasks leave nothing behind.

use glam::Vec2;
use rand::Rng;

use crate::scene::{Camera, Root, RootKind};
use crate::types::{Millis, PlantId, SeedId};

/// Opaque completion handle for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Clone, Debug)]
pub enum Task {
    /// Finishes when the seed lands.
    SeedFall(SeedId),
    /// Finishes when the plant's reveal queue is exhausted.
    Reveal(PlantId),
    Roots(RootGrowth),
    Camera(CameraTween),
    Delay { until: Millis },
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<(TaskHandle, Task)>,
    /// Handles of the tasks moved out by [`Scheduler::take_pending`].
    in_flight: Vec<TaskHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> TaskHandle {
        self.next_id += 1;
        TaskHandle(self.next_id)
    }

    pub fn spawn(&mut self, task: Task) -> TaskHandle {
        let handle = self.next_handle();
        self.pending.push((handle, task));
        handle
    }

    /// A handle that is already finished, for requests with nothing to do.
    pub fn resolved(&mut self) -> TaskHandle {
        self.next_handle()
    }

    pub fn is_finished(&self, handle: TaskHandle) -> bool {
        handle.0 != 0
            && handle.0 <= self.next_id
            && !self.in_flight.contains(&handle)
            && !self.pending.iter().any(|(h, _)| *h == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len() + self.in_flight.len()
    }

    /// Moves the pending list out so tasks can be polled against state that
    /// also owns the scheduler. Their handles stay unfinished until
    /// [`Scheduler::restore`].
    pub(crate) fn take_pending(&mut self) -> Vec<(TaskHandle, Task)> {
        let taken = std::mem::take(&mut self.pending);
        self.in_flight = taken.iter().map(|(h, _)| *h).collect();
        taken
    }

    /// Puts back the tasks that are still running; every other taken task
    /// is finished. Tasks spawned while the list was taken are kept after
    /// them.
    pub(crate) fn restore(&mut self, mut still_running: Vec<(TaskHandle, Task)>) {
        self.in_flight.clear();
        still_running.append(&mut self.pending);
        self.pending = still_running;
    }
}

/// Eased camera move between two poses.
#[derive(Clone, Copy, Debug)]
pub struct CameraTween {
    pub from: Camera,
    pub to: Camera,
    pub started_at: Millis,
    pub duration: Millis,
}

impl CameraTween {
    fn progress(&self, now: Millis) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        (now.saturating_sub(self.started_at) as f32 / self.duration as f32).min(1.0)
    }

    pub fn sample(&self, now: Millis) -> Camera {
        self.from.lerp(&self.to, ease_out_cubic(self.progress(now)))
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        self.progress(now) >= 1.0
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// One root of a growth pattern, relative to the seed.
#[derive(Clone, Copy, Debug)]
pub struct RootSpec {
    pub kind: RootKind,
    pub angle: f32,
    pub delay: Millis,
    pub offset: Vec2,
}

const fn spec(kind: RootKind, angle: f32, delay: Millis, dx: f32, dy: f32) -> RootSpec {
    RootSpec {
        kind,
        angle,
        delay,
        offset: Vec2::new(dx, dy),
    }
}

/// The three root layouts a seed picks from: spreading, taproot, fibrous.
pub const ROOT_PATTERNS: [&[RootSpec]; 3] = [
    &[
        spec(RootKind::Main, 0.0, 0, 0.0, 0.0),
        spec(RootKind::Branch, -0.7, 200, -20.0, 25.0),
        spec(RootKind::Branch, 0.7, 300, 20.0, 25.0),
        spec(RootKind::Small, -1.2, 500, -35.0, 45.0),
        spec(RootKind::Small, 1.2, 600, 35.0, 45.0),
        spec(RootKind::Small, -0.3, 800, -15.0, 65.0),
        spec(RootKind::Small, 0.3, 900, 15.0, 65.0),
    ],
    &[
        spec(RootKind::Main, 0.0, 0, 0.0, 0.0),
        spec(RootKind::Main, 0.1, 100, 5.0, 30.0),
        spec(RootKind::Main, -0.1, 200, -5.0, 60.0),
        spec(RootKind::Branch, -0.5, 400, -15.0, 40.0),
        spec(RootKind::Branch, 0.5, 500, 15.0, 40.0),
        spec(RootKind::Small, -0.8, 700, -25.0, 70.0),
        spec(RootKind::Small, 0.8, 800, 25.0, 70.0),
    ],
    &[
        spec(RootKind::Branch, -0.4, 0, -10.0, 0.0),
        spec(RootKind::Branch, 0.4, 100, 10.0, 0.0),
        spec(RootKind::Small, -0.8, 200, -20.0, 15.0),
        spec(RootKind::Small, 0.8, 250, 20.0, 15.0),
        spec(RootKind::Small, -1.1, 350, -30.0, 25.0),
        spec(RootKind::Small, 1.1, 400, 30.0, 25.0),
        spec(RootKind::Small, -0.2, 500, -8.0, 35.0),
        spec(RootKind::Small, 0.2, 550, 8.0, 35.0),
        spec(RootKind::Small, -0.6, 650, -18.0, 45.0),
        spec(RootKind::Small, 0.6, 700, 18.0, 45.0),
    ],
];

/// Roots appearing one by one after their pattern delay.
#[derive(Clone, Debug)]
pub struct RootGrowth {
    started_at: Millis,
    /// Sorted by delay; consumed from the front.
    queue: Vec<(Millis, Root)>,
    cursor: usize,
}

impl RootGrowth {
    /// Picks one of [`ROOT_PATTERNS`] and jitters every root a little
    /// sideways and in angle.
    ///
    /// ### Parameters
    /// - `base` - Canvas position of the main root.
    pub fn new<R: Rng>(base: Vec2, now: Millis, rng: &mut R) -> Self {
        let pattern = ROOT_PATTERNS[rng.random_range(0..ROOT_PATTERNS.len())];
        let mut queue: Vec<(Millis, Root)> = pattern
            .iter()
            .map(|s| {
                let jitter = (rng.random::<f32>() - 0.5) * 10.0;
                let root = Root {
                    pos: base + s.offset + Vec2::new(jitter, 0.0),
                    angle: s.angle + (rng.random::<f32>() - 0.5) * 0.2,
                    kind: s.kind,
                };
                (s.delay, root)
            })
            .collect();
        queue.sort_by_key(|(delay, _)| *delay);

        Self {
            started_at: now,
            queue,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Emits every root whose delay elapsed into `out`.
    ///
    /// ### Returns
    /// `true` once all roots have been emitted.
    pub fn poll(&mut self, now: Millis, out: &mut Vec<Root>) -> bool {
        let elapsed = now.saturating_sub(self.started_at);
        while let Some((delay, root)) = self.queue.get(self.cursor)
            && *delay <= elapsed
        {
            out.push(*root);
            self.cursor += 1;
        }
        self.cursor >= self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn handles_are_unique_and_start_pending() {
        let mut s = Scheduler::new();
        let a = s.spawn(Task::Delay { until: 10 });
        let b = s.spawn(Task::Delay { until: 20 });
        let c = s.resolved();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(!s.is_finished(a));
        assert!(s.is_finished(c));
        assert_eq!(s.pending_count(), 2);
    }

    #[test]
    fn restore_keeps_tasks_spawned_while_taken() {
        let mut s = Scheduler::new();
        let a = s.spawn(Task::Delay { until: 10 });
        let taken = s.take_pending();
        assert_eq!(s.pending_count(), 1);

        let b = s.spawn(Task::Delay { until: 30 });
        s.restore(taken);

        assert_eq!(s.pending_count(), 2);
        assert!(!s.is_finished(a));
        assert!(!s.is_finished(b));
    }

    #[test]
    fn taken_tasks_finish_unless_restored() {
        let mut s = Scheduler::new();
        let handles: Vec<_> = (0..100)
            .map(|i| s.spawn(Task::Delay { until: i }))
            .collect();

        let taken = s.take_pending();
        assert_eq!(s.pending_count(), 100);
        assert!(handles.iter().all(|h| !s.is_finished(*h)));

        let keep = taken.into_iter().filter(|(h, _)| *h == handles[7]).collect();
        s.restore(keep);

        assert_eq!(s.pending_count(), 1);
        assert!(s.in_flight.is_empty());
        assert!(!s.is_finished(handles[7]));
        assert!(handles.iter().filter(|h| **h != handles[7]).all(|h| s.is_finished(*h)));
        // Handles this scheduler never issued are not finished.
        assert!(!s.is_finished(TaskHandle(0)));
        assert!(!s.is_finished(TaskHandle(500)));
    }

    #[test]
    fn ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        // Front-loaded: more than half the distance at half time.
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn camera_tween_reaches_target() {
        let tween = CameraTween {
            from: Camera::default(),
            to: Camera {
                pos: Vec2::new(90.0, 30.0),
                zoom: 3.0,
            },
            started_at: 1_000,
            duration: 1_000,
        };

        assert_eq!(tween.sample(1_000), Camera::default());
        assert!(!tween.is_complete(1_999));

        let mid = tween.sample(1_500);
        assert!(mid.zoom > 2.0 && mid.zoom < 3.0);

        assert!(tween.is_complete(2_000));
        assert_eq!(tween.sample(2_500), tween.to);
    }

    #[test]
    fn roots_appear_after_their_delay() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let base = Vec2::new(320.0, 210.0);
        let mut growth = RootGrowth::new(base, 100, &mut rng);
        let total = growth.len();
        assert!((7..=10).contains(&total));

        let mut roots = Vec::new();
        assert!(!growth.poll(100, &mut roots));
        // Exactly one root of every pattern has no delay.
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].pos.y, base.y);
        assert!((roots[0].pos.x - base.x).abs() <= 15.0);

        assert!(growth.poll(100 + 900, &mut roots));
        assert_eq!(roots.len(), total);
    }
}
