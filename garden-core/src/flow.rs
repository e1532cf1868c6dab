//! Application flow: splash → transitioning → main → ending.

use tracing::info;

use crate::config::TimingConfig;
use crate::types::Millis;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppState {
    /// Title screen; any click starts the intro slide.
    #[default]
    Splash,
    /// A timed slide between two screens. Clicks are ignored.
    Transitioning,
    /// The garden itself.
    Main,
    /// Celebration screen. Terminal for the session.
    Ending,
}

/// Which slide a transition plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideKind {
    /// Splash screen slides away to reveal the garden.
    Intro,
    /// Garden slides away to the ending sky.
    Ending,
}

impl SlideKind {
    /// State entered once the slide completes.
    pub fn target(self) -> AppState {
        match self {
            SlideKind::Intro => AppState::Main,
            SlideKind::Ending => AppState::Ending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub kind: SlideKind,
    pub started_at: Millis,
    pub duration: Millis,
}

impl Transition {
    /// Elapsed fraction in `[0, 1]`.
    pub fn progress(&self, now: Millis) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed as f32 / self.duration as f32).min(1.0)
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }
}

/// Owns the current [`AppState`] and the running slide, if any.
#[derive(Clone, Debug)]
pub struct FlowController {
    state: AppState,
    transition: Option<Transition>,
    timing: TimingConfig,
}

impl FlowController {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            state: AppState::Splash,
            transition: None,
            timing,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Progress of the running slide, or `None` outside transitions.
    pub fn transition_progress(&self, now: Millis) -> Option<f32> {
        self.transition.map(|t| t.progress(now))
    }

    /// Whether clicks should reach the garden.
    pub fn accepts_garden_clicks(&self) -> bool {
        self.state == AppState::Main
    }

    /// Handles a click on the splash screen.
    ///
    /// ### Returns
    /// `true` if the click started the intro slide.
    pub fn click_splash(&mut self, now: Millis) -> bool {
        if self.state != AppState::Splash {
            return false;
        }
        self.begin(SlideKind::Intro, self.timing.intro_slide, now);
        true
    }

    /// Starts the slide to the ending screen. Only valid from `Main`.
    ///
    /// ### Returns
    /// `true` if the slide started.
    pub fn begin_ending(&mut self, now: Millis) -> bool {
        if self.state != AppState::Main {
            return false;
        }
        self.begin(SlideKind::Ending, self.timing.ending_slide, now);
        true
    }

    fn begin(&mut self, kind: SlideKind, duration: Millis, now: Millis) {
        info!(?kind, duration, from = ?self.state, "transition started");
        self.state = AppState::Transitioning;
        self.transition = Some(Transition {
            kind,
            started_at: now,
            duration,
        });
    }

    /// Completes the running slide once its duration has elapsed.
    ///
    /// ### Returns
    /// The newly entered state, if the slide finished during this call.
    pub fn update(&mut self, now: Millis) -> Option<AppState> {
        let t = self.transition?;
        if !t.is_complete(now) {
            return None;
        }
        self.transition = None;
        self.state = t.kind.target();
        info!(state = ?self.state, "transition complete");
        Some(self.state)
    }
}
