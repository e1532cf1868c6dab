//! Interactive pixel garden viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`GardenState`] session and
//! implements [`eframe::App`] to drive it once per frame, forward canvas
//! clicks to it, and draw whatever it currently holds.

use eframe::App;
use garden_core::{
    AppState, ClickOutcome, GardenConfig, GardenState, Script, ScriptStatus,
    flow::SlideKind,
    plant::{BranchKind, PlantStructure},
    scene::{Camera, RewardKind, RootKind},
    types::{BalloonColor, Millis},
};
use glam::Vec2;
use tracing::{debug, info};

/// Longest frame fed into the garden; longer stalls are clipped.
const MAX_FRAME_MS: f64 = 250.0;

const PRESETS: [&str; 3] = ["basic", "garden_party", "flower_tour"];

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions and canvas clicks.
/// 2. Unless `paused`, convert the egui frame time to milliseconds and
///    call [`GardenState::tick`]; step the running script, if any.
/// 3. Render the current screen (splash, slide, garden or ending).
///
/// ### Fields
/// - `garden` - Current garden session.
/// - `cfg` - Configuration used for new sessions.
///
/// - `script` - Demo script being played, if any.
/// - `preset` - Index into [`PRESETS`] selected in the top panel.
///
/// - `paused` - Whether the clock is frozen.
/// - `last_time` - egui time of the previous frame (seconds).
/// - `carry_ms` - Sub-millisecond remainder carried to the next frame.
/// - `last_dt` - Milliseconds fed to the garden on the last frame.
/// - `last_outcome` - Result of the most recent canvas click.
pub struct Viewer {
    garden: GardenState,
    cfg: GardenConfig,

    script: Option<Script>,
    preset: usize,

    paused: bool,
    last_time: Option<f64>,
    carry_ms: f64,
    last_dt: Millis,
    last_outcome: Option<ClickOutcome>,
}

impl Viewer {
    /// Creates a viewer with a fresh session on the splash screen.
    pub fn new(cfg: GardenConfig) -> Self {
        Self {
            garden: GardenState::new(cfg),
            cfg,
            script: None,
            preset: 0,
            paused: false,
            last_time: None,
            carry_ms: 0.0,
            last_dt: 0,
            last_outcome: None,
        }
    }

    /// Throws the current session away and starts over on the splash screen.
    fn restart(&mut self) {
        info!("session restarted");
        self.garden = GardenState::new(self.cfg);
        self.script = None;
        self.last_outcome = None;
        self.carry_ms = 0.0;
    }

    /// Converts an egui timestamp into whole milliseconds since the last
    /// frame, keeping the fractional part for later frames.
    ///
    /// ### Returns
    /// Milliseconds to feed into [`GardenState::tick`].
    fn frame_ms(&mut self, now: f64) -> Millis {
        let Some(last) = self.last_time.replace(now) else {
            return 0;
        };
        let elapsed = ((now - last) * 1000.0).clamp(0.0, MAX_FRAME_MS) + self.carry_ms;
        let whole = elapsed.floor();
        self.carry_ms = elapsed - whole;
        whole as Millis
    }

    /// Advances the session by one frame.
    fn advance(&mut self, now: f64) {
        let dt = self.frame_ms(now);
        if self.paused {
            return;
        }
        self.last_dt = dt;
        self.garden.tick(dt);

        if let Some(script) = &mut self.script
            && script.step(&mut self.garden) == ScriptStatus::Finished
        {
            self.script = None;
        }
    }

    fn start_script(&mut self) {
        let name = PRESETS[self.preset];
        if let Some(script) = Script::preset(name) {
            info!(script = name, "script started");
            self.script = Some(script);
        }
    }

    /// Uniform scale and top-left corner that fit the canvas inside `rect`.
    fn canvas_fit(&self, rect: egui::Rect) -> (egui::Pos2, f32) {
        let canvas = self.cfg.scene.canvas_size;
        let scale = (rect.width() / canvas.x).min(rect.height() / canvas.y);
        let size = egui::vec2(canvas.x, canvas.y) * scale;
        (rect.center() - size / 2.0, scale)
    }

    /// Converts a canvas-space position to screen-space.
    ///
    /// The point is first mapped through the garden camera, then scaled to
    /// fit the canvas inside `rect`. Canvas y grows downwards like egui's.
    ///
    /// ### Parameters
    /// - `p` - Canvas-space position.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    /// - `camera` - Camera to view through; [`Camera::default`] for overlays.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect, camera: Camera) -> egui::Pos2 {
        let (origin, scale) = self.canvas_fit(rect);
        let view = camera.canvas_to_view(p);
        origin + egui::vec2(view.x, view.y) * scale
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect, camera: Camera) -> Vec2 {
        let (origin, scale) = self.canvas_fit(rect);
        let view = (p - origin) / scale;
        camera.view_to_canvas(Vec2::new(view.x, view.y))
    }

    /// Forwards a click at screen position `p` to the garden.
    fn click_at(&mut self, p: egui::Pos2, rect: egui::Rect) {
        let pos = self.screen_to_world(p, rect, self.garden.camera());
        let outcome = self.garden.handle_click(pos);
        debug!(?pos, ?outcome, "canvas click");
        self.last_outcome = Some(outcome);
    }

    /// Builds the top panel UI (pause, restart, scripts).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.paused { "▶ Resume" } else { "⏸ Pause" })
                    .clicked()
                {
                    self.paused = !self.paused;
                }

                if ui.button("Restart").clicked() {
                    self.restart();
                }

                ui.separator();
                egui::ComboBox::from_id_salt("preset")
                    .selected_text(PRESETS[self.preset])
                    .show_ui(ui, |ui| {
                        for (i, name) in PRESETS.iter().enumerate() {
                            ui.selectable_value(&mut self.preset, i, *name);
                        }
                    });

                let idle = self.script.is_none();
                if ui.add_enabled(idle, egui::Button::new("Run script")).clicked() {
                    self.start_script();
                }
                if let Some(script) = &self.script {
                    ui.label(format!("{} ({} left)", script.name(), script.remaining()));
                }
            });
        });
    }

    /// Builds the bottom status bar (state, seeds, plants, tasks).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt = {} ms", self.last_dt));
                ui.label(format!("t = {:.1} s", self.garden.now() as f64 / 1000.0));
                ui.separator();
                ui.label(format!("tasks = {}", self.garden.pending_tasks()));
                ui.label(format!("active stems = {}", self.garden.active_stems()));
                ui.label(format!("plants = {}", self.garden.plants().len()));
                ui.label(format!("seeds = {}", self.garden.seeds_left()));
                ui.separator();
                ui.label(format!("{:?}", self.garden.state()));
                if let Some(outcome) = self.last_outcome {
                    ui.label(format!("last click: {outcome:?}"));
                }
            });
        });
    }

    /// Builds the central panel where the garden is drawn and clicked.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.clicked()
                && let Some(p) = response.interact_pointer_pos()
            {
                self.click_at(p, rect);
            }

            let (origin, scale) = self.canvas_fit(rect);
            let canvas_size = self.cfg.scene.canvas_size;
            let canvas = egui::Rect::from_min_size(
                origin,
                egui::vec2(canvas_size.x, canvas_size.y) * scale,
            );
            let painter = painter.with_clip_rect(canvas);

            match self.garden.state() {
                AppState::Splash => self.draw_splash(&painter, canvas, 0.0),
                AppState::Main => self.draw_garden(&painter, rect),
                AppState::Ending => self.draw_ending(&painter, rect, 0.0),
                AppState::Transitioning => self.draw_transition(&painter, rect, canvas),
            }

            ctx.request_repaint();
        });
    }

    /// Draws both screens of a running slide, offset by its progress.
    fn draw_transition(&self, painter: &egui::Painter, rect: egui::Rect, canvas: egui::Rect) {
        let Some(t) = self.garden.transition() else {
            return;
        };
        let progress = self.garden.transition_progress().unwrap_or(1.0);
        match t.kind {
            SlideKind::Intro => {
                self.draw_garden(painter, rect);
                // Splash moves up and out of view.
                self.draw_splash(painter, canvas, -progress * canvas.height());
            }
            SlideKind::Ending => {
                // Garden moves down while the sky follows from above.
                let shift = progress * canvas.height();
                self.draw_garden_shifted(painter, rect, shift);
                self.draw_ending(painter, rect, shift - canvas.height());
            }
        }
    }

    fn draw_splash(&self, painter: &egui::Painter, canvas: egui::Rect, dy: f32) {
        let canvas = canvas.translate(egui::vec2(0.0, dy));
        painter.rect_filled(canvas, 0.0, egui::Color32::from_rgb(250, 214, 165));
        painter.text(
            canvas.center() - egui::vec2(0.0, 20.0),
            egui::Align2::CENTER_CENTER,
            "Pixel Garden",
            egui::FontId::proportional(36.0),
            egui::Color32::from_rgb(90, 50, 30),
        );
        painter.text(
            canvas.center() + egui::vec2(0.0, 30.0),
            egui::Align2::CENTER_CENTER,
            "click anywhere to start",
            egui::FontId::proportional(16.0),
            egui::Color32::from_rgb(120, 80, 60),
        );
    }

    fn draw_garden(&self, painter: &egui::Painter, rect: egui::Rect) {
        self.draw_garden_shifted(painter, rect, 0.0);
    }

    /// Draws the main garden scene through the garden camera, moved down
    /// by `dy` screen pixels.
    fn draw_garden_shifted(&self, painter: &egui::Painter, rect: egui::Rect, dy: f32) {
        let cam = self.garden.camera();
        let (_, scale) = self.canvas_fit(rect);
        let zoom = scale * cam.zoom;
        let shift = egui::vec2(0.0, dy);
        let to_screen = |p: Vec2| self.world_to_screen(p, rect, cam) + shift;

        let scene = &self.cfg.scene;
        let top_left = to_screen(Vec2::ZERO);
        let ground_left = to_screen(Vec2::new(0.0, scene.ground_y));
        let bottom_right = to_screen(scene.canvas_size);

        painter.rect_filled(
            egui::Rect::from_min_max(top_left, egui::pos2(bottom_right.x, ground_left.y)),
            0.0,
            egui::Color32::from_rgb(236, 222, 196),
        );
        painter.rect_filled(
            egui::Rect::from_min_max(ground_left, bottom_right),
            0.0,
            egui::Color32::from_rgb(139, 94, 60),
        );
        painter.line_segment(
            [ground_left, egui::pos2(bottom_right.x, ground_left.y)],
            egui::Stroke::new(3.0 * zoom, egui::Color32::from_rgb(96, 160, 72)),
        );

        for root in self.garden.roots() {
            let length = match root.kind {
                RootKind::Main => 30.0,
                RootKind::Branch => 20.0,
                RootKind::Small => 12.0,
            };
            // Angle zero points straight down.
            let dir = Vec2::new(root.angle.sin(), root.angle.cos());
            painter.line_segment(
                [to_screen(root.pos), to_screen(root.pos + dir * length)],
                egui::Stroke::new(1.5 * zoom, egui::Color32::from_rgb(230, 210, 170)),
            );
        }

        for plant in self.garden.plants() {
            self.draw_plant(painter, &plant.structure, &to_screen, zoom);
        }

        for seed in self.garden.falling_seeds() {
            let color = egui::Color32::from_rgb(200, 60, 90);
            painter.circle_filled(to_screen(seed.pos), 4.0 * zoom, color);
        }

        let half = scene.reward_half_size;
        for reward in self.garden.rewards().iter().filter(|r| r.visible) {
            let (lo, hi) = (to_screen(reward.pos - half), to_screen(reward.pos + half));
            let r = egui::Rect::from_min_max(lo, hi);
            match (reward.kind, reward.opened) {
                (RewardKind::Gift, false) => {
                    painter.rect_filled(r, 1.0, egui::Color32::from_rgb(220, 60, 90));
                    painter.line_segment(
                        [r.center_top(), r.center_bottom()],
                        egui::Stroke::new(2.0 * zoom, egui::Color32::GOLD),
                    );
                }
                (RewardKind::Gift, true) => {
                    painter.rect_stroke(
                        r,
                        1.0,
                        egui::Stroke::new(1.5 * zoom, egui::Color32::from_rgb(220, 60, 90)),
                        egui::StrokeKind::Inside,
                    );
                }
                (RewardKind::Gem, _) => {
                    let c = r.center();
                    let (hx, hy) = (r.width() / 2.0, r.height() / 2.0);
                    painter.add(egui::Shape::convex_polygon(
                        vec![
                            c + egui::vec2(0.0, -hy),
                            c + egui::vec2(hx, 0.0),
                            c + egui::vec2(0.0, hy),
                            c + egui::vec2(-hx, 0.0),
                        ],
                        egui::Color32::from_rgb(90, 200, 230),
                        egui::Stroke::NONE,
                    ));
                }
            }
        }

        for balloon in self.garden.rising_balloons() {
            let p = to_screen(balloon.pos);
            painter.line_segment(
                [p, to_screen(balloon.anchor)],
                egui::Stroke::new(0.5 * zoom, egui::Color32::DARK_GRAY),
            );
            painter.circle_filled(p, 6.0 * zoom, balloon_color(balloon.color));
        }

        // Counter stays in a fixed corner regardless of the camera.
        let counter =
            self.world_to_screen(Vec2::new(12.0, 12.0), rect, Camera::default()) + shift;
        painter.text(
            counter,
            egui::Align2::LEFT_TOP,
            format!("Seeds: {}", self.garden.seeds_left()),
            egui::FontId::monospace(16.0),
            egui::Color32::from_rgb(60, 40, 30),
        );
    }

    fn draw_plant(
        &self,
        painter: &egui::Painter,
        plant: &PlantStructure,
        to_screen: &impl Fn(Vec2) -> egui::Pos2,
        zoom: f32,
    ) {
        let stem = egui::Color32::from_rgb(76, 140, 60);
        let segment_height = self.cfg.growth.segment_height;

        for seg in plant.segments.iter().filter(|s| s.revealed) {
            let half_w = seg.variant.width() / 2.0;
            painter.rect_filled(
                egui::Rect::from_min_max(
                    to_screen(seg.pos - Vec2::new(half_w, 0.0)),
                    to_screen(seg.pos + Vec2::new(half_w, segment_height)),
                ),
                0.0,
                stem,
            );
        }

        for branch in plant.branches.iter().filter(|b| b.revealed) {
            let sign = branch.direction.sign();
            let tip = match branch.kind {
                BranchKind::DiagonalSplit => Vec2::new(sign * 10.0, -10.0),
                BranchKind::FlowerBranch => Vec2::new(sign * 12.0, -4.0),
            };
            painter.line_segment(
                [to_screen(branch.pos), to_screen(branch.pos + tip)],
                egui::Stroke::new(3.0 * zoom, stem),
            );
        }

        for flower in plant.flowers().filter(|f| f.revealed) {
            let p = to_screen(flower.pos);
            painter.line_segment(
                [p, to_screen(flower.pos + Vec2::new(0.0, 8.0))],
                egui::Stroke::new(0.5 * zoom, egui::Color32::DARK_GRAY),
            );
            painter.circle_filled(p, 5.0 * zoom, balloon_color(flower.color));
        }
    }

    /// Draws the ending sky and its balloons, moved down by `dy` pixels.
    fn draw_ending(&self, painter: &egui::Painter, rect: egui::Rect, dy: f32) {
        let shift = egui::vec2(0.0, dy);
        let to_screen = |p: Vec2| self.world_to_screen(p, rect, Camera::default()) + shift;
        let (_, scale) = self.canvas_fit(rect);

        let sky =
            egui::Rect::from_min_max(to_screen(Vec2::ZERO), to_screen(self.cfg.scene.canvas_size));
        painter.rect_filled(sky, 0.0, egui::Color32::from_rgb(150, 200, 240));

        for balloon in self.garden.ending_balloons() {
            let p = to_screen(balloon.pos);
            painter.line_segment(
                [p, p + egui::vec2(0.0, 20.0 * scale)],
                egui::Stroke::new(0.5 * scale, egui::Color32::DARK_GRAY),
            );
            painter.circle_filled(p, 10.0 * scale, balloon_color(balloon.color));
        }

        painter.text(
            sky.center(),
            egui::Align2::CENTER_CENTER,
            "Thank you for playing",
            egui::FontId::proportional(28.0),
            egui::Color32::WHITE,
        );
    }
}

fn balloon_color(color: BalloonColor) -> egui::Color32 {
    match color {
        BalloonColor::Blue => egui::Color32::from_rgb(70, 130, 230),
        BalloonColor::Green => egui::Color32::from_rgb(80, 190, 100),
        BalloonColor::Red => egui::Color32::from_rgb(230, 70, 70),
        BalloonColor::Yellow => egui::Color32::from_rgb(240, 210, 60),
    }
}

impl App for Viewer {
    /// eframe callback that advances the garden and builds all UI panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.advance(now);

        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}
