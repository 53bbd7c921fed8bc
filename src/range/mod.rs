//! Archery range engine.
//!
//! One `GameState` aggregate owns the archer, the target, the arrows in flight,
//! score and timer bookkeeping. The browser layer feeds it discrete commands
//! and calls [`GameState::frame`] once per animation frame; everything here is
//! plain data so it runs (and is tested) off the browser too.
//!
//! Frame order: tick the timer, clear, draw the archer, move/draw/collide each
//! arrow newest-first, draw the target.

use rand::Rng;

pub mod config;
pub mod draw;
pub mod hud;

pub use config::{ConfigError, RangeConfig};
pub use draw::Surface;
pub use hud::{Controls, HudText};

// --- Input -------------------------------------------------------------------

/// Discrete commands from the input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    LoadBow,
    /// Decreases the aim angle.
    AimUp,
    /// Increases the aim angle.
    AimDown,
    Fire,
}

impl Command {
    /// Default keyboard binding: g load, s aim up, w aim down, k fire.
    /// Unbound keys map to `None` and are dropped.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "g" => Some(Command::LoadBow),
            "s" => Some(Command::AimUp),
            "w" => Some(Command::AimDown),
            "k" => Some(Command::Fire),
            _ => None,
        }
    }
}

// --- Entities ----------------------------------------------------------------

/// Snapshot taken when the bow is loaded. The angle does not follow later aim changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NockedArrow {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    /// Radians, clamped to ±aim_limit.
    pub aim_angle: f64,
    pub bow_loaded: bool,
    pub nocked: Option<NockedArrow>,
    nock_offset: f64,
}

impl Player {
    pub fn new(cfg: &RangeConfig) -> Self {
        let (x, y) = cfg.player_origin();
        Self {
            x,
            y,
            aim_angle: 0.0,
            bow_loaded: false,
            nocked: None,
            nock_offset: cfg.nock_offset,
        }
    }

    /// No-op when already loaded.
    pub fn load(&mut self) {
        if self.bow_loaded {
            return;
        }
        self.bow_loaded = true;
        self.nocked = Some(NockedArrow {
            x: self.x + self.nock_offset,
            y: self.y,
            angle: self.aim_angle,
        });
    }

    pub fn adjust_aim(&mut self, delta: f64, limit: f64) {
        self.aim_angle = (self.aim_angle + delta).clamp(-limit, limit);
    }

    /// Releases the nocked arrow, if there is one.
    pub fn loose(&mut self, speed: f64) -> Option<Arrow> {
        if !self.bow_loaded {
            return None;
        }
        let nocked = self.nocked.take()?;
        self.bow_loaded = false;
        Some(Arrow {
            x: nocked.x,
            y: nocked.y,
            vx: nocked.angle.cos() * speed,
            vy: -nocked.angle.sin() * speed,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrow {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Arrow {
    /// Semi-implicit step: move with the current velocity, then apply gravity.
    pub fn integrate(&mut self, gravity: f64) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;
    }

    /// Only the right and bottom edges reclaim arrows.
    pub fn past_edge(&self, width: f64, height: f64) -> bool {
        self.x > width || self.y > height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Target {
    pub fn new(cfg: &RangeConfig) -> Self {
        let (x, y) = cfg.initial_target_origin();
        Self {
            x,
            y,
            width: cfg.initial_target_size,
            height: cfg.initial_target_size,
        }
    }

    /// Strict containment; an arrow exactly on an edge misses.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.x && x < self.x + self.width && y > self.y && y < self.y + self.height
    }

    /// Four independent uniform draws within the configured bounds.
    pub fn randomize<R: Rng + ?Sized>(&mut self, cfg: &RangeConfig, rng: &mut R) {
        self.x = rng.gen_range(cfg.target_x_range());
        self.y = rng.gen_range(cfg.target_y_range());
        self.width = rng.gen_range(cfg.target_size_range());
        self.height = rng.gen_range(cfg.target_size_range());
    }
}

// --- Score & timer -----------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub current: u32,
    /// Best `current` seen this session.
    pub highest: u32,
}

impl Score {
    fn bump(&mut self) -> u32 {
        self.current += 1;
        self.highest = self.highest.max(self.current);
        self.current
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timer {
    /// Seconds since the last reset or checkpoint.
    pub elapsed: f64,
    /// Best checkpoint time; infinite until the first checkpoint.
    pub fastest: f64,
    /// Clock reading (ms) of the last accumulation.
    pub last_ms: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            fastest: f64::INFINITY,
            last_ms: 0.0,
        }
    }
}

impl Timer {
    fn accumulate(&mut self, now_ms: f64) {
        self.elapsed += (now_ms - self.last_ms) / 1000.0;
        self.last_ms = now_ms;
    }

    fn restart(&mut self, now_ms: f64) {
        self.elapsed = 0.0;
        self.last_ms = now_ms;
    }

    pub fn fastest(&self) -> Option<f64> {
        self.fastest.is_finite().then_some(self.fastest)
    }
}

/// Snapshot taken on every n-th hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkpoint {
    pub hits: u32,
    pub time: f64,
    pub new_fastest: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    pub game_running: bool,
    pub timer_running: bool,
}

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub hits: u32,
    pub lost: u32,
    /// In hit order; more than one only when `checkpoint_every` is 1.
    pub checkpoints: Vec<Checkpoint>,
    /// False when the frame was skipped because the game is stopped.
    pub ran: bool,
}

// --- Game state --------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct GameState {
    pub cfg: RangeConfig,
    pub player: Player,
    pub target: Target,
    /// Insertion order; newest last.
    pub arrows: Vec<Arrow>,
    pub score: Score,
    pub timer: Timer,
    pub run: RunState,
}

impl GameState {
    /// Rejects configs that would make target placement or checkpointing panic.
    pub fn new(cfg: RangeConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::assemble(cfg))
    }

    fn assemble(cfg: RangeConfig) -> Self {
        Self {
            player: Player::new(&cfg),
            target: Target::new(&cfg),
            arrows: Vec::new(),
            score: Score::default(),
            timer: Timer::default(),
            run: RunState::default(),
            cfg,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.game_running
    }

    /// Apply one input command. Dropped entirely while stopped.
    pub fn handle(&mut self, cmd: Command) {
        if !self.run.game_running {
            return;
        }
        match cmd {
            Command::LoadBow => self.player.load(),
            Command::AimUp => self.player.adjust_aim(-self.cfg.aim_step, self.cfg.aim_limit),
            Command::AimDown => self.player.adjust_aim(self.cfg.aim_step, self.cfg.aim_limit),
            Command::Fire => {
                if let Some(arrow) = self.player.loose(self.cfg.arrow_speed) {
                    log::debug!("arrow loosed vx={:.2} vy={:.2}", arrow.vx, arrow.vy);
                    self.arrows.push(arrow);
                }
            }
        }
    }

    pub fn tick(&mut self, now_ms: f64) {
        if self.run.timer_running {
            self.timer.accumulate(now_ms);
        }
    }

    /// Count a hit. Every `checkpoint_every` hits the elapsed time is offered as
    /// the fastest time and the timer restarts, improved or not.
    pub fn register_hit(&mut self, now_ms: f64) -> Option<Checkpoint> {
        let hits = self.score.bump();
        log::debug!("hit #{hits}");
        if hits % self.cfg.checkpoint_every != 0 {
            return None;
        }
        let time = self.timer.elapsed;
        let new_fastest = time < self.timer.fastest;
        if new_fastest {
            self.timer.fastest = time;
        }
        self.timer.restart(now_ms);
        log::info!("checkpoint at {hits} hits: {time:.2}s (fastest: {new_fastest})");
        Some(Checkpoint {
            hits,
            time,
            new_fastest,
        })
    }

    /// Returns true when this call moved the game from stopped to running; the
    /// caller then owns scheduling the first frame.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.run.game_running {
            return false;
        }
        self.run = RunState {
            game_running: true,
            timer_running: true,
        };
        self.timer.last_ms = now_ms;
        log::info!("range open");
        true
    }

    /// Stop and zero the clock. Score, best score and fastest time survive.
    pub fn reset(&mut self, now_ms: f64) {
        self.run = RunState::default();
        self.timer.restart(now_ms);
        log::info!("range closed at score {}", self.score.current);
    }

    /// One animation frame. Does nothing while stopped; the caller should stop
    /// scheduling when `ran` is false or the game is no longer running.
    pub fn frame<R, S>(&mut self, now_ms: f64, rng: &mut R, surface: &mut S) -> FrameReport
    where
        R: Rng + ?Sized,
        S: Surface + ?Sized,
    {
        let mut report = FrameReport::default();
        if !self.run.game_running {
            return report;
        }
        report.ran = true;

        self.tick(now_ms);
        draw::clear(surface, &self.cfg);
        draw::draw_archer(surface, &self.player);

        // Newest first; removing index i leaves 0..i untouched.
        for i in (0..self.arrows.len()).rev() {
            let arrow = &mut self.arrows[i];
            arrow.integrate(self.cfg.gravity);
            draw::draw_arrow(surface, arrow);

            if self.target.contains(arrow.x, arrow.y) {
                self.arrows.remove(i);
                report.hits += 1;
                report.checkpoints.extend(self.register_hit(now_ms));
                self.target.randomize(&self.cfg, rng);
                continue;
            }

            if arrow.past_edge(self.cfg.canvas_width, self.cfg.canvas_height) {
                self.arrows.remove(i);
                report.lost += 1;
                log::debug!("arrow left the range");
            }
        }

        draw::draw_target(surface, &self.target);
        report
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::assemble(RangeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::draw::tests::{Op, Recorder};
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::FRAC_PI_4;

    fn running() -> GameState {
        let mut g = GameState::default();
        g.start(0.0);
        g
    }

    #[test]
    fn commands_dropped_while_stopped() {
        let mut g = GameState::default();
        g.handle(Command::LoadBow);
        g.handle(Command::AimDown);
        assert!(!g.player.bow_loaded);
        assert_eq!(g.player.aim_angle, 0.0);
    }

    #[test]
    fn aim_up_decreases_angle() {
        let mut g = running();
        g.handle(Command::AimUp);
        assert!((g.player.aim_angle + g.cfg.aim_step).abs() < 1e-12);
        g.handle(Command::AimDown);
        g.handle(Command::AimDown);
        assert!((g.player.aim_angle - g.cfg.aim_step).abs() < 1e-12);
    }

    #[test]
    fn aim_never_leaves_limit() {
        let mut g = running();
        for _ in 0..100 {
            g.handle(Command::AimDown);
            assert!(g.player.aim_angle <= FRAC_PI_4);
        }
        assert_eq!(g.player.aim_angle, FRAC_PI_4);
        for _ in 0..100 {
            g.handle(Command::AimUp);
            assert!(g.player.aim_angle >= -FRAC_PI_4);
        }
        assert_eq!(g.player.aim_angle, -FRAC_PI_4);
    }

    #[test]
    fn fire_uses_frozen_angle() {
        let mut g = running();
        g.handle(Command::LoadBow);
        for _ in 0..10 {
            g.handle(Command::AimDown);
        }
        g.handle(Command::Fire);
        let a = g.arrows[0];
        assert_eq!(a.vx, g.cfg.arrow_speed);
        assert_eq!(a.vy, 0.0);
        assert_eq!((a.x, a.y), (80.0, 350.0));
        assert!(!g.player.bow_loaded);
        assert!(g.player.nocked.is_none());
    }

    #[test]
    fn upward_shot_has_negative_vy() {
        let mut g = running();
        g.handle(Command::AimDown);
        g.handle(Command::LoadBow);
        g.handle(Command::Fire);
        assert!(g.arrows[0].vy < 0.0);
    }

    #[test]
    fn integrate_uses_pre_gravity_velocity() {
        let mut a = Arrow {
            x: 0.0,
            y: 0.0,
            vx: 2.0,
            vy: -1.0,
        };
        a.integrate(0.3);
        assert_eq!((a.x, a.y), (2.0, -1.0));
        assert!((a.vy - -0.7).abs() < 1e-12);
    }

    #[test]
    fn boundary_is_a_miss() {
        let t = Target {
            x: 100.0,
            y: 100.0,
            width: 20.0,
            height: 20.0,
        };
        assert!(t.contains(110.0, 110.0));
        assert!(!t.contains(100.0, 110.0));
        assert!(!t.contains(120.0, 110.0));
        assert!(!t.contains(110.0, 100.0));
        assert!(!t.contains(110.0, 120.0));
    }

    #[test]
    fn randomized_target_within_bounds() {
        let cfg = RangeConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut t = Target::new(&cfg);
        for _ in 0..500 {
            t.randomize(&cfg, &mut rng);
            assert!(cfg.target_x_range().contains(&t.x));
            assert!(cfg.target_y_range().contains(&t.y));
            assert!(cfg.target_size_range().contains(&t.width));
            assert!(cfg.target_size_range().contains(&t.height));
        }
    }

    #[test]
    fn checkpoint_every_fifth_hit() {
        let mut g = running();
        g.timer.elapsed = 3.5;
        for _ in 0..4 {
            assert!(g.register_hit(10.0).is_none());
        }
        let cp = g.register_hit(42.0).unwrap();
        assert_eq!(cp.hits, 5);
        assert!(cp.new_fastest);
        assert_eq!(g.timer.fastest(), Some(3.5));
        assert_eq!(g.timer.elapsed, 0.0);
        assert_eq!(g.timer.last_ms, 42.0);

        // Slower round: clock still restarts, fastest unchanged.
        g.timer.elapsed = 9.0;
        for _ in 0..4 {
            g.register_hit(50.0);
        }
        let cp = g.register_hit(60.0).unwrap();
        assert!(!cp.new_fastest);
        assert_eq!(g.timer.fastest(), Some(3.5));
        assert_eq!(g.timer.elapsed, 0.0);
    }

    #[test]
    fn frame_skipped_when_stopped() {
        let mut g = GameState::default();
        let mut rec = Recorder::default();
        let mut rng = StdRng::seed_from_u64(1);
        let report = g.frame(16.0, &mut rng, &mut rec);
        assert!(!report.ran);
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn frame_draws_in_order() {
        let mut g = running();
        g.arrows.push(Arrow {
            x: 200.0,
            y: 50.0,
            vx: 1.0,
            vy: 0.0,
        });
        let mut rec = Recorder::default();
        let mut rng = StdRng::seed_from_u64(1);
        g.frame(16.0, &mut rng, &mut rec);
        assert_eq!(rec.ops[0], Op::Clear);
        assert!(matches!(rec.ops[1], Op::Circle(..)));
        // clear, archer (4), arrow, target
        assert_eq!(rec.ops.len(), 7);
        assert_eq!(
            rec.ops[5],
            Op::Line((201.0, 50.0), (191.0, 50.0), draw::INK.to_string())
        );
        assert_eq!(rec.ops[6], Op::Rect(740.0, 200.0, 20.0, 20.0));
    }

    #[test]
    fn only_right_and_bottom_edges_reclaim() {
        let mut g = running();
        let mut rng = StdRng::seed_from_u64(1);
        let mut rec = Recorder::default();
        g.arrows = vec![
            Arrow { x: -50.0, y: -50.0, vx: -5.0, vy: -30.0 },
            Arrow { x: 799.0, y: 10.0, vx: 5.0, vy: 0.0 },
            Arrow { x: 10.0, y: 399.0, vx: 0.0, vy: 5.0 },
        ];
        let report = g.frame(16.0, &mut rng, &mut rec);
        assert_eq!(report.lost, 2);
        assert_eq!(g.arrows.len(), 1);
        assert!(g.arrows[0].x < 0.0);
    }

    #[test]
    fn hit_removes_only_the_hitting_arrow() {
        let mut g = running();
        let mut rng = StdRng::seed_from_u64(3);
        let mut rec = Recorder::default();
        g.target = Target {
            x: 400.0,
            y: 100.0,
            width: 30.0,
            height: 30.0,
        };
        let stray = Arrow { x: 100.0, y: 20.0, vx: 1.0, vy: 0.0 };
        g.arrows = vec![stray, Arrow { x: 405.0, y: 110.0, vx: 1.0, vy: 0.0 }];
        let report = g.frame(16.0, &mut rng, &mut rec);
        assert_eq!(report.hits, 1);
        assert_eq!(g.score.current, 1);
        assert_eq!(g.arrows.len(), 1);
        assert_eq!(g.arrows[0].x, 101.0);
    }

    #[test]
    fn invalid_config_refused() {
        let zero = RangeConfig {
            checkpoint_every: 0,
            ..RangeConfig::default()
        };
        assert_eq!(GameState::new(zero).unwrap_err(), ConfigError::ZeroCheckpoint);
        let inverted = RangeConfig {
            min_target_y: 500.0,
            ..RangeConfig::default()
        };
        assert_eq!(
            GameState::new(inverted).unwrap_err(),
            ConfigError::EmptyRange("target y")
        );
        assert!(GameState::new(RangeConfig::default()).is_ok());
    }

    #[test]
    fn every_hit_checkpoints_are_all_reported() {
        // Single-point bounds: the target always lands at (740, 350), 30x30.
        let cfg = RangeConfig {
            checkpoint_every: 1,
            min_target_x: 740.0,
            min_target_y: 350.0,
            min_target_size: 30.0,
            initial_target_size: 30.0,
            ..RangeConfig::default()
        };
        let mut g = GameState::new(cfg).unwrap();
        g.start(0.0);
        g.target = Target {
            x: 740.0,
            y: 350.0,
            width: 30.0,
            height: 30.0,
        };
        g.arrows = vec![
            Arrow { x: 744.0, y: 360.0, vx: 1.0, vy: 0.0 },
            Arrow { x: 749.0, y: 360.0, vx: 1.0, vy: 0.0 },
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let mut rec = Recorder::default();
        let report = g.frame(16.0, &mut rng, &mut rec);
        assert_eq!(report.hits, 2);
        let hits: Vec<u32> = report.checkpoints.iter().map(|c| c.hits).collect();
        assert_eq!(hits, vec![1, 2]);
        assert!(g.arrows.is_empty());
    }

    #[test]
    fn key_binding() {
        assert_eq!(Command::from_key("G"), Some(Command::LoadBow));
        assert_eq!(Command::from_key("s"), Some(Command::AimUp));
        assert_eq!(Command::from_key("w"), Some(Command::AimDown));
        assert_eq!(Command::from_key("k"), Some(Command::Fire));
        assert_eq!(Command::from_key("Enter"), None);
    }
}
