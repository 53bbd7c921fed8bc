//! Display sink. The engine only ever talks to a `Surface`; the canvas
//! implementation lives at the bottom of this file.

use web_sys::CanvasRenderingContext2d;

use super::{Arrow, Player, RangeConfig, Target};

pub const INK: &str = "black";
pub const AIM_GUIDE: &str = "gray";
pub const TARGET_FILL: &str = "red";

/// Draw primitives the range needs. Coordinates are canvas pixels, y down.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str);
    /// Closed outline through `points`.
    fn stroke_polygon(&mut self, points: &[(f64, f64)], color: &str);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
}

/// Head, body, bow frame, aim guide, then the nocked arrow if any.
pub fn draw_archer<S: Surface + ?Sized>(surface: &mut S, player: &Player) {
    let (x, y) = (player.x, player.y);
    surface.fill_circle(x, y - 20.0, 10.0, INK);
    surface.line((x, y - 10.0), (x, y + 20.0), INK);
    surface.stroke_polygon(&[(x + 20.0, y), (x + 30.0, y - 10.0), (x + 30.0, y + 10.0)], INK);
    surface.line(
        (x + 30.0, y),
        (x + 60.0, y - player.aim_angle.tan() * 30.0),
        AIM_GUIDE,
    );
    if let Some(nocked) = player.nocked.filter(|_| player.bow_loaded) {
        // Drawn with the angle frozen at load time.
        surface.line(
            (nocked.x, nocked.y),
            (nocked.x + 20.0, nocked.y - nocked.angle.tan() * 10.0),
            INK,
        );
    }
}

/// Short shaft trailing behind the arrow tip.
pub fn draw_arrow<S: Surface + ?Sized>(surface: &mut S, arrow: &Arrow) {
    surface.line((arrow.x, arrow.y), (arrow.x - 10.0, arrow.y), INK);
}

pub fn draw_target<S: Surface + ?Sized>(surface: &mut S, target: &Target) {
    surface.fill_rect(target.x, target.y, target.width, target.height, TARGET_FILL);
}

pub fn clear<S: Surface + ?Sized>(surface: &mut S, cfg: &RangeConfig) {
    surface.clear(cfg.canvas_width, cfg.canvas_height);
}

// --- Canvas 2D ---------------------------------------------------------------

impl Surface for CanvasRenderingContext2d {
    fn clear(&mut self, width: f64, height: f64) {
        self.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        self.set_fill_style_str(color);
        self.begin_path();
        let _ = self.arc(x, y, radius, 0.0, std::f64::consts::TAU);
        self.fill();
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str) {
        self.set_stroke_style_str(color);
        self.begin_path();
        self.move_to(from.0, from.1);
        self.line_to(to.0, to.1);
        self.stroke();
    }

    fn stroke_polygon(&mut self, points: &[(f64, f64)], color: &str) {
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return;
        };
        self.set_stroke_style_str(color);
        self.begin_path();
        self.move_to(x0, y0);
        for &(x, y) in rest {
            self.line_to(x, y);
        }
        self.close_path();
        self.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }
}
