//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ FINGER COUNT │ camera panel                          [LIVE] │
//! │              │                                              │
//! │      5       │    trails, skeleton, landmark dots           │
//! │              │                                              │
//! │ HAND DETECTED│                                       (SND)  │
//! ├──────────────┴──────────────────────────────────────────────┤
//! │ status bar / key legend                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use finger_count::classifier::extended_fingers;
use finger_count::landmark::{INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP};
use finger_count::{DetectionResult, HandObservation, Mode, TrailSegment, HAND_CONNECTIONS};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const PANEL_W:        usize = 320;
const STATUS_H:       usize = 40;
const BG_COLOR:       u32   = 0xFF0F172A;
const CAMERA_BG:      u32   = 0xFF111827;
const PANEL_BG:       u32   = 0xFF1E293B;
const STATUS_BG:      u32   = 0xFF0B1120;
const INDIGO:         u32   = 0xFF6366F1;
const AMBER:          u32   = 0xFFFBBF24;
const TIP_HIGHLIGHT:  u32   = 0xFFFFFFFF;
const LIVE_RED:       u32   = 0xFFEF4444;
const MUTED:          u32   = 0xFF64748B;
const TEXT:           u32   = 0xFFE2E8F0;
const SKELETON_WIDTH: f32   = 3.0;
const DOT_RADIUS:     f32   = 4.0;

const TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

// ════════════════════════════════════════════════════════════════════════════
// Scene / UiCommand
// ════════════════════════════════════════════════════════════════════════════

/// Everything one frame needs to draw.
pub struct Scene<'a> {
    pub mode:     &'a Mode,
    pub result:   Option<&'a DetectionResult>,
    pub hands:    &'a [HandObservation],
    pub segments: &'a [TrailSegment],
    pub sound_on: bool,
    pub status:   &'a str,
}

/// Commands for the app rather than the landmark source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    ToggleDetection,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// CameraRect: normalised ↔ pixel mapping
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRect {
    pub x:      usize,
    pub y:      usize,
    pub w:      usize,
    pub h:      usize,
    pub mirror: bool,
}

impl CameraRect {
    pub fn for_window(width: usize, height: usize, mirror: bool) -> Self {
        CameraRect {
            x: PANEL_W.min(width),
            y: 0,
            w: width.saturating_sub(PANEL_W),
            h: height.saturating_sub(STATUS_H),
            mirror,
        }
    }

    /// Normalised landmark coordinates → window pixels.
    pub fn to_px(&self, nx: f32, ny: f32) -> (f32, f32) {
        let nx = if self.mirror { 1.0 - nx } else { nx };
        (self.x as f32 + nx * self.w as f32, self.y as f32 + ny * self.h as f32)
    }

    /// Window pixels → normalised coordinates, `None` outside the panel.
    pub fn to_normalized(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        let nx = (px - self.x as f32) / self.w as f32;
        let ny = (py - self.y as f32) / self.h as f32;
        if !(0.0..=1.0).contains(&nx) || !(0.0..=1.0).contains(&ny) {
            return None;
        }
        Some((if self.mirror { 1.0 - nx } else { nx }, ny))
    }

    /// Centre of the sound indicator (bottom-right corner) and the top-left
    /// of its label.  Clamped to the window origin on tiny windows.
    pub fn sound_indicator(&self) -> ((f32, f32), (usize, usize)) {
        let cx = (self.x + self.w).saturating_sub(30);
        let cy = (self.y + self.h).saturating_sub(30);
        ((cx as f32, cy as f32), (cx.saturating_sub(11), cy.saturating_sub(5)))
    }
}

/// Big number in the count panel: the total, or `-` without a hand.
pub fn count_label(result: Option<&DetectionResult>) -> String {
    match result {
        Some(r) if r.is_hand_detected => r.finger_count.to_string(),
        _ => "-".to_string(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
    camera: CameraRect,
    /// Present only when hands are simulated.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(cfg: &AppConfig, sim_tx: Option<Sender<SimInput>>) -> Result<Self, AppError> {
        let (width, height) = (cfg.window_width, cfg.window_height);
        let window = Window::new(
            "Finger Tone",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            camera: CameraRect::for_window(width, height, cfg.mirror),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    fn pressed(&self, k: Key) -> bool {
        self.window.is_key_pressed(k, KeyRepeat::No)
    }

    /// Poll the keyboard and mouse.  Simulation input goes straight to the
    /// landmark source; app commands are returned.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        let mut cmds = Vec::new();
        if self.pressed(Key::Q) || self.pressed(Key::Escape) {
            cmds.push(UiCommand::Quit);
            return cmds;
        }
        if self.pressed(Key::Space) {
            cmds.push(UiCommand::ToggleDetection);
        }

        let Some(tx) = self.sim_tx.as_ref() else { return cmds };

        let shift = self.window.is_key_down(Key::LeftShift)
                 || self.window.is_key_down(Key::RightShift);
        let pose_keys = [Key::Key0, Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];
        for (count, &k) in pose_keys.iter().enumerate() {
            if self.pressed(k) {
                let _ = tx.send(SimInput::Pose { hand: shift as usize, count: count as u32 });
            }
        }
        if self.pressed(Key::H) {
            let _ = tx.send(SimInput::ToggleSecondHand);
        }
        if self.pressed(Key::X) {
            let _ = tx.send(SimInput::ToggleVisible);
        }
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
            if let Some((x, y)) = self.camera.to_normalized(mx, my) {
                let _ = tx.send(SimInput::Pointer { x, y });
            }
        }
        cmds
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene<'_>) {
        self.buf.fill(BG_COLOR);
        let cam = self.camera;
        self.fill_rect(cam.x, cam.y, cam.w, cam.h, CAMERA_BG);

        // ── Trails, skeleton, dots (detecting only) ─────────────────────────
        if scene.mode.is_detecting() {
            for seg in scene.segments {
                let a = cam.to_px(seg.from.0, seg.from.1);
                let b = cam.to_px(seg.to.0, seg.to.1);
                self.draw_line(a, b, seg.width.max(1.0), INDIGO, seg.alpha);
            }
            for hand in scene.hands {
                self.draw_hand(hand);
            }
        }

        self.draw_badge(scene.mode);
        if scene.sound_on {
            let (centre, (lx, ly)) = cam.sound_indicator();
            self.fill_circle(centre, 18.0, INDIGO, 0.9);
            self.draw_text("SND", lx, ly, 2, TEXT);
        }

        self.draw_count_panel(scene);

        // ── Status bar ──────────────────────────────────────────────────────
        let sy = self.height.saturating_sub(STATUS_H);
        self.fill_rect(0, sy, self.width, STATUS_H, STATUS_BG);
        self.draw_text(scene.status, 10, sy + 8, 2, TEXT);
        self.draw_text(
            "SPACE=start/stop  0-5=pose  SHIFT+0-5=hand 2  H=2nd hand  X=hide  Q=quit",
            10, sy + 26, 1, MUTED,
        );

        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Hand ──────────────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandObservation) {
        let cam = self.camera;
        let px = |i: usize| {
            let p = hand.get(i);
            cam.to_px(p.x, p.y)
        };
        for (a, b) in HAND_CONNECTIONS {
            self.draw_line(px(a), px(b), SKELETON_WIDTH, INDIGO, 1.0);
        }
        for p in hand.points() {
            self.fill_circle(cam.to_px(p.x, p.y), DOT_RADIUS, AMBER, 1.0);
        }
        for (&tip, extended) in TIPS.iter().zip(extended_fingers(hand)) {
            if extended {
                self.fill_circle(px(tip), DOT_RADIUS + 2.0, TIP_HIGHLIGHT, 0.6);
            }
        }
    }

    // ── Badge ─────────────────────────────────────────────────────────────

    fn draw_badge(&mut self, mode: &Mode) {
        let (label, color) = match mode {
            Mode::Detecting     => ("LIVE", LIVE_RED),
            Mode::Idle          => ("READY", MUTED),
            Mode::LoadingModel  => ("LOADING", MUTED),
            Mode::Error { .. }  => ("ERROR", LIVE_RED),
        };
        let w = label.len() * 8 + 16;
        let x = (self.camera.x + self.camera.w).saturating_sub(w + 12);
        self.fill_rect(x, 12, w, 22, color);
        self.draw_text(label, x + 8, 18, 2, TEXT);
    }

    // ── Count panel ───────────────────────────────────────────────────────

    fn draw_count_panel(&mut self, scene: &Scene<'_>) {
        let h = self.height.saturating_sub(STATUS_H);
        self.fill_rect(0, 0, PANEL_W, h, PANEL_BG);
        self.draw_text("FINGER COUNT", 20, 24, 2, MUTED);

        let detected = scene.result.map_or(false, |r| r.is_hand_detected);
        let label    = count_label(scene.result);
        let scale    = 20;
        let text_w   = label.len() * 4 * scale;
        let x        = PANEL_W.saturating_sub(text_w) / 2;
        self.draw_text(&label, x, (h / 2).saturating_sub(5 * scale / 2), scale, if detected { TEXT } else { MUTED });

        if detected {
            self.draw_text("HAND DETECTED", 20, h.saturating_sub(60), 2, INDIGO);
        } else {
            self.draw_text("WAITING FOR HAND", 20, h.saturating_sub(60), 2, MUTED);
        }

        if let Mode::Error { message, .. } = scene.mode {
            self.draw_text(message, 20, 60, 1, LIVE_RED);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn blend_pixel(&mut self, x: isize, y: isize, color: u32, alpha: f32) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height { return; }
        let i = y * self.width + x;
        self.buf[i] = blend(self.buf[i], color, alpha);
    }

    fn fill_circle(&mut self, (cx, cy): (f32, f32), r: f32, color: u32, alpha: f32) {
        let ri = r.ceil() as isize;
        let (cxi, cyi) = (cx.round() as isize, cy.round() as isize);
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f32 <= r * r {
                    self.blend_pixel(cxi + dx, cyi + dy, color, alpha);
                }
            }
        }
    }

    /// Thick line, stamped as overlapping discs.
    fn draw_line(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: u32, alpha: f32) {
        if alpha <= 0.0 { return; }
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len   = (dx * dx + dy * dy).sqrt();
        let steps = (len.ceil() as usize).max(1);
        let r     = (width / 2.0).max(0.5);
        // Overlapping stamps compound alpha; translucent strokes stamp lighter.
        let stamp_alpha = if alpha >= 1.0 { 1.0 } else { alpha / (r * 2.0).max(1.0) };
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            self.fill_circle((a.0 + dx * t, a.1 + dy * t), r, color, stamp_alpha);
        }
    }

    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > self.width { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend `src` over `dst`.  `t` = 0.0 → all `dst`, 1.0 → all `src`.
fn blend(dst: u32, src: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u32, b: u32| (a as f32 * (1.0 - t) + b as f32 * t) as u32;
    let (dr, dg, db) = ((dst >> 16) & 0xFF, (dst >> 8) & 0xFF, dst & 0xFF);
    let (sr, sg, sb) = ((src >> 16) & 0xFF, (src >> 8) & 0xFF, src & 0xFF);
    0xFF000000 | (lerp(dr, sr) << 16) | (lerp(dg, sg) << 8) | lerp(db, sb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_rect_leaves_room_for_panel_and_status() {
        let r = CameraRect::for_window(1200, 600, false);
        assert_eq!((r.x, r.y, r.w, r.h), (320, 0, 880, 560));
    }

    #[test]
    fn mirrored_mapping_flips_x() {
        let plain  = CameraRect::for_window(1200, 600, false);
        let mirror = CameraRect::for_window(1200, 600, true);
        assert_eq!(plain.to_px(0.0, 0.5), (320.0, 280.0));
        assert_eq!(mirror.to_px(0.0, 0.5), (1200.0, 280.0));
    }

    #[test]
    fn pointer_round_trip_through_mirror() {
        let r = CameraRect::for_window(1200, 600, true);
        let (px, py) = r.to_px(0.25, 0.75);
        let (nx, ny) = r.to_normalized(px, py).unwrap();
        assert!((nx - 0.25).abs() < 1e-5 && (ny - 0.75).abs() < 1e-5);
        assert!(r.to_normalized(10.0, 10.0).is_none());
    }

    #[test]
    fn sound_indicator_sits_in_corner() {
        let r = CameraRect::for_window(1200, 600, true);
        assert_eq!(r.sound_indicator(), ((1170.0, 530.0), (1159, 525)));
    }

    #[test]
    fn sound_indicator_on_tiny_window() {
        for (w, h) in [(20, 20), (0, 0), (335, 41)] {
            let ((cx, cy), (lx, ly)) = CameraRect::for_window(w, h, false).sound_indicator();
            assert!(cx >= 0.0 && cy >= 0.0);
            assert!(lx as f32 <= cx && ly as f32 <= cy);
        }
    }

    #[test]
    fn count_label_dash_without_hand() {
        assert_eq!(count_label(None), "-");
        let none = DetectionResult::no_hand(0);
        assert_eq!(count_label(Some(&none)), "-");
        let six = DetectionResult { finger_count: 6, is_hand_detected: true, timestamp_ms: 0 };
        assert_eq!(count_label(Some(&six)), "6");
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFF0000FF, 2.0), 0xFF0000FF);
    }

    #[test]
    fn glyphs_case_insensitive() {
        assert_eq!(char_glyph('a'), char_glyph('A'));
        assert_ne!(char_glyph('0'), char_glyph('8'));
    }
}
