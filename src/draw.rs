// Window + software drawing utilities.
// Visual effects provided here:
// 1) A resizable window that shows the composited frame.
// 2) A crosshair that follows the mouse while it stands in for a hand.
// 3) A scalable 5x7 bitmap font and translucent panels for the HUD,
//    the loading line and the "Something went wrong" screen.

use crate::config::WINDOW_TITLE;
use crate::error::Error;
use crate::sampler::LoadProgress;
use crate::types::FrameBuffer;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub const WHITE: u32 = 0x00_FF_FF_FF;
pub const GOLD: u32 = 0x00_EA_B3_08;
pub const GRAY: u32 = 0x00_9C_A3_AF;
const DIM: u32 = 0x00_66_66_66;
const PANEL: u32 = 0x00_00_00_00;
const BLUE_FILL: u32 = 0x00_1E_3A_8A;
const BLUE_EDGE: u32 = 0x00_60_A5_FA;
const AMBER_FILL: u32 = 0x00_71_3F_12;
const AMBER_EDGE: u32 = 0x00_FA_CC_15;

const MARGIN: i32 = 24;

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a resizable window.
    /// Visual: a new black window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let options = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Current client size in pixels (follows user resizes).
    pub fn size(&self) -> (usize, usize) {
        let (w, h) = self.window.get_size();
        (w.max(1), h.max(1))
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down.
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// R on the error screen reloads the whole session.
    pub fn r_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::R, KeyRepeat::No)
    }

    /// Mouse position in window pixels, clamped to the window.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0), y.max(0.0)))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }
}

/* ---------- Software drawing: pixels, panels, crosshair ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Blend `color` over the pixel at `alpha` (0..=255).
#[inline]
fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32, alpha: u32) {
    if x < 0 || y < 0 || x as usize >= fb.width || y as usize >= fb.height {
        return;
    }
    let idx = y as usize * fb.width + x as usize;
    let bg = fb.pixels[idx];
    let inv = 255 - alpha;
    let ch = |shift: u32| ((((color >> shift) & 0xFF) * alpha + ((bg >> shift) & 0xFF) * inv) / 255) << shift;
    fb.pixels[idx] = ch(16) | ch(8) | ch(0);
}

/// Translucent rectangle, clipped to the frame.
/// Visual: the darkened "glass" behind HUD text.
pub fn fill_rect_alpha(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u32;
    let (x0, y0) = (x.max(0), y.max(0));
    let x1 = (x + w).min(fb.width as i32);
    let y1 = (y + h).min(fb.height as i32);
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(fb, px, py, color, a);
        }
    }
}

/// 1-pixel rectangle outline.
fn stroke_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    draw_line(fb, x, y, x + w - 1, y, color);
    draw_line(fb, x, y + h - 1, x + w - 1, y + h - 1, color);
    draw_line(fb, x, y, x, y + h - 1, color);
    draw_line(fb, x + w - 1, y, x + w - 1, y + h - 1, color);
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" with a gap in the middle marks where the pointer "hand" is.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- 5x7 bitmap font ---------- */

/// Return a 5x7 glyph bitmap. Lowercase letters share the uppercase shapes.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b01000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '[' => g!(0b01110,0b01000,0b01000,0b01000,0b01000,0b01000,0b01110),
        ']' => g!(0b01110,0b00010,0b00010,0b00010,0b00010,0b00010,0b01110),

        _ => None,
    }
}

/// Width in pixels of `text` at `scale` (5 px glyph + 1 px gap per char).
pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * 6 * scale
}

/// Draw a single glyph at (x,y), each font pixel a `scale`x`scale` block.
/// Visual: glyph in `color` with a black drop shadow for contrast.
fn draw_char(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    // Unknown characters draw as '?' rather than vanishing.
    let Some(rows) = glyph5x7(ch).or_else(|| glyph5x7('?')) else { return };
    let shadow = scale.max(1);
    // Shadow pass first (offset, black), then the glyph itself.
    for (offset, tint) in [(shadow, 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if rowbits & (1 << (4 - rx)) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = x + rx * scale + sx + offset;
                        let py = y + ry as i32 * scale + sy + offset;
                        put_pixel(fb, px, py, tint);
                    }
                }
            }
        }
    }
}

/// Draw a text string using scaled 5x7 glyphs.
pub fn draw_text(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char(fb, x, y, ch, color, scale);
        x += 6 * scale;
    }
}

/// Greedy word wrap to at most `max_chars` per line (long words are split).
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if line.is_empty() { word.len() } else { line.chars().count() + 1 + word.len() };
        if needed > max_chars && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/* ---------- Screens ---------- */

/// Everything the in-experience HUD shows for one frame.
pub struct Hud<'a> {
    pub painting: &'a str,
    pub index: usize, // 0-based
    pub total: usize,
    pub galaxy_active: bool,
    pub tracking: &'a str,
    pub fps: f32,
}

/// Title + hint in the top-left corner. The hint line doubles as the loading counter.
fn draw_title(fb: &mut FrameBuffer, hint: &str) {
    draw_text(fb, MARGIN, MARGIN, WINDOW_TITLE, GOLD, 4);
    draw_text(fb, MARGIN, MARGIN + 7 * 4 + 10, hint, WHITE, 2);
}

/// Full HUD over a running session.
/// Visual: title top-left, "CURRENT" card top-right, mode pill bottom-center,
/// tracker + FPS bottom-left.
pub fn draw_hud(fb: &mut FrameBuffer, hud: &Hud) {
    let (w, h) = (fb.width as i32, fb.height as i32);

    // 1) Title + hint.
    draw_title(fb, "Show hand to activate. Remove hand to switch.");

    // 2) Current painting card.
    let name_lines = wrap_words(hud.painting, 16);
    let counter = format!("{} / {}", hud.index + 1, hud.total);
    let inner = name_lines
        .iter()
        .map(|l| text_width(l, 2))
        .chain([text_width("CURRENT", 1), text_width(&counter, 1)])
        .max()
        .unwrap_or(0);
    let card_w = inner + 32;
    let card_h = 16 + 7 + 8 + name_lines.len() as i32 * 18 + 6 + 7 + 16;
    let card_x = w - MARGIN - card_w;
    fill_rect_alpha(fb, card_x, MARGIN, card_w, card_h, PANEL, 0.6);
    stroke_rect(fb, card_x, MARGIN, card_w, card_h, DIM);

    let right = card_x + card_w - 16;
    let mut y = MARGIN + 16;
    draw_text(fb, right - text_width("CURRENT", 1), y, "CURRENT", GOLD, 1);
    y += 7 + 8;
    for line in &name_lines {
        draw_text(fb, right - text_width(line, 2), y, line, WHITE, 2);
        y += 18;
    }
    y += 6;
    draw_text(fb, right - text_width(&counter, 1), y, &counter, GRAY, 1);

    // 3) Mode pill.
    let (label, sub, fill, edge) = if hud.galaxy_active {
        ("GALAXY ACTIVE", "Swirl your hand", BLUE_FILL, BLUE_EDGE)
    } else {
        ("REMOVE HAND TO SWITCH", "Show hand to restore", AMBER_FILL, AMBER_EDGE)
    };
    let pill_w = text_width(label, 2) + 18 + text_width(sub, 1) + 48;
    let pill_h = 14 + 24;
    let pill_x = (w - pill_w) / 2;
    let pill_y = h - MARGIN - 20 - pill_h;
    fill_rect_alpha(fb, pill_x, pill_y, pill_w, pill_h, fill, 0.6);
    stroke_rect(fb, pill_x, pill_y, pill_w, pill_h, edge);
    draw_text(fb, pill_x + 24, pill_y + 12, label, WHITE, 2);
    draw_text(fb, pill_x + 24 + text_width(label, 2) + 18, pill_y + 16, sub, GRAY, 1);

    // 4) Footer + status.
    let footer = "AR Mode | Normal Blending | Solar System Effect";
    draw_text(fb, (w - text_width(footer, 1)) / 2, h - MARGIN - 7, footer, DIM, 1);
    let status = format!("{} | FPS: {:.1}", hud.tracking, hud.fps);
    draw_text(fb, MARGIN, h - MARGIN - 7, &status, GRAY, 1);
}

/// Loading state: title, "Loading Art... (k/n)", shader notice.
pub fn draw_loading(fb: &mut FrameBuffer, progress: LoadProgress) {
    fb.pixels.fill(0);
    draw_title(fb, &format!("Loading Art... ({}/{})", progress.loaded, progress.total));
    let notice = "Compiling Shaders...";
    let (w, h) = (fb.width as i32, fb.height as i32);
    draw_text(fb, (w - text_width(notice, 2)) / 2, h / 2, notice, GOLD, 2);
}

/// Fatal error screen with the reload affordance.
/// Visual: black screen, gold headline, gray reason, "[R] Reload   [ESC] Quit".
pub fn draw_fatal(fb: &mut FrameBuffer, message: &str) {
    fb.pixels.fill(0);
    let (w, h) = (fb.width as i32, fb.height as i32);
    let title = "Something went wrong.";
    let mut y = h / 2 - 60;
    draw_text(fb, (w - text_width(title, 3)) / 2, y, title, GOLD, 3);
    y += 7 * 3 + 20;

    let max_chars = ((w - 2 * MARGIN) / 12).max(8) as usize;
    let message = if message.is_empty() { "Unknown error occurred" } else { message };
    for line in wrap_words(message, max_chars) {
        draw_text(fb, (w - text_width(&line, 2)) / 2, y, &line, GRAY, 2);
        y += 18;
    }

    let action = "[R] Reload   [ESC] Quit";
    y += 20;
    let bw = text_width(action, 2) + 32;
    fill_rect_alpha(fb, (w - bw) / 2, y - 10, bw, 14 + 20, WHITE, 0.1);
    stroke_rect(fb, (w - bw) / 2, y - 10, bw, 14 + 20, DIM);
    draw_text(fb, (w - text_width(action, 2)) / 2, y, action, WHITE, 2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ARTWORKS;

    #[test]
    fn font_covers_every_hud_string() {
        let mut strings: Vec<&str> = vec![
            WINDOW_TITLE,
            "Show hand to activate. Remove hand to switch.",
            "Loading Art... (3/5)",
            "GALAXY ACTIVE",
            "REMOVE HAND TO SWITCH",
            "Something went wrong.",
            "[R] Reload   [ESC] Quit",
        ];
        strings.extend(DEFAULT_ARTWORKS.iter().map(|(name, _)| *name));
        for s in strings {
            for ch in s.chars() {
                assert!(glyph5x7(ch).is_some(), "missing glyph {ch:?} in {s:?}");
            }
        }
    }

    #[test]
    fn text_width_scales() {
        assert_eq!(text_width("ab", 1), 12);
        assert_eq!(text_width("ab", 3), 36);
        assert_eq!(text_width("", 2), 0);
    }

    #[test]
    fn wrap_keeps_words_together() {
        let lines = wrap_words("The Starry Night (Vincent van Gogh)", 16);
        assert_eq!(lines, vec!["The Starry Night", "(Vincent van", "Gogh)"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 16));
    }

    #[test]
    fn wrap_splits_overlong_words() {
        assert_eq!(wrap_words("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
        assert!(wrap_words("   ", 5).is_empty());
    }

    #[test]
    fn text_lands_in_the_frame() {
        let mut fb = FrameBuffer::new(40, 20);
        draw_text(&mut fb, 1, 1, "Hi", WHITE, 1);
        assert!(fb.pixels.contains(&WHITE));
    }

    #[test]
    fn alpha_rect_is_clipped_and_blended() {
        let mut fb = FrameBuffer { width: 4, height: 4, pixels: vec![0x00_C8_C8_C8; 16] };
        fill_rect_alpha(&mut fb, -2, -2, 4, 4, 0, 0.5);
        // top-left 2x2 halved, the rest untouched
        assert_eq!(fb.pixels[0], 0x00_63_63_63);
        assert_eq!(fb.pixels[5], 0x00_63_63_63);
        assert_eq!(fb.pixels[2], 0x00_C8_C8_C8);
        assert_eq!(fb.pixels[15], 0x00_C8_C8_C8);
    }

    #[test]
    fn screens_survive_tiny_windows() {
        let mut fb = FrameBuffer::new(8, 8);
        let hud = Hud {
            painting: "The Scream (Edvard Munch)",
            index: 4,
            total: 5,
            galaxy_active: true,
            tracking: "pointer",
            fps: 59.9,
        };
        draw_hud(&mut fb, &hud);
        draw_loading(&mut fb, LoadProgress { loaded: 1, attempted: 2, total: 5 });
        draw_fatal(&mut fb, "No masterpieces could be loaded (5 tried).");
    }

    #[test]
    fn crosshair_leaves_a_gap() {
        let mut fb = FrameBuffer::new(21, 21);
        draw_crosshair(&mut fb, 10, 10, 6, WHITE);
        assert_eq!(fb.pixels[10 * 21 + 10], WHITE);
        assert_eq!(fb.pixels[10 * 21 + 11], 0);
        assert_eq!(fb.pixels[10 * 21 + 4], WHITE);
    }
}
