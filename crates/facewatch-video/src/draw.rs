//! Pixel-level drawing on BGR frames — rectangles, filled bars, label text.
//!
//! Coordinates may hang off any edge of the frame; out-of-bounds pixels are
//! clipped rather than wrapped.

use crate::frame::Frame;
use font8x8::legacy::BASIC_LEGACY;

/// BGR color triples.
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const RED: [u8; 3] = [0, 0, 255];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Integer scale applied to the 8×8 glyphs when drawing text.
pub const TEXT_SCALE: u32 = 2;

/// Glyph cell height at [`TEXT_SCALE`].
pub const TEXT_HEIGHT: i32 = 8 * TEXT_SCALE as i32;

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = (y as usize * frame.width as usize + x as usize) * 3;
    frame.data[idx..idx + 3].copy_from_slice(&color);
}

/// Draw a rectangle outline with the given edge thickness (grown inward).
pub fn rect_outline(
    frame: &mut Frame,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: [u8; 3],
    thickness: i32,
) {
    for t in 0..thickness {
        for x in left..=right {
            put_pixel(frame, x, top + t, color);
            put_pixel(frame, x, bottom - t, color);
        }
        for y in top..=bottom {
            put_pixel(frame, left + t, y, color);
            put_pixel(frame, right - t, y, color);
        }
    }
}

/// Fill a rectangle, edges inclusive.
pub fn fill_rect(frame: &mut Frame, left: i32, top: i32, right: i32, bottom: i32, color: [u8; 3]) {
    for y in top..=bottom {
        for x in left..=right {
            put_pixel(frame, x, y, color);
        }
    }
}

/// Draw ASCII text with its top-left corner at (x, y).
///
/// Glyphs come from the 8×8 legacy font, scaled by [`TEXT_SCALE`].
/// Non-ASCII characters render as '?'.
pub fn draw_text(frame: &mut Frame, text: &str, x: i32, y: i32, color: [u8; 3]) {
    let scale = TEXT_SCALE as i32;
    let mut pen_x = x;

    for ch in text.chars() {
        let glyph = BASIC_LEGACY
            .get(ch as usize)
            .unwrap_or(&BASIC_LEGACY[b'?' as usize]);

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = pen_x + col as i32 * scale;
                let py = y + row as i32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_pixel(frame, px + dx, py + dy, color);
                    }
                }
            }
        }

        pen_x += 8 * scale;
    }
}
