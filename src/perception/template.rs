/// Exact template search over an RGBA screenshot.
///
/// The scan is row-major and stops at the first window where every opaque
/// template pixel matches the screen within `CHANNEL_TOLERANCE` on each colour
/// channel. Fully transparent template pixels match anything. Windows are
/// rejected on their first mismatching pixel, so a typical miss costs one or
/// two comparisons per position.
use image::{Rgba, RgbaImage};

use crate::perception::types::Coordinate;

/// Per-channel slack absorbing colour rounding from capture backends.
pub const CHANNEL_TOLERANCE: u8 = 8;

fn pixel_matches(screen: &Rgba<u8>, template: &Rgba<u8>) -> bool {
    template[3] == 0 || (0..3).all(|c| screen[c].abs_diff(template[c]) <= CHANNEL_TOLERANCE)
}

fn window_matches(haystack: &RgbaImage, needle: &RgbaImage, left: u32, top: u32) -> bool {
    needle
        .enumerate_pixels()
        .all(|(x, y, px)| pixel_matches(haystack.get_pixel(left + x, top + y), px))
}

/// Returns the centre of the first window of `haystack` that matches `needle`.
pub fn find_template(haystack: &RgbaImage, needle: &RgbaImage) -> Option<Coordinate> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return None;
    }

    // A fully transparent template would match everywhere; treat it as unusable.
    let (ax, ay, anchor) = needle.enumerate_pixels().find(|(_, _, p)| p[3] != 0)?;

    for top in 0..=(hh - nh) {
        for left in 0..=(hw - nw) {
            if !pixel_matches(haystack.get_pixel(left + ax, top + ay), anchor) {
                continue;
            }
            if window_matches(haystack, needle, left, top) {
                return Some(Coordinate::new((left + nw / 2) as i32, (top + nh / 2) as i32));
            }
        }
    }
    None
}
