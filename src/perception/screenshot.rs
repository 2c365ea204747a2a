// Screen capture via xcap.
use image::RgbaImage;

use crate::errors::{KeeperError, KeeperResult};
use crate::perception::template::find_template;
use crate::perception::traits::ScreenMatcher;
use crate::perception::types::Coordinate;

/// Captures the first monitor reported by the platform.
///
/// Coordinates in the returned image are assumed to line up with input
/// coordinates, i.e. the game runs on a monitor anchored at the origin.
pub fn capture_primary() -> KeeperResult<RgbaImage> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| KeeperError::Perception(format!("list monitors: {e}")))?;
    let monitor = monitors
        .first()
        .ok_or_else(|| KeeperError::Perception("no monitors found".to_string()))?;
    let image = monitor
        .capture_image()
        .map_err(|e| KeeperError::Perception(format!("capture: {e}")))?;
    tracing::trace!(width = image.width(), height = image.height(), "screen captured");
    Ok(image)
}

/// Live-screen matcher: one capture and one scan per call.
#[derive(Debug, Default)]
pub struct XcapMatcher;

impl ScreenMatcher for XcapMatcher {
    fn locate(&mut self, template: &RgbaImage) -> KeeperResult<Option<Coordinate>> {
        let screen = capture_primary()?;
        Ok(find_template(&screen, template))
    }
}
