use image::RgbaImage;

use crate::errors::KeeperResult;
use crate::perception::types::Coordinate;

/// Screen template search.
///
/// `Ok(None)` means the template is not currently visible. `Err` is reserved
/// for failures of the capture/match engine itself (display unavailable, etc.).
pub trait ScreenMatcher {
    fn locate(&mut self, template: &RgbaImage) -> KeeperResult<Option<Coordinate>>;
}
