use std::path::Path;

use image::RgbaImage;

use crate::errors::{KeeperError, KeeperResult};
use crate::perception::traits::ScreenMatcher;
use crate::perception::types::Coordinate;

/// Loads the landmark image, failing with a configuration error when the
/// user-supplied file is missing or unreadable.
pub fn load_template(path: &Path) -> KeeperResult<RgbaImage> {
    if !path.is_file() {
        tracing::error!(path = %path.display(), "template image is not a file");
        return Err(KeeperError::Config(format!(
            "template image {} is not a file",
            path.display()
        )));
    }
    let image = image::open(path).map_err(|e| {
        KeeperError::Config(format!("template image {} unreadable: {e}", path.display()))
    })?;
    Ok(image.to_rgba8())
}

/// Liveness check: is the landmark on screen right now?
pub struct PresenceDetector<'a> {
    matcher: &'a mut dyn ScreenMatcher,
}

impl<'a> PresenceDetector<'a> {
    pub fn new(matcher: &'a mut dyn ScreenMatcher) -> Self {
        Self { matcher }
    }

    /// One match attempt against the live screen.
    ///
    /// The template file is re-checked on every call since it may be removed
    /// mid-run. Engine failures are downgraded to "not found".
    pub fn locate(&mut self, template_path: &Path) -> KeeperResult<Option<Coordinate>> {
        let template = load_template(template_path)?;
        match self.matcher.locate(&template) {
            Ok(Some(coord)) => {
                tracing::info!(path = %template_path.display(), %coord, "landmark found");
                Ok(Some(coord))
            }
            Ok(None) => {
                tracing::warn!(
                    path = %template_path.display(),
                    "landmark not visible; is the panel open and the game in the foreground?"
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "template search failed; counting as not found");
                Ok(None)
            }
        }
    }

    /// Startup guard: fails unless the landmark is already on screen.
    pub fn require_visible(&mut self, template_path: &Path) -> KeeperResult<Coordinate> {
        self.locate(template_path)?.ok_or_else(|| {
            KeeperError::Config(format!(
                "landmark {} not visible at startup; open the panel before starting",
                template_path.display()
            ))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{write_template, ScriptedMatcher};
    use super::*;

    #[test]
    fn missing_template_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut matcher = ScriptedMatcher::new([Ok(Some(Coordinate::new(1, 1)))]);
        let mut detector = PresenceDetector::new(&mut matcher);
        let err = detector.locate(&dir.path().join("fp.png")).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
        drop(detector);
        assert_eq!(matcher.calls, 0);
    }

    #[test]
    fn engine_failure_counts_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        let mut matcher = ScriptedMatcher::new([
            Err(KeeperError::Perception("display unavailable".into())),
            Ok(Some(Coordinate::new(100, 40))),
        ]);
        let mut detector = PresenceDetector::new(&mut matcher);
        assert_eq!(detector.locate(&path).unwrap(), None);
        assert_eq!(detector.locate(&path).unwrap(), Some(Coordinate::new(100, 40)));
    }

    #[test]
    fn startup_guard_requires_landmark_on_screen() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        let mut matcher = ScriptedMatcher::new([
            Ok(None),
            Err(KeeperError::Perception("capture failed".into())),
            Ok(Some(Coordinate::new(7, 9))),
        ]);
        let mut detector = PresenceDetector::new(&mut matcher);

        let err = detector.require_visible(&path).unwrap_err();
        assert!(matches!(err, KeeperError::Config(ref m) if m.contains("not visible")), "{err}");
        assert!(err.is_fatal_startup());
        assert!(detector.require_visible(&path).is_err());
        assert_eq!(detector.require_visible(&path).unwrap(), Coordinate::new(7, 9));
        drop(detector);
        assert_eq!(matcher.calls, 3);
    }

    #[test]
    fn undecodable_template_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(load_template(&path), Err(KeeperError::Config(_))));
    }
}
