pub mod config;
pub mod errors;
pub mod executor;
pub mod licence;
pub mod logging;
pub mod perception;
pub mod supervisor;

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AppConfig;
use crate::errors::KeeperResult;
use crate::executor::alert::DialogNotifier;
use crate::executor::input::EnigoInjector;
use crate::perception::detector::{load_template, PresenceDetector};
use crate::perception::screenshot::XcapMatcher;
use crate::perception::traits::ScreenMatcher;
use crate::supervisor::engine::SupervisorLoop;
use crate::supervisor::state::CycleStats;

/// Startup overrides, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub licence: Option<String>,
    /// Refuse to start unless the landmark is already on screen.
    pub require_landmark: bool,
}

/// Loads config and applies command-line overrides.
pub fn prepare_config(opts: &RunOptions) -> KeeperResult<AppConfig> {
    let mut config = config::load_config(opts.config.as_deref())?;
    if let Some(template) = &opts.template {
        config.template = template.clone();
    }
    if let Some(licence) = &opts.licence {
        config.licence = Some(licence.clone());
    }
    Ok(config)
}

/// Single detection pass before the loop when `require_landmark` is set.
pub fn ensure_startup_landmark(
    config: &AppConfig,
    opts: &RunOptions,
    matcher: &mut dyn ScreenMatcher,
) -> KeeperResult<()> {
    if !opts.require_landmark {
        return Ok(());
    }
    let at = PresenceDetector::new(matcher).require_visible(&config.template)?;
    tracing::info!(%at, "landmark visible at startup");
    Ok(())
}

/// Runs every startup check, builds the desktop collaborators once, then
/// drives the supervision loop until it is exhausted.
pub async fn run(opts: RunOptions) -> KeeperResult<CycleStats> {
    let config = prepare_config(&opts)?;

    licence::check_gate(config.licence.as_deref(), chrono::Utc::now())?;
    load_template(&config.template)?;
    executor::keys::validate_keys(&config.actions)?;

    let mut matcher = XcapMatcher;
    ensure_startup_landmark(&config, &opts, &mut matcher)?;
    let mut injector = EnigoInjector::new(Duration::from_millis(config.input_pause_ms))?;
    let mut notifier = DialogNotifier;

    tracing::info!(template = %config.template.display(), "starting supervision loop");
    let supervisor = SupervisorLoop::new(
        &config,
        PresenceDetector::new(&mut matcher),
        &mut injector,
        &mut notifier,
        StdRng::from_entropy(),
    )?;
    supervisor.run().await
}
