// Physical input simulation via enigo, with arboard for the paste path.
use std::thread::sleep;
use std::time::Duration;

use arboard::Clipboard;
use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::errors::{KeeperError, KeeperResult};
use crate::executor::keys::parse_key;
use crate::executor::text_input::PASTE_MODIFIER;
use crate::perception::types::Coordinate;

/// Input primitives the supervisor drives against the foreground window.
pub trait InputInjector {
    fn press_key(&mut self, key: &str) -> KeeperResult<()>;
    fn double_click(&mut self, at: Coordinate) -> KeeperResult<()>;
    /// Opens chat, pastes `text` and submits it.
    fn paste_and_submit(&mut self, text: &str) -> KeeperResult<()>;
}

fn input_err(e: impl std::fmt::Display) -> KeeperError {
    KeeperError::Executor(e.to_string())
}

/// Real keyboard/mouse backend. Created once at startup.
pub struct EnigoInjector {
    enigo: Enigo,
    clipboard: Clipboard,
    pause: Duration,
}

impl EnigoInjector {
    pub fn new(pause: Duration) -> KeeperResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| KeeperError::Executor(format!("input backend init: {e}")))?;
        let clipboard = Clipboard::new()
            .map_err(|e| KeeperError::Executor(format!("clipboard init: {e}")))?;
        tracing::debug!(pause_ms = pause.as_millis() as u64, "input backend ready");
        Ok(Self {
            enigo,
            clipboard,
            pause,
        })
    }

    fn tap(&mut self, key: Key) -> KeeperResult<()> {
        self.enigo.key(key, Direction::Click).map_err(input_err)?;
        sleep(self.pause);
        Ok(())
    }

    fn chord(&mut self, modifier: Key, key: Key) -> KeeperResult<()> {
        self.enigo.key(modifier, Direction::Press).map_err(input_err)?;
        let clicked = self.enigo.key(key, Direction::Click).map_err(input_err);
        // Always release the modifier, even if the inner click failed.
        self.enigo.key(modifier, Direction::Release).map_err(input_err)?;
        clicked?;
        sleep(self.pause);
        Ok(())
    }
}

impl InputInjector for EnigoInjector {
    fn press_key(&mut self, key: &str) -> KeeperResult<()> {
        let parsed = parse_key(key)?;
        tracing::debug!(key = %key, "press key");
        self.tap(parsed)
    }

    fn double_click(&mut self, at: Coordinate) -> KeeperResult<()> {
        tracing::debug!(x = at.x, y = at.y, "double click");
        self.enigo
            .move_mouse(at.x, at.y, enigo::Coordinate::Abs)
            .map_err(input_err)?;
        for _ in 0..2 {
            self.enigo
                .button(Button::Left, Direction::Click)
                .map_err(input_err)?;
        }
        sleep(self.pause);
        Ok(())
    }

    fn paste_and_submit(&mut self, text: &str) -> KeeperResult<()> {
        tracing::debug!(text = %text, "paste and submit");
        self.tap(Key::Return)?;
        self.clipboard
            .set_text(text.to_string())
            .map_err(|e| KeeperError::Executor(format!("clipboard write: {e}")))?;
        self.chord(PASTE_MODIFIER, Key::Unicode('v'))?;
        self.tap(Key::Return)
    }
}
