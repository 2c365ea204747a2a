// Chat text composition and the platform paste shortcut.
// Chat lines always go through the clipboard so non-Latin text survives.
use enigo::Key;

use crate::config::Category;

/// Modifier held down together with `v` to paste.
#[cfg(target_os = "macos")]
pub const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
pub const PASTE_MODIFIER: Key = Key::Control;

/// The chat line submitted for a `speak` action.
pub fn speech_line(value: &str, announce: bool) -> String {
    if announce {
        format!("{}: {value}.", Category::Speak)
    } else {
        format!("{value}.")
    }
}

/// The chat echo sent ahead of a key-press action in announce mode.
pub fn announcement_line(category: Category, value: &str) -> String {
    format!("{category} {value}.")
}
