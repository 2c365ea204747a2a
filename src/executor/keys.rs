// Key-name parsing shared by config validation and input injection.
use enigo::Key;

use crate::config::{ActionConfig, Category};
use crate::errors::{KeeperError, KeeperResult};

/// Maps a config key name to an enigo key.
///
/// Single characters map to themselves; a handful of names cover the
/// non-printing keys a game keybind is likely to use.
pub fn parse_key(name: &str) -> KeeperResult<Key> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Key::Unicode(c.to_ascii_lowercase()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let key = match lower.as_str() {
        "enter" | "return" => Key::Return,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "backspace" => Key::Backspace,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => {
            return Err(KeeperError::Config(format!("unsupported key name `{name}`")));
        }
    };
    Ok(key)
}

/// Every key the loop may press must be known before the first cycle.
pub fn validate_keys(actions: &ActionConfig) -> KeeperResult<()> {
    parse_key(&actions.misc.liveness_key)
        .map_err(|e| KeeperError::Config(format!("misc.friend: {e}")))?;

    for category in [Category::Skill, Category::Move] {
        let Some(table) = actions.table(category) else {
            continue;
        };
        for key in table.keys() {
            parse_key(key).map_err(|e| KeeperError::Config(format!("{category}.{key}: {e}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionEntry, ActionItem, ItemValue};

    #[test]
    fn parses_single_characters_and_names() {
        assert_eq!(parse_key("o").unwrap(), Key::Unicode('o'));
        assert_eq!(parse_key("O").unwrap(), Key::Unicode('o'));
        assert_eq!(parse_key("3").unwrap(), Key::Unicode('3'));
        assert_eq!(parse_key("Space").unwrap(), Key::Space);
        assert_eq!(parse_key("F11").unwrap(), Key::F11);
        assert_eq!(parse_key(" esc ").unwrap(), Key::Escape);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(parse_key("hyper"), Err(KeeperError::Config(_))));
        assert!(matches!(parse_key(""), Err(KeeperError::Config(_))));
    }

    #[test]
    fn speak_keys_are_not_validated() {
        let entries = vec![
            ActionEntry {
                category: "speak".into(),
                items: vec![ActionItem {
                    key: "greeting".into(),
                    value: ItemValue::Text("hello".into()),
                }],
            },
            ActionEntry {
                category: "move".into(),
                items: vec![ActionItem {
                    key: "w".into(),
                    value: ItemValue::Text("forward".into()),
                }],
            },
        ];
        let actions = ActionConfig::from_entries(&entries).unwrap();
        assert!(validate_keys(&actions).is_ok());
    }

    #[test]
    fn bad_skill_key_is_fatal() {
        let entries = vec![ActionEntry {
            category: "skill".into(),
            items: vec![ActionItem {
                key: "ctrl+1".into(),
                value: ItemValue::Text("burst".into()),
            }],
        }];
        let actions = ActionConfig::from_entries(&entries).unwrap();
        let err = validate_keys(&actions).unwrap_err();
        assert!(err.to_string().contains("skill.ctrl+1"), "{err}");
    }
}
