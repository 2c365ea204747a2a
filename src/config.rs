use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{KeeperError, KeeperResult};

pub const CONFIG_FILE_NAME: &str = "actions.toml";
pub const DEFAULT_TEMPLATE_NAME: &str = "fp.png";

pub const DEFAULT_LIVENESS_KEY: &str = "o";
pub const DEFAULT_BASE_DELAY_SECS: u64 = 10;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 10;
/// Largest accepted `misc.delay`: one day between liveness checks.
pub const MAX_BASE_DELAY_SECS: u64 = 24 * 60 * 60;

const MISC_LIVENESS_KEY: &str = "friend";
const MISC_DELAY: &str = "delay";
const MISC_OFFLINE: &str = "offline";

/// The closed set of action categories a config document may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Settings group, never dispatched.
    Misc,
    Skill,
    Move,
    Speak,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Misc,
        Category::Skill,
        Category::Move,
        Category::Speak,
    ];

    /// Categories the supervisor may draw from after a successful liveness check.
    pub const DISPATCHABLE: [Category; 3] = [Category::Skill, Category::Move, Category::Speak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Misc => "misc",
            Category::Skill => "skill",
            Category::Move => "move",
            Category::Speak => "speak",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown action category `{s}`"))
    }
}

/// Trigger key → display/value string. Keys are unique within one category.
pub type ActionTable = BTreeMap<String, String>;

// ── On-disk document ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    /// Licence token; may also come from the command line or the environment.
    #[serde(default)]
    pub licence: Option<String>,
    /// Landmark image, relative to the config file's directory.
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Echo every dispatched action into game chat before performing it.
    #[serde(default)]
    pub announce: bool,
    #[serde(default = "default_input_pause_ms")]
    pub input_pause_ms: u64,
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionEntry>,
}

fn default_input_pause_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionEntry {
    /// Kept as a raw string so unknown categories can be skipped instead of failing the load.
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub items: Vec<ActionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionItem {
    pub key: String,
    pub value: ItemValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Text(s) => f.write_str(s),
            ItemValue::Integer(n) => write!(f, "{n}"),
        }
    }
}

// ── Resolved, in-memory configuration ────────────────────────────────────────

/// The three settings every run needs, resolved from the `misc` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiscSettings {
    /// Key that re-opens the panel carrying the landmark.
    pub liveness_key: String,
    pub base_delay_secs: u64,
    /// Consecutive misses tolerated before the loop gives up.
    pub failure_threshold: u32,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            liveness_key: DEFAULT_LIVENESS_KEY.to_string(),
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl MiscSettings {
    /// Reads the required settings out of the `misc` table, defaulting missing ones.
    pub fn resolve(misc: &ActionTable) -> KeeperResult<Self> {
        let liveness_key = misc
            .get(MISC_LIVENESS_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_LIVENESS_KEY.to_string());

        let base_delay_secs = match misc.get(MISC_DELAY) {
            Some(raw) => parse_non_negative::<u64>(MISC_DELAY, raw)?,
            None => DEFAULT_BASE_DELAY_SECS,
        };
        if base_delay_secs > MAX_BASE_DELAY_SECS {
            return Err(KeeperError::Config(format!(
                "misc.{MISC_DELAY} must be at most {MAX_BASE_DELAY_SECS} seconds, got {base_delay_secs}"
            )));
        }

        let failure_threshold = match misc.get(MISC_OFFLINE) {
            Some(raw) => parse_non_negative::<u32>(MISC_OFFLINE, raw)?,
            None => DEFAULT_FAILURE_THRESHOLD,
        };
        if failure_threshold == 0 {
            return Err(KeeperError::Config(format!(
                "misc.{MISC_OFFLINE} must be a positive integer, got 0"
            )));
        }

        Ok(Self {
            liveness_key,
            base_delay_secs,
            failure_threshold,
        })
    }
}

fn parse_non_negative<T: FromStr>(key: &str, raw: &str) -> KeeperResult<T> {
    raw.trim().parse::<T>().map_err(|_| {
        KeeperError::Config(format!(
            "misc.{key} must be a non-negative integer, got `{raw}`"
        ))
    })
}

/// Per-category action tables plus the resolved misc settings.
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ActionConfig {
    tables: BTreeMap<Category, ActionTable>,
    pub misc: MiscSettings,
}

impl ActionConfig {
    /// Builds the tables from raw document entries.
    ///
    /// Unrecognised categories are skipped with a warning and the first
    /// occurrence of a key within a category wins.
    pub fn from_entries(entries: &[ActionEntry]) -> KeeperResult<Self> {
        let mut tables: BTreeMap<Category, ActionTable> =
            Category::ALL.into_iter().map(|c| (c, ActionTable::new())).collect();

        for entry in entries {
            let category = match entry.category.parse::<Category>() {
                Ok(c) => c,
                Err(_) => {
                    tracing::warn!(category = %entry.category, "action category not supported, ignored");
                    continue;
                }
            };
            let table = tables.entry(category).or_default();
            for item in &entry.items {
                if table.contains_key(&item.key) {
                    tracing::debug!(%category, key = %item.key, "duplicate action key ignored");
                    continue;
                }
                table.insert(item.key.clone(), item.value.to_string());
            }
        }

        let misc_table = tables.entry(Category::Misc).or_default();
        let misc = MiscSettings::resolve(misc_table)?;
        fill_misc_defaults(misc_table);

        Ok(Self { tables, misc })
    }

    pub fn table(&self, category: Category) -> Option<&ActionTable> {
        self.tables.get(&category)
    }

    /// Dispatchable categories that have at least one entry.
    pub fn usable_categories(&self) -> Vec<Category> {
        Category::DISPATCHABLE
            .into_iter()
            .filter(|c| self.table(*c).is_some_and(|t| !t.is_empty()))
            .collect()
    }
}

fn fill_misc_defaults(misc: &mut ActionTable) {
    misc.entry(MISC_LIVENESS_KEY.to_string())
        .or_insert_with(|| DEFAULT_LIVENESS_KEY.to_string());
    misc.entry(MISC_DELAY.to_string())
        .or_insert_with(|| DEFAULT_BASE_DELAY_SECS.to_string());
    misc.entry(MISC_OFFLINE.to_string())
        .or_insert_with(|| DEFAULT_FAILURE_THRESHOLD.to_string());
}

/// Everything read from the config file, with paths resolved.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub path: PathBuf,
    #[serde(skip)]
    pub licence: Option<String>,
    pub template: PathBuf,
    pub announce: bool,
    pub input_pause_ms: u64,
    pub actions: ActionConfig,
}

impl AppConfig {
    /// Parses a config document whose relative paths are anchored at `base_dir`.
    pub fn parse(content: &str, path: &Path) -> KeeperResult<Self> {
        let doc: ConfigDocument = toml::from_str(content)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let template = base_dir.join(
            doc.template
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_TEMPLATE_NAME)),
        );
        let actions = ActionConfig::from_entries(&doc.actions)?;
        Ok(Self {
            path: path.to_path_buf(),
            licence: doc.licence.filter(|l| !l.trim().is_empty()),
            template,
            announce: doc.announce,
            input_pause_ms: doc.input_pause_ms,
            actions,
        })
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> KeeperResult<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(KeeperError::Config(format!(
            "{} not found",
            path.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(KeeperError::Config(format!(
        "{CONFIG_FILE_NAME} not found next to executable or in working directory"
    )))
}

pub fn load_config(explicit: Option<&Path>) -> KeeperResult<AppConfig> {
    let path = resolve_config_path(explicit)?;
    let content = std::fs::read_to_string(&path)?;
    let config = AppConfig::parse(&content, &path).map_err(|e| match e {
        KeeperError::TomlDe(de) => {
            KeeperError::Config(format!("{} is malformed: {de}", path.display()))
        }
        other => other,
    })?;
    tracing::info!(
        path = %config.path.display(),
        liveness_key = %config.actions.misc.liveness_key,
        delay = config.actions.misc.base_delay_secs,
        threshold = config.actions.misc.failure_threshold,
        "config loaded"
    );
    tracing::debug!(actions = ?config.actions, "user actions config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, items: &[(&str, ItemValue)]) -> ActionEntry {
        ActionEntry {
            category: category.to_string(),
            items: items
                .iter()
                .map(|(k, v)| ActionItem {
                    key: k.to_string(),
                    value: v.clone(),
                })
                .collect(),
        }
    }

    fn text(s: &str) -> ItemValue {
        ItemValue::Text(s.to_string())
    }

    #[test]
    fn duplicate_keys_keep_first_value() {
        let entries = vec![
            entry("skill", &[("1", text("fireball")), ("1", text("frostbolt"))]),
            entry("skill", &[("1", text("arcane")), ("2", text("blink"))]),
        ];
        let cfg = ActionConfig::from_entries(&entries).unwrap();
        let skill = cfg.table(Category::Skill).unwrap();
        assert_eq!(skill.get("1").map(String::as_str), Some("fireball"));
        assert_eq!(skill.get("2").map(String::as_str), Some("blink"));
        assert_eq!(skill.len(), 2);
    }

    #[test]
    fn unknown_categories_are_skipped() {
        let entries = vec![
            entry("dance", &[("d", text("wave"))]),
            entry("move", &[("w", text("forward"))]),
        ];
        let cfg = ActionConfig::from_entries(&entries).unwrap();
        assert_eq!(cfg.table(Category::Move).unwrap().len(), 1);
        assert_eq!(cfg.usable_categories(), vec![Category::Move]);
    }

    #[test]
    fn misc_defaults_when_absent() {
        let cfg = ActionConfig::from_entries(&[]).unwrap();
        assert_eq!(cfg.misc, MiscSettings::default());
        let misc = cfg.table(Category::Misc).unwrap();
        assert_eq!(misc.get("friend").map(String::as_str), Some("o"));
        assert_eq!(misc.get("delay").map(String::as_str), Some("10"));
        assert_eq!(misc.get("offline").map(String::as_str), Some("10"));
        for c in Category::ALL {
            assert!(cfg.table(c).is_some(), "{c} table missing");
        }
    }

    #[test]
    fn misc_values_accept_strings_and_integers() {
        let entries = vec![entry(
            "misc",
            &[
                ("friend", text("p")),
                ("delay", ItemValue::Integer(0)),
                ("offline", text(" 3 ")),
            ],
        )];
        let cfg = ActionConfig::from_entries(&entries).unwrap();
        assert_eq!(
            cfg.misc,
            MiscSettings {
                liveness_key: "p".into(),
                base_delay_secs: 0,
                failure_threshold: 3,
            }
        );
    }

    #[test]
    fn unparseable_misc_values_are_fatal() {
        let bad_delay = vec![entry("misc", &[("delay", text("soon"))])];
        assert!(matches!(
            ActionConfig::from_entries(&bad_delay),
            Err(KeeperError::Config(_))
        ));

        let negative = vec![entry("misc", &[("offline", ItemValue::Integer(-2))])];
        assert!(matches!(
            ActionConfig::from_entries(&negative),
            Err(KeeperError::Config(_))
        ));

        let zero = vec![entry("misc", &[("offline", ItemValue::Integer(0))])];
        assert!(matches!(
            ActionConfig::from_entries(&zero),
            Err(KeeperError::Config(_))
        ));
    }

    #[test]
    fn oversized_delay_is_rejected_with_its_value() {
        let huge = vec![entry("misc", &[("delay", text("18446744073709551615"))])];
        let err = ActionConfig::from_entries(&huge).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
        assert!(err.to_string().contains("18446744073709551615"), "{err}");

        let one_day = vec![entry("misc", &[("delay", ItemValue::Integer(86_400))])];
        let cfg = ActionConfig::from_entries(&one_day).unwrap();
        assert_eq!(cfg.misc.base_delay_secs, MAX_BASE_DELAY_SECS);

        let past_one_day = vec![entry("misc", &[("delay", ItemValue::Integer(86_401))])];
        assert!(matches!(
            ActionConfig::from_entries(&past_one_day),
            Err(KeeperError::Config(_))
        ));
    }

    #[test]
    fn parses_full_document() {
        let content = r#"
licence = "abc"
announce = true

[[action]]
type = "misc"
items = [ { key = "offline", value = 3 } ]

[[action]]
type = "speak"
items = [ { key = "k1", value = "hello" } ]

[[action]]
type = "emote"
items = [ { key = "x", value = "dance" } ]
"#;
        let path = Path::new("/opt/keeper/actions.toml");
        let cfg = AppConfig::parse(content, path).unwrap();
        assert_eq!(cfg.licence.as_deref(), Some("abc"));
        assert!(cfg.announce);
        assert_eq!(cfg.input_pause_ms, 1000);
        assert_eq!(cfg.template, Path::new("/opt/keeper").join("fp.png"));
        assert_eq!(cfg.actions.misc.failure_threshold, 3);
        assert_eq!(cfg.actions.misc.base_delay_secs, 10);
        assert_eq!(
            cfg.actions
                .table(Category::Speak)
                .and_then(|t| t.get("k1"))
                .map(String::as_str),
            Some("hello")
        );
    }

    #[test]
    fn malformed_document_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[[action]\ntype = ").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)), "{err}");
        assert!(err.is_fatal_startup());
    }

    #[test]
    fn missing_explicit_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
    }

    #[test]
    fn loads_from_disk_with_custom_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "template = \"assets/landmark.png\"\n[[action]]\ntype = \"skill\"\nitems = [{ key = \"1\", value = \"strike\" }]\n",
        )
        .unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.template, dir.path().join("assets/landmark.png"));
        assert_eq!(cfg.actions.usable_categories(), vec![Category::Skill]);
    }
}
