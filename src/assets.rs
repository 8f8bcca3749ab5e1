//! Asset tables — turning a config document into decoded audio clips.
//!
//! An asset config is an INI document.  Every section is one command; its
//! numeric keys map tick indices to audio files, and two metadata keys are
//! recognized: `prompt` (an intro clip) and `aliases` (a whitespace-separated
//! list of alternate command names).
//!
//! ```ini
//! [DEFAULT]
//! 1 = numbers/one.wav
//!
//! [count]
//! aliases = cd
//! prompt = ready.wav
//! 3 = numbers/three.wav
//! 2 = numbers/two.wav
//! 0 = ${SOUND_DIR}/go.mp3
//! ```
//!
//! Paths may use `$VAR` / `${VAR}` environment placeholders and a leading
//! `~`, and resolve relative to the config document's own directory, not the
//! process working directory.  An empty value cancels an entry inherited
//! from `[DEFAULT]`.
//!
//! Building is a pure transformation: file reads only, no other side
//! effects.  Every clip is decoded and converted to the playback format
//! here, so the synthesizer downstream never touches the filesystem.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::clip::AudioClip;
use crate::error::{Error, Result};
use crate::ini::IniDocument;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Decoded clips and metadata for one command.
#[derive(Clone, Debug, Default)]
pub struct CommandAssets {
    ticks: BTreeMap<u32, AudioClip>,
    prompt: Option<AudioClip>,
    aliases: Vec<String>,
}

impl CommandAssets {
    pub fn new(ticks: BTreeMap<u32, AudioClip>, prompt: Option<AudioClip>, aliases: Vec<String>) -> Self {
        Self { ticks, prompt, aliases }
    }

    /// The clip for tick `index`, if one is configured.
    pub fn tick(&self, index: u32) -> Option<&AudioClip> {
        self.ticks.get(&index)
    }

    /// The largest configured tick index — the longest countdown this
    /// command supports.
    pub fn max_tick(&self) -> u32 {
        self.ticks.keys().next_back().copied().unwrap_or(0)
    }

    pub fn prompt(&self) -> Option<&AudioClip> {
        self.prompt.as_ref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Mapping from command name to its assets.
#[derive(Clone, Debug, Default)]
pub struct AssetTable {
    commands: HashMap<String, CommandAssets>,
}

impl AssetTable {
    pub fn get(&self, command: &str) -> Option<&CommandAssets> {
        self.commands.get(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandAssets)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<(String, CommandAssets)> for AssetTable {
    fn from_iter<I: IntoIterator<Item = (String, CommandAssets)>>(iter: I) -> Self {
        Self { commands: iter.into_iter().collect() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Build a validated asset table from the INI config at `config_path`.
///
/// `reserved` holds names already claimed elsewhere in the runtime; every
/// command and alias must stay clear of them and of each other.  Whitespace
/// in names is stripped, not rejected.  Unrecognized metadata keys are
/// ignored with a warning.
pub fn load_assets(config_path: &Path, reserved: &[&str]) -> Result<AssetTable> {
    let config_path = expand_user(config_path);
    if !config_path.is_file() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let doc = IniDocument::parse(&std::fs::read_to_string(&config_path)?)?;

    // Aliases in [DEFAULT] would register every command under the same
    // alternate names, which can only collide.
    if doc.defaults().contains_key("aliases") {
        return Err(Error::DefaultSectionAliases);
    }

    // Paths in config files are relative to the config file's directory,
    // not the current working directory.
    let asset_root = config_path.parent().unwrap_or_else(|| Path::new("."));

    let mut claimed: HashSet<String> = reserved.iter().map(|s| s.to_string()).collect();
    let mut commands = HashMap::new();

    for (section, entries) in doc.sections() {
        let name = sanitized_name(section, &claimed)?;
        claimed.insert(name.clone());
        let assets = build_command_assets(&name, &entries, &mut claimed, asset_root)?;
        commands.insert(name, assets);
    }

    Ok(AssetTable { commands })
}

/// Assets of one section: tick clips from the numeric keys, metadata from
/// the rest.
fn build_command_assets(
    name: &str,
    entries: &BTreeMap<String, String>,
    claimed: &mut HashSet<String>,
    asset_root: &Path,
) -> Result<CommandAssets> {
    let mut ticks = BTreeMap::new();
    let mut prompt = None;
    let mut aliases = Vec::new();

    for (key, value) in entries {
        match numeric_key(key) {
            Some(Ok(index)) => {
                // An empty value cancels an inherited default.
                if value.is_empty() {
                    continue;
                }
                ticks.insert(index, load_clip(value, asset_root)?);
            }
            Some(Err(())) => {
                return Err(Error::MalformedKey {
                    section: name.to_string(),
                    key: key.clone(),
                })
            }
            None => match key.as_str() {
                "prompt" => {
                    if !value.is_empty() {
                        prompt = Some(load_clip(value, asset_root)?);
                    }
                }
                "aliases" => {
                    for alias in value.split_whitespace() {
                        let alias = sanitized_name(alias, claimed)?;
                        claimed.insert(alias.clone());
                        aliases.push(alias);
                    }
                }
                // Left-over keys are possibly a typo.
                _ => warn!("[{name}] has an unknown key: {key:?}"),
            },
        }
    }

    if ticks.is_empty() {
        return Err(Error::NoTickClips(name.to_string()));
    }

    Ok(CommandAssets { ticks, prompt, aliases })
}

/// `Some(Ok(n))` for a valid tick key, `Some(Err(()))` for a key that is
/// numeric but not a non-negative integer in range, `None` for metadata.
fn numeric_key(key: &str) -> Option<std::result::Result<u32, ()>> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(key.parse::<u32>().map_err(|_| ()))
}

/// Strip whitespace from a proposed command or alias name and make sure the
/// result is non-empty and unclaimed.
fn sanitized_name(name: &str, claimed: &HashSet<String>) -> Result<String> {
    let cleaned: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(Error::EmptyName(name.to_string()));
    }
    if claimed.contains(&cleaned) {
        return Err(Error::NameCollision(cleaned));
    }
    Ok(cleaned)
}

/// Substitute placeholders in a configured path, resolve it against the
/// config directory and decode the file it points at.
fn load_clip(value: &str, asset_root: &Path) -> Result<AudioClip> {
    let substituted = substitute_vars(value, &|name| std::env::var(name).ok())?;
    let path = expand_user(Path::new(&substituted));
    let file = if path.is_absolute() { path } else { asset_root.join(path) };

    if !file.is_file() {
        return Err(Error::MissingAsset(file));
    }
    AudioClip::load(&file)
}

// ─────────────────────────────────────────────────────────────────────────────
// Path helpers
// ─────────────────────────────────────────────────────────────────────────────

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([^}]+)\})").unwrap());

/// Replace `$VAR` and `${VAR}` with values from `lookup`.  `$$` escapes a
/// literal dollar sign.
fn substitute_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(input) {
        let whole = caps.get(0).expect("match 0 always present");
        out.push_str(&input[last..whole.start()]);

        if caps.get(1).is_some() {
            out.push('$');
        } else {
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .expect("either named group matches")
                .as_str();
            let value = lookup(name).ok_or_else(|| Error::UnresolvedVariable(name.to_string()))?;
            out.push_str(&value);
        }
        last = whole.end();
    }

    out.push_str(&input[last..]);
    Ok(out)
}

/// Expand a leading `~` to the home directory, when one is known.
fn expand_user(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
