//! Command registry — the bridge between an asset table and the chat
//! command layer.
//!
//! Command wiring is data here: every configured command yields one
//! [`CommandSpec`] capturing its invocation names and duration bounds, and
//! the external command router picks the specs up through the
//! [`CommandRouter`] extension trait.  The router owns prefix parsing,
//! permissions and user-facing messages; this module only decides what is
//! registrable and which durations are in bounds.

use crate::assets::AssetTable;

/// Countdown length used when an invocation does not name one, capped by
/// the command's own maximum.
pub const DEFAULT_SECONDS: u32 = 3;

/// Everything the command layer needs to wire up one countdown command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Primary invocation name.
    pub name: String,
    /// Asset-table key to synthesize from.
    pub asset: String,
    /// Alternate invocation names.
    pub aliases: Vec<String>,
    /// Largest requestable countdown, from the command's largest tick.
    pub max_seconds: u32,
    /// Length used when the invocation does not name one.
    pub default_seconds: u32,
}

impl CommandSpec {
    /// Whether a requested duration is within this command's bounds.
    pub fn allows(&self, seconds: u32) -> bool {
        seconds <= self.max_seconds
    }

    /// Whether `name` invokes this command, as primary name or alias.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Extension interface of the external command-routing collaborator.
pub trait CommandRouter {
    fn register(&mut self, spec: &CommandSpec);
}

/// The full set of command specs derived from one asset table.
#[derive(Clone, Debug, Default)]
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn from_assets(table: &AssetTable) -> Self {
        let mut specs: Vec<CommandSpec> = table
            .iter()
            .map(|(name, assets)| {
                let max_seconds = assets.max_tick();
                CommandSpec {
                    name: name.to_string(),
                    asset: name.to_string(),
                    aliases: assets.aliases().to_vec(),
                    max_seconds,
                    default_seconds: DEFAULT_SECONDS.min(max_seconds),
                }
            })
            .collect();
        // Table iteration order is arbitrary; registration order shouldn't be.
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Self { specs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look a command up by primary name or alias.
    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|s| s.answers_to(name))
    }

    /// Hand every spec to the external router.
    pub fn register_all(&self, router: &mut dyn CommandRouter) {
        for spec in &self.specs {
            router.register(spec);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
