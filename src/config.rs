//! Layered settings: built-in defaults, then `bfi.toml`, then `BFI_*`
//! environment variables. Command-line flags are applied on top by `main`.
//!
//! The config file lives in the XDG config home (`~/.config/bfi.toml` on
//! Linux) unless `BFI_CONFIG` points elsewhere:
//!
//! ```toml
//! [engine]
//! memory = 30000
//! brackets = "strict"   # or "balanced"
//! eof = "zero"          # or "unchanged"
//! max_steps = 1000000   # or "none"
//!
//! [shell]
//! newlines = true
//! window = 5
//! prompt = "bf"
//!
//! [colors]
//! op_bracket = "#cba6f7"
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use tracing::{debug, warn};

use crate::engine::EofPolicy;
use crate::program::BracketPolicy;
use crate::tape::DEFAULT_TAPE_SIZE;
use crate::theme::{parse_color, Palette};

const CONFIG_FILE: &str = "bfi.toml";

/// Widest window the `$w` shell command will print.
pub const MAX_WINDOW: usize = 63;

/// Settings consumed by [`crate::Engine::with_settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub memory: usize,
    pub brackets: BracketPolicy,
    pub eof: EofPolicy,
    pub max_steps: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            memory: DEFAULT_TAPE_SIZE,
            brackets: BracketPolicy::default(),
            eof: EofPolicy::default(),
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    /// Print a newline after each executed line.
    pub newlines: bool,
    /// Number of cells shown by the window command; always odd.
    pub window: usize,
    pub prompt: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            newlines: false,
            window: 5,
            prompt: "bf".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub engine: EngineSettings,
    pub shell: ShellSettings,
    pub colors: Palette,
}

impl Settings {
    /// Resolve defaults, the config file and the environment.
    pub fn load() -> Self {
        let mut settings = Self::default();
        if let Some(content) = read_config_file() {
            settings.apply_toml(&content);
        }
        settings.apply_env(|key| env::var(key).ok());
        settings
    }

    /// Settings from config file text alone, on top of the defaults.
    pub fn from_toml_str(content: &str) -> Self {
        let mut settings = Self::default();
        settings.apply_toml(content);
        settings
    }

    /// Apply `key = value` pairs from the `[engine]`, `[shell]` and `[colors]` sections.
    pub fn apply_toml(&mut self, content: &str) {
        for ((section, key), value) in parse_sections(content) {
            let applied = match section.as_str() {
                "engine" => self.apply_engine_value(&key, &value),
                "shell" => self.apply_shell_value(&key, &value),
                "colors" => self.apply_color_value(&key, &value),
                _ => false,
            };
            if !applied {
                warn!(section = %section, key = %key, value = %value, "ignoring unrecognized setting");
            }
        }
    }

    /// Apply `BFI_MEMORY`, `BFI_BRACKETS`, `BFI_EOF` and `BFI_MAX_STEPS` via `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in [
            ("BFI_MEMORY", "memory"),
            ("BFI_BRACKETS", "brackets"),
            ("BFI_EOF", "eof"),
            ("BFI_MAX_STEPS", "max_steps"),
        ] {
            if let Some(value) = lookup(var) {
                if !self.apply_engine_value(key, &value) {
                    warn!(var, value = %value, "ignoring invalid environment value");
                }
            }
        }
    }

    fn apply_engine_value(&mut self, key: &str, value: &str) -> bool {
        let engine = &mut self.engine;
        match key {
            "memory" => set_parsed(&mut engine.memory, value),
            "brackets" => set_parsed(&mut engine.brackets, value),
            "eof" => set_parsed(&mut engine.eof, value),
            "max_steps" => match value.trim().to_ascii_lowercase().as_str() {
                "none" | "unlimited" => {
                    engine.max_steps = None;
                    true
                }
                v => v.parse().map(|n| engine.max_steps = Some(n)).is_ok(),
            },
            _ => false,
        }
    }

    fn apply_shell_value(&mut self, key: &str, value: &str) -> bool {
        let shell = &mut self.shell;
        match key {
            "newlines" => match parse_bool(value) {
                Some(b) => {
                    shell.newlines = b;
                    true
                }
                None => false,
            },
            "window" => match value.trim().parse::<usize>() {
                Ok(0) | Err(_) => false,
                // Keep the cursor in the middle column.
                Ok(n) => {
                    shell.window = n.min(MAX_WINDOW) | 1;
                    true
                }
            },
            "prompt" => {
                shell.prompt = value.to_string();
                true
            }
            _ => false,
        }
    }

    fn apply_color_value(&mut self, key: &str, value: &str) -> bool {
        let Some(color) = parse_color(value) else {
            return false;
        };
        let colors = &mut self.colors;

        macro_rules! set {
            ($($field:ident),*) => {
                match key {
                    $(stringify!($field) => colors.$field = color,)*
                    _ => return false,
                }
            };
        }

        set!(op_right, op_left, op_inc, op_dec, op_output, op_input, op_bracket, non_bf);
        true
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, value: &str) -> bool {
    match value.trim().parse() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("BFI_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(CONFIG_FILE);
    Some(path)
}

fn read_config_file() -> Option<String> {
    let path = config_path()?;
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "loaded config file");
            Some(content)
        }
        Err(err) => {
            debug!(path = %path.display(), %err, "no config file");
            None
        }
    }
}

/// Very small hand-rolled parser: `[section]` headers and `key = value` pairs.
/// Values may be quoted or bare; later duplicates win.
fn parse_sections(content: &str) -> Vec<((String, String), String)> {
    let mut section = String::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    let mut pairs: Vec<((String, String), String)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(raw.trim());

        let entry = (section.clone(), key.trim().to_string());
        match seen.get(&entry) {
            Some(&i) => pairs[i].1 = value.to_string(),
            None => {
                seen.insert(entry.clone(), pairs.len());
                pairs.push((entry, value.to_string()));
            }
        }
    }

    pairs
}

/// Strip quotes and any trailing `# comment`. A quoted value ends at its
/// closing quote; a bare value ends before the first ` #`.
fn unquote(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return &rest[..end];
        }
    }
    match raw.find(" #").or_else(|| raw.find("\t#")) {
        Some(i) => raw[..i].trim_end(),
        None => raw,
    }
}
