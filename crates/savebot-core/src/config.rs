use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::ChannelId, errors::Error, Result};

const DEFAULT_REQUIRED_CHANNELS: &str = "@Tepthon,@TepthonHelp";
const DEFAULT_DB_PATH: &str = "saves.db";

/// Typed configuration, read once at startup and shared as `Arc<Config>`.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub required_channels: Vec<ChannelId>,
    pub db_path: PathBuf,

    // Inline search
    pub search_limit: usize,
    pub inline_cache_time: u32,
    pub gate_cache_time: u32,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,

    // Behavior flags
    pub notify_internal_errors: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| get("BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let required_channels = parse_channels(
            &get("REQUIRED_CHANNELS").unwrap_or_else(|| DEFAULT_REQUIRED_CHANNELS.to_string()),
        );
        if required_channels.is_empty() {
            return Err(Error::Config(
                "REQUIRED_CHANNELS must list at least one channel".to_string(),
            ));
        }

        // Unset falls back to the default; set-but-blank is a mistake worth failing on.
        let db_path = match get("DB_PATH") {
            None => PathBuf::from(DEFAULT_DB_PATH),
            Some(v) if v.trim().is_empty() => {
                return Err(Error::Config("DB_PATH is set but empty".to_string()));
            }
            Some(v) => PathBuf::from(v.trim()),
        };

        let search_limit = parse_num::<usize>(get("SEARCH_LIMIT"))
            .unwrap_or(20)
            .clamp(1, 50);
        let inline_cache_time = parse_num::<u32>(get("INLINE_CACHE_TIME")).unwrap_or(5);
        let gate_cache_time = parse_num::<u32>(get("GATE_CACHE_TIME")).unwrap_or(10);

        let audit_log_path = PathBuf::from(
            get("AUDIT_LOG_PATH")
                .and_then(non_empty)
                .unwrap_or_else(|| "/tmp/savebot-audit.log".to_string()),
        );
        let audit_log_json = parse_bool(get("AUDIT_LOG_JSON")).unwrap_or(false);

        let notify_internal_errors = parse_bool(get("NOTIFY_INTERNAL_ERRORS")).unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            required_channels,
            db_path,
            search_limit,
            inline_cache_time,
            gate_cache_time,
            audit_log_path,
            audit_log_json,
            notify_internal_errors,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_channels(raw: &str) -> Vec<ChannelId> {
    let mut out: Vec<ChannelId> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let ch = ChannelId::new(part);
        if !out.contains(&ch) {
            out.push(ch);
        }
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
