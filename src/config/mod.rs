//! Configuration handling.
//!
//! Two layers: the per-site extraction rules (`site`), merged from the
//! built-in defaults and caller overrides, and the runtime `Settings` read
//! from environment variables with development defaults, the same way for the
//! library and the binary.

pub mod ordered;
pub mod site;

pub use ordered::OrderedMap;
pub use site::{SiteConfig, SiteOverride, UriSpec, builtin_sites, merge};

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_CONCURRENCY: &str = "HARVEST_CONCURRENCY";
pub const ENV_TIMEOUT_SECS: &str = "HARVEST_TIMEOUT_SECS";
pub const ENV_SITES_FILE: &str = "HARVEST_SITES_FILE";
pub const ENV_REFRESH_MODE: &str = "HARVEST_REFRESH_MODE";

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What a forced refresh does with records already stored for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// New records are appended after the old ones, duplicates included.
    #[default]
    Append,
    /// The site's buckets are cleared before refetching.
    Replace,
}

impl FromStr for RefreshMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            other => Err(ConfigError::InvalidValue {
                field: ENV_REFRESH_MODE,
                reason: format!("expected 'append' or 'replace', got '{}'", other),
            }),
        }
    }
}

/// Runtime settings for a harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Upper bound on (site, language) tasks fetching at once.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// JSON file with site overrides.
    pub sites_file: Option<PathBuf>,
    pub refresh_mode: RefreshMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sites_file: None,
            refresh_mode: RefreshMode::Append,
        }
    }
}

impl Settings {
    /// Load from environment variables, falling back to defaults for anything
    /// unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let concurrency = parse_env::<usize>(ENV_CONCURRENCY)?.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_CONCURRENCY,
                reason: "must be at least 1".to_string(),
            });
        }

        let timeout_secs = parse_env::<u64>(ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS,
                reason: "must be at least 1".to_string(),
            });
        }

        let sites_file = env::var(ENV_SITES_FILE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let refresh_mode = match env::var(ENV_REFRESH_MODE) {
            Ok(v) => v.parse()?,
            Err(_) => RefreshMode::default(),
        };

        Ok(Self {
            concurrency,
            timeout: Duration::from_secs(timeout_secs),
            sites_file,
            refresh_mode,
        })
    }

    /// Site overrides from `sites_file`, or none when no file is configured.
    pub fn site_overrides(&self) -> Result<OrderedMap<SiteOverride>, ConfigError> {
        match &self.sites_file {
            Some(path) => load_site_overrides(path),
            None => Ok(OrderedMap::new()),
        }
    }
}

fn parse_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key,
                reason: format!("'{}': {}", raw, e),
            }),
        Err(_) => Ok(None),
    }
}

/// Read a JSON object of site key to override.
pub fn load_site_overrides(path: &Path) -> Result<OrderedMap<SiteOverride>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
    Io { path: PathBuf, reason: String },
    Parse { path: PathBuf, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
            ConfigError::Io { path, reason } => {
                write!(f, "cannot read {}: {}", path.display(), reason)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "cannot parse {}: {}", path.display(), reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_CONCURRENCY,
            ENV_TIMEOUT_SECS,
            ENV_SITES_FILE,
            ENV_REFRESH_MODE,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.site_overrides().unwrap().is_empty());
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_CONCURRENCY, "8");
            env::set_var(ENV_TIMEOUT_SECS, "5");
            env::set_var(ENV_SITES_FILE, "/etc/harvest/sites.json");
            env::set_var(ENV_REFRESH_MODE, "Replace");
        }
        let settings = Settings::from_env().unwrap();
        clear_env();

        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(
            settings.sites_file,
            Some(PathBuf::from("/etc/harvest/sites.json"))
        );
        assert_eq!(settings.refresh_mode, RefreshMode::Replace);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_CONCURRENCY, "many");
        }
        let err = Settings::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: ENV_CONCURRENCY,
                ..
            }
        ));

        unsafe {
            env::set_var(ENV_CONCURRENCY, "0");
        }
        assert!(Settings::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var(ENV_REFRESH_MODE, "merge");
        }
        let err = Settings::from_env().unwrap_err();
        clear_env();
        assert!(err.to_string().contains("HARVEST_REFRESH_MODE"));
    }

    #[test]
    fn loads_overrides_file() {
        let path = env::temp_dir().join(format!("harvest-sites-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"booking": {{"languageURIs": {{"en": "http://www.booking.com/reviews/x.html"}}}}}}"#
        )
        .unwrap();
        drop(file);

        let overrides = load_site_overrides(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let booking = overrides.get("booking").unwrap();
        assert!(booking.language_uris.as_ref().unwrap().contains_key("en"));
    }

    #[test]
    fn missing_or_broken_file_is_an_error() {
        let missing = Path::new("/definitely/not/here/sites.json");
        assert!(matches!(
            load_site_overrides(missing),
            Err(ConfigError::Io { .. })
        ));

        let path = env::temp_dir().join(format!("harvest-broken-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let result = load_site_overrides(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
