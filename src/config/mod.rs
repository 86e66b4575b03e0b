use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    errors::ConfigError,
    ledger::{check_date_format, DEFAULT_DISPLAY_FORMAT},
    utils::paths,
};

const TMP_SUFFIX: &str = "tmp";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Salary",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

/// User preferences kept next to, but independent of, the transaction data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub currency_symbol: String,
    pub date_format: String,
    pub categories: Vec<String>,
    pub default_category: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            currency_symbol: "₹".into(),
            date_format: DEFAULT_DISPLAY_FORMAT.into(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            default_category: "Food".into(),
        }
    }
}

impl Config {
    /// Case-insensitive lookup returning the canonical category label.
    pub fn find_category(&self, name: &str) -> Option<&str> {
        let needle = name.trim();
        self.categories
            .iter()
            .find(|category| category.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }

    /// Adds a category, returning `false` when it already exists or is blank.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.find_category(name).is_some() {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }

    /// Replaces settings that cannot be used as stored with their defaults.
    fn sanitize(mut self) -> Self {
        if let Err(err) = check_date_format(&self.date_format) {
            tracing::warn!(error = %err, "ignoring configured date format");
            self.date_format = DEFAULT_DISPLAY_FORMAT.into();
        }
        self
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_home())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
        })
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config.sanitize())
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
