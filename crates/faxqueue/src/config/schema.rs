use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_base_directory")]
    pub base_directory: String,
    #[serde(default)]
    pub directories: DirectoriesConfig,
    /// Source bucket name -> directory. Relative paths resolve against
    /// `base_directory`.
    #[serde(default = "default_sources")]
    pub sources: BTreeMap<String, String>,
    #[serde(default = "default_exclude_suffixes")]
    pub exclude_suffixes: Vec<String>,
    #[serde(default = "default_exclude_contains")]
    pub exclude_contains: Vec<String>,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Replaces a single leading trunk `0` when normalizing fax numbers.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_base_directory() -> String {
    "/srv/kienzlefax".to_string()
}

fn default_sources() -> BTreeMap<String, String> {
    let mut sources = BTreeMap::new();
    for n in 1..=5 {
        sources.insert(format!("fax{}", n), format!("incoming/fax{}", n));
    }
    sources.insert("pdf-zu-fax".to_string(), "pdf-zu-fax".to_string());
    sources.insert("sendefehler".to_string(), "sendefehler/eingang".to_string());
    sources
}

fn default_exclude_suffixes() -> Vec<String> {
    vec!["__OK.pdf".to_string(), "__FAILED.pdf".to_string()]
}

fn default_exclude_contains() -> Vec<String> {
    vec!["__REPORT__".to_string()]
}

fn default_country_code() -> String {
    "49".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            base_directory: default_base_directory(),
            directories: DirectoriesConfig::default(),
            sources: default_sources(),
            exclude_suffixes: default_exclude_suffixes(),
            exclude_contains: default_exclude_contains(),
            limits: LimitsConfig::default(),
            country_code: default_country_code(),
            database_path: None,
        }
    }
}

impl Config {
    /// Defaults rooted at `base`, used by tests and first-time setups.
    pub fn with_base_directory<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base_directory: base.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.base_directory)
    }

    /// Resolved directory for every configured source bucket.
    pub fn source_directories(&self) -> BTreeMap<String, PathBuf> {
        let base = self.base_path();
        self.sources
            .iter()
            .map(|(name, dir)| (name.clone(), base.join(dir)))
            .collect()
    }

    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => self.base_path().join(path),
            None => self.base_path().join("phonebook.sqlite"),
        }
    }
}

/// Stage directory names, relative to the base directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    #[serde(default = "default_staging")]
    pub staging: String,
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(default = "default_processing")]
    pub processing: String,
    #[serde(default = "default_archive_success")]
    pub archive_success: String,
    #[serde(default = "default_archive_failure")]
    pub archive_failure: String,
}

fn default_staging() -> String {
    "staging".to_string()
}

fn default_queue() -> String {
    "queue".to_string()
}

fn default_processing() -> String {
    "processing".to_string()
}

fn default_archive_success() -> String {
    "sendeberichte".to_string()
}

fn default_archive_failure() -> String {
    "sendefehler/berichte".to_string()
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            staging: default_staging(),
            queue: default_queue(),
            processing: default_processing(),
            archive_success: default_archive_success(),
            archive_failure: default_archive_failure(),
        }
    }
}

impl DirectoriesConfig {
    pub fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("staging", &self.staging),
            ("queue", &self.queue),
            ("processing", &self.processing),
            ("archive_success", &self.archive_success),
            ("archive_failure", &self.archive_failure),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_list_files")]
    pub max_list_files: usize,
    #[serde(default = "default_max_active_jobs")]
    pub max_active_jobs: usize,
    #[serde(default = "default_max_fail_list")]
    pub max_fail_list: usize,
    #[serde(default = "default_max_archive_list")]
    pub max_archive_list: usize,
}

fn default_max_list_files() -> usize {
    500
}

fn default_max_active_jobs() -> usize {
    12
}

fn default_max_fail_list() -> usize {
    200
}

fn default_max_archive_list() -> usize {
    25
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_list_files: default_max_list_files(),
            max_active_jobs: default_max_active_jobs(),
            max_fail_list: default_max_fail_list(),
            max_archive_list: default_max_archive_list(),
        }
    }
}
