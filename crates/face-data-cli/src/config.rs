//! Configuration file support for face-data.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/face-data/config.toml` (lowest priority)
//! - Project-local: `.face-data.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use face_data_adapters::{FfhqVersion, TransformType};
use face_data_core::transforms::ops::check_stats;
use face_data_core::Split;
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// CelebAMask-HQ settings.
    pub celebamask: CelebAMaskConfig,
    /// FFHQ settings.
    pub ffhq: FfhqConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seed for random augmentation.
    pub seed: Option<u64>,
}

/// CelebAMask-HQ configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CelebAMaskConfig {
    /// Dataset root directory.
    pub root: Option<PathBuf>,
    /// Split name.
    pub split: Option<String>,
    /// Square resize target.
    pub resize: Option<u32>,
    /// Horizontal flip probability (0.0-1.0).
    pub flip_prob: Option<f64>,
    /// Normalization mean, one value per channel or a single value.
    pub mean: Option<Vec<f32>>,
    /// Normalization std, one value per channel or a single value.
    pub std: Option<Vec<f32>>,
}

/// FFHQ configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FfhqConfig {
    /// Dataset root directory.
    pub root: Option<PathBuf>,
    /// Split name.
    pub split: Option<String>,
    /// Square output size.
    pub img_size: Option<u32>,
    /// Resolution variant directory name.
    pub version: Option<String>,
    /// Default transform preset: "resize" or "none".
    pub transform_type: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/face-data/config.toml`
    /// 2. Project-local: `.face-data.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}; using the default");
        }

        config
    }

    /// Clears every invalid value so the default applies instead, returning
    /// one message per cleared key.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        for (key, split) in [
            ("celebamask.split", &mut self.celebamask.split),
            ("ffhq.split", &mut self.ffhq.split),
        ] {
            if let Some(s) = split.take_if(|s| s.parse::<Split>().is_err()) {
                problems.push(format!(
                    "{key} must be one of train, valid, test, all, got '{s}'"
                ));
            }
        }
        if let Some(p) = self
            .celebamask
            .flip_prob
            .take_if(|p| !(0.0..=1.0).contains(&*p))
        {
            problems.push(format!("celebamask.flip_prob must be 0.0-1.0, got {p}"));
        }
        if self.celebamask.resize.take_if(|r| *r == 0).is_some() {
            problems.push("celebamask.resize must be positive".to_string());
        }
        if let Some(e) = self
            .celebamask
            .mean
            .as_deref()
            .and_then(|mean| check_stats(mean, &[1.0]).err())
        {
            self.celebamask.mean = None;
            problems.push(format!("celebamask.mean is invalid: {e}"));
        }
        if let Some(e) = self
            .celebamask
            .std
            .as_deref()
            .and_then(|std| check_stats(&[0.0], std).err())
        {
            self.celebamask.std = None;
            problems.push(format!("celebamask.std is invalid: {e}"));
        }
        if let (Some(mean), Some(std)) = (&self.celebamask.mean, &self.celebamask.std) {
            if let Err(e) = check_stats(mean, std) {
                self.celebamask.mean = None;
                self.celebamask.std = None;
                problems.push(format!("celebamask.mean and celebamask.std disagree: {e}"));
            }
        }
        if self.ffhq.img_size.take_if(|s| *s == 0).is_some() {
            problems.push("ffhq.img_size must be positive".to_string());
        }
        if let Some(v) = self
            .ffhq
            .version
            .take_if(|v| v.parse::<FfhqVersion>().is_err())
        {
            problems.push(format!(
                "ffhq.version must be 'images1024x1024' or 'thumbnails128x128', got '{v}'"
            ));
        }
        if let Some(t) = self
            .ffhq
            .transform_type
            .take_if(|t| t.parse::<TransformType>().is_err())
        {
            problems.push(format!(
                "ffhq.transform_type must be 'resize' or 'none', got '{t}'"
            ));
        }
        if let Some(f) = self
            .output
            .format
            .take_if(|f| !matches!(f.as_str(), "json" | "jsonl"))
        {
            problems.push(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        self.general.seed = other.general.seed.or(self.general.seed);

        let (base, over) = (&mut self.celebamask, other.celebamask);
        base.root = over.root.or_else(|| base.root.take());
        base.split = over.split.or_else(|| base.split.take());
        base.resize = over.resize.or(base.resize);
        base.flip_prob = over.flip_prob.or(base.flip_prob);
        base.mean = over.mean.or_else(|| base.mean.take());
        base.std = over.std.or_else(|| base.std.take());

        let (base, over) = (&mut self.ffhq, other.ffhq);
        base.root = over.root.or_else(|| base.root.take());
        base.split = over.split.or_else(|| base.split.take());
        base.img_size = over.img_size.or(base.img_size);
        base.version = over.version.or_else(|| base.version.take());
        base.transform_type = over.transform_type.or_else(|| base.transform_type.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-data").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.face-data.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".face-data.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.general.seed.is_none());
        assert!(config.celebamask.root.is_none());
        assert!(config.ffhq.img_size.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
seed = 7

[celebamask]
root = '/data/CelebAMask-HQ'
split = 'valid'
resize = 512
flip_prob = 0.5
mean = [0.5, 0.5, 0.5]
std = [0.5]

[ffhq]
root = '~/data/FFHQ'
split = 'test'
img_size = 256
version = 'thumbnails128x128'
transform_type = 'none'

[output]
format = 'json'
pretty = true
progress = false
";
        let mut config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.seed, Some(7));
        assert_eq!(config.celebamask.split.as_deref(), Some("valid"));
        assert_eq!(config.celebamask.resize, Some(512));
        assert_eq!(config.celebamask.mean, Some(vec![0.5, 0.5, 0.5]));
        assert_eq!(config.celebamask.std, Some(vec![0.5]));
        assert_eq!(config.ffhq.img_size, Some(256));
        assert_eq!(config.ffhq.version.as_deref(), Some("thumbnails128x128"));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert!(config.sanitize().is_empty());
    }

    #[test]
    fn test_merge_overrides_and_preserves() {
        let mut base: AppConfig = toml::from_str(
            r"
[celebamask]
resize = 256
flip_prob = 0.5

[ffhq]
img_size = 64
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[celebamask]
flip_prob = 0.0

[output]
format = 'jsonl'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.celebamask.flip_prob, Some(0.0));
        assert_eq!(base.celebamask.resize, Some(256));
        assert_eq!(base.ffhq.img_size, Some(64));
        assert_eq!(base.output.format, Some("jsonl".to_string()));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[ffhq]
root = '/data/ffhq'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.ffhq.root, Some(PathBuf::from("/data/ffhq")));
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[ffhq]
img_size = "large"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_sanitize_rejects_bad_names() {
        let mut config = AppConfig::default();
        config.celebamask.split = Some("validation".to_string());
        assert!(config.sanitize()[0].contains("celebamask.split"));

        let mut config = AppConfig::default();
        config.ffhq.version = Some("images512x512".to_string());
        assert!(config.sanitize()[0].contains("ffhq.version"));

        let mut config = AppConfig::default();
        config.ffhq.transform_type = Some("crop".to_string());
        assert!(config.sanitize()[0].contains("ffhq.transform_type"));

        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());
        assert!(config.sanitize()[0].contains("output.format"));
    }

    #[test]
    fn test_sanitize_rejects_bad_numbers() {
        let mut config = AppConfig::default();
        config.celebamask.flip_prob = Some(1.5);
        assert!(config.sanitize()[0].contains("flip_prob"));

        let mut config = AppConfig::default();
        config.celebamask.std = Some(vec![0.5, 0.0, 0.5]);
        assert!(config.sanitize()[0].contains("celebamask.std"));

        let mut config = AppConfig::default();
        config.ffhq.img_size = Some(0);
        assert!(config.sanitize()[0].contains("ffhq.img_size"));
    }

    #[test]
    fn test_sanitize_clears_only_invalid_keys() {
        let mut config: AppConfig = toml::from_str(
            r"
[celebamask]
split = 'holdout'
resize = 128
std = [0.0]

[ffhq]
split = 'test'
img_size = 0
",
        )
        .expect("parse config");

        let problems = config.sanitize();

        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("celebamask.split"));
        assert_eq!(config.celebamask.split, None);
        assert_eq!(config.celebamask.std, None);
        assert_eq!(config.ffhq.img_size, None);
        assert_eq!(config.celebamask.resize, Some(128));
        assert_eq!(config.ffhq.split.as_deref(), Some("test"));
        assert!(config.sanitize().is_empty());
    }

    #[test]
    fn test_sanitize_drops_mismatched_stats() {
        let mut config = AppConfig::default();
        config.celebamask.mean = Some(vec![0.5, 0.5]);
        config.celebamask.std = Some(vec![0.2, 0.2, 0.2]);

        let problems = config.sanitize();

        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("disagree"));
        assert!(config.celebamask.mean.is_none() && config.celebamask.std.is_none());
    }

    #[test]
    fn test_sanitize_empty_config_passes() {
        assert!(AppConfig::default().sanitize().is_empty());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/data")), home.join("data"));
        }
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".face-data.toml"), "").unwrap();
        assert_eq!(
            find_config_in_parents(&nested),
            Some(dir.path().join(".face-data.toml"))
        );
    }
}
