use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;
use serde::Serialize;

use crate::CompostError;
use crate::CompostResult;
use crate::rewriter::DEFAULT_SELF_RENDER_TAG;
use crate::rewriter::RewriteOptions;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["compost.toml", ".compost.toml", ".config/compost.toml"];

/// The key holding compost settings inside `package.json`, used when none of
/// the [`CONFIG_FILE_CANDIDATES`] exist.
pub const PACKAGE_JSON_KEY: &str = "compost";

pub const DEFAULT_COMPONENTS_DIR: &str = "components";
pub const DEFAULT_OUTPUT: &str = "components/compiled.js";
pub const DEFAULT_EXTENSION: &str = "jsx";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// What a build does when at least one component fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
	/// Write nothing and leave any existing artifact untouched.
	#[default]
	Abort,
	/// Write the bundle without the failed components.
	Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
	/// Quiet period after the last change event before rebuilding.
	pub debounce_ms: u64,
}

impl Default for WatchConfig {
	fn default() -> Self {
		Self {
			debounce_ms: DEFAULT_DEBOUNCE_MS,
		}
	}
}

impl WatchConfig {
	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}

/// Configuration loaded from a `compost.toml` file.
///
/// ```toml
/// components = "components"
/// output = "components/compiled.js"
/// extension = "jsx"
/// self_render_tag = "This"
/// on_error = "abort"
/// exclude = ["*.draft.jsx"]
///
/// [watch]
/// debounce_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompostConfig {
	/// Directory holding the component files, relative to the project root.
	pub components: PathBuf,
	/// Path of the compiled bundle, relative to the project root.
	pub output: PathBuf,
	/// Extension (without the dot) of component files.
	pub extension: String,
	/// Root tag whose content is assigned to the component itself.
	pub self_render_tag: String,
	pub on_error: OnError,
	/// Glob patterns matched against component file names.
	pub exclude: Vec<String>,
	pub watch: WatchConfig,
}

impl Default for CompostConfig {
	fn default() -> Self {
		Self {
			components: PathBuf::from(DEFAULT_COMPONENTS_DIR),
			output: PathBuf::from(DEFAULT_OUTPUT),
			extension: DEFAULT_EXTENSION.to_string(),
			self_render_tag: DEFAULT_SELF_RENDER_TAG.to_string(),
			on_error: OnError::default(),
			exclude: vec![],
			watch: WatchConfig::default(),
		}
	}
}

impl CompostConfig {
	/// Resolve the config path from known discovery candidates.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the configuration for the project at `root`.
	///
	/// Returns `Ok(None)` when neither a config file nor a `compost` entry in
	/// `package.json` exists.
	pub fn load(root: &Path) -> CompostResult<Option<CompostConfig>> {
		if let Some(config_path) = Self::resolve_path(root) {
			let content = std::fs::read_to_string(&config_path)?;
			let config: CompostConfig =
				toml::from_str(&content).map_err(|e| CompostError::ConfigParse(e.to_string()))?;

			tracing::debug!(path = %config_path.display(), "loaded config");
			return Ok(Some(config));
		}

		Self::load_package_json(root)
	}

	/// Load the configuration, falling back to defaults when none exists.
	pub fn load_or_default(root: &Path) -> CompostResult<CompostConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	fn load_package_json(root: &Path) -> CompostResult<Option<CompostConfig>> {
		let path = root.join("package.json");
		if !path.is_file() {
			return Ok(None);
		}

		let content = std::fs::read_to_string(&path)?;
		let mut package: serde_json::Value = serde_json::from_str(&content)
			.map_err(|e| CompostError::ConfigParse(format!("package.json: {e}")))?;

		let Some(section) = package.get_mut(PACKAGE_JSON_KEY).map(serde_json::Value::take) else {
			return Ok(None);
		};

		let config: CompostConfig = serde_json::from_value(section)
			.map_err(|e| CompostError::ConfigParse(format!("package.json: {e}")))?;

		tracing::debug!(path = %path.display(), "loaded config from package.json");
		Ok(Some(config))
	}

	/// Absolute component directory for the project at `root`.
	pub fn components_dir(&self, root: &Path) -> PathBuf {
		root.join(&self.components)
	}

	/// Absolute artifact path for the project at `root`.
	pub fn output_path(&self, root: &Path) -> PathBuf {
		root.join(&self.output)
	}

	pub fn rewrite_options(&self) -> RewriteOptions {
		RewriteOptions {
			self_render_tag: self.self_render_tag.clone(),
		}
	}

	/// Compile the `exclude` patterns.
	pub fn exclude_set(&self) -> CompostResult<GlobSet> {
		let mut builder = GlobSetBuilder::new();

		for pattern in &self.exclude {
			let glob = Glob::new(pattern).map_err(|e| {
				CompostError::InvalidExclude {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
			builder.add(glob);
		}

		builder.build().map_err(|e| {
			CompostError::InvalidExclude {
				pattern: self.exclude.join(", "),
				reason: e.to_string(),
			}
		})
	}

	/// Render this configuration as the contents of a `compost.toml`.
	pub fn to_toml(&self) -> CompostResult<String> {
		toml::to_string(self).map_err(|e| CompostError::ConfigParse(e.to_string()))
	}
}
