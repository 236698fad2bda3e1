//! Project and component scaffolding used by `compost init` and
//! `compost create`.

use std::path::Path;
use std::path::PathBuf;

use crate::CompostError;
use crate::CompostResult;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::config::CompostConfig;

/// Check a custom element name: a lowercase first word, a hyphen, then
/// lowercase letters, digits and single hyphens, never ending in a hyphen.
///
/// Equivalent to `^[a-z]+-(-?[a-z0-9]+)+$`.
pub fn is_valid_tag_name(tag: &str) -> bool {
	let Some((first, rest)) = tag.split_once('-') else {
		return false;
	};

	!first.is_empty()
		&& first.bytes().all(|byte| byte.is_ascii_lowercase())
		&& !rest.is_empty()
		&& !rest.ends_with('-')
		&& !rest.contains("--")
		&& rest
			.bytes()
			.all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-')
}

pub fn validate_tag_name(tag: &str) -> CompostResult<()> {
	if is_valid_tag_name(tag) {
		Ok(())
	} else {
		Err(CompostError::InvalidTagName(tag.to_string()))
	}
}

/// `my-fancy-thing` becomes `MyFancyThing`.
pub fn class_name_for_tag(tag: &str) -> String {
	tag.split('-')
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect()
}

/// The starter source written for a new component.
pub fn component_template(tag: &str) -> String {
	let class_name = class_name_for_tag(tag);
	format!("class {class_name} {{\n\t// <{tag} />\n\n\tcreated() {{\n\t\t<This></This>\n\t}}\n}}\n")
}

/// Write a starter component for `tag` into the configured component
/// directory. Refuses to overwrite an existing file.
pub fn create_component(root: &Path, config: &CompostConfig, tag: &str) -> CompostResult<PathBuf> {
	validate_tag_name(tag)?;

	let dir = config.components_dir(root);
	let path = dir.join(format!("{tag}.{}", config.extension.trim_start_matches('.')));

	if path.exists() {
		return Err(CompostError::ComponentExists(path.display().to_string()));
	}

	std::fs::create_dir_all(&dir)?;
	std::fs::write(&path, component_template(tag))?;
	tracing::debug!(path = %path.display(), tag, "created component");

	Ok(path)
}

/// What `compost init` created. Existing files are left alone and reported
/// as `None` / `false`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InitReport {
	pub config_file: Option<PathBuf>,
	pub components_dir: Option<PathBuf>,
	pub artifact: Option<PathBuf>,
}

impl InitReport {
	pub fn is_noop(&self) -> bool {
		self.config_file.is_none() && self.components_dir.is_none() && self.artifact.is_none()
	}
}

/// Set up a project at `root`: a `compost.toml`, the component directory
/// and an empty artifact.
///
/// When a config already exists it is kept and its settings are used for the
/// directory and artifact.
pub fn init_project(root: &Path, components: Option<&Path>) -> CompostResult<InitReport> {
	let mut report = InitReport::default();

	let config = match CompostConfig::load(root)? {
		Some(config) => config,
		None => {
			let mut config = CompostConfig::default();
			if let Some(components) = components {
				config.components = components.to_path_buf();
				config.output = components.join("compiled.js");
			}

			let path = root.join(CONFIG_FILE_CANDIDATES[0]);
			std::fs::write(&path, config.to_toml()?)?;
			report.config_file = Some(path);
			config
		}
	};

	let dir = config.components_dir(root);
	if !dir.is_dir() {
		std::fs::create_dir_all(&dir)?;
		report.components_dir = Some(dir);
	}

	let artifact = config.output_path(root);
	if !artifact.exists() {
		if let Some(parent) = artifact.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&artifact, "")?;
		report.artifact = Some(artifact);
	}

	Ok(report)
}
