use std::path::Path;
use std::path::PathBuf;

use derive_more::Display;
use globset::GlobSet;

use crate::CompostError;
use crate::CompostResult;
use crate::codegen::compile_component;
use crate::config::CompostConfig;
use crate::config::OnError;
use crate::directive::parse_component;
use crate::prelude::PRELUDE;
use crate::prelude::unit_header;
use crate::rewriter::RewriteOptions;
use crate::rewriter::rewrite_markup_with_options;

/// The stages a build passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BuildState {
	#[display("idle")]
	Idle,
	#[display("scanning directory")]
	ScanningDirectory,
	#[display("rewrite")]
	Rewrite,
	#[display("extract")]
	Extract,
	#[display("generate")]
	Generate,
	#[display("append")]
	Append,
	#[display("aborted")]
	Aborted,
}

/// Tracks the current [`BuildState`] and logs every transition.
#[derive(Debug)]
struct BuildTracker {
	state: BuildState,
}

impl BuildTracker {
	fn new() -> Self {
		Self {
			state: BuildState::Idle,
		}
	}

	fn enter(&mut self, next: BuildState) {
		tracing::trace!(from = %self.state, to = %next, "build state");
		self.state = next;
	}
}

/// Everything a build needs, resolved against the project root.
#[derive(Debug, Clone)]
pub struct BuildOptions {
	pub components_dir: PathBuf,
	pub output: PathBuf,
	pub extension: String,
	pub exclude: GlobSet,
	pub rewrite: RewriteOptions,
	pub on_error: OnError,
}

impl BuildOptions {
	pub fn from_config(root: &Path, config: &CompostConfig) -> CompostResult<Self> {
		Ok(Self {
			components_dir: config.components_dir(root),
			output: config.output_path(root),
			extension: config.extension.trim_start_matches('.').to_string(),
			exclude: config.exclude_set()?,
			rewrite: config.rewrite_options(),
			on_error: config.on_error,
		})
	}
}

/// A component file found in the component directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFile {
	pub path: PathBuf,
	/// The element name, taken from the file stem.
	pub tag: String,
}

impl ComponentFile {
	pub fn file_name(&self) -> String {
		self.path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default()
	}
}

/// The compiled code of one component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
	pub file: PathBuf,
	pub tag: String,
	pub code: String,
}

/// A component file that failed to compile.
#[derive(Debug)]
pub struct BuildFailure {
	pub file: PathBuf,
	pub error: CompostError,
}

/// The outcome of one build pass.
#[derive(Debug)]
pub struct BuildReport {
	/// Successfully compiled units in traversal order.
	pub units: Vec<CompiledUnit>,
	pub failures: Vec<BuildFailure>,
	/// The prelude followed by every unit.
	pub bundle: String,
	/// Where the bundle is (or would be) written.
	pub artifact: PathBuf,
	/// Whether the bundle was written to `artifact`.
	pub written: bool,
}

impl BuildReport {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}

	/// Number of component files visited.
	pub fn total(&self) -> usize {
		self.units.len() + self.failures.len()
	}

	/// Whether the policy allows writing this bundle.
	pub fn should_write(&self, on_error: OnError) -> bool {
		self.is_ok() || on_error == OnError::Skip
	}
}

/// The result of comparing a fresh build with the artifact on disk.
#[derive(Debug)]
pub struct CheckResult {
	pub report: BuildReport,
	/// The artifact currently on disk, if any.
	pub current: Option<String>,
}

impl CheckResult {
	pub fn is_stale(&self) -> bool {
		self.current.as_deref() != Some(self.report.bundle.as_str())
	}

	pub fn is_ok(&self) -> bool {
		self.report.is_ok() && !self.is_stale()
	}
}

pub fn normalize_line_endings(content: &str) -> String {
	content.replace("\r\n", "\n")
}

/// List the component files of `options.components_dir` sorted by file name.
///
/// Only direct children with the configured extension are returned. Files
/// matching an exclude pattern and the artifact itself are skipped.
pub fn collect_component_files(options: &BuildOptions) -> CompostResult<Vec<ComponentFile>> {
	let dir = &options.components_dir;
	if !dir.is_dir() {
		return Err(CompostError::MissingComponentsDir(dir.display().to_string()));
	}

	let mut files = Vec::new();
	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if !path.is_file() || path == options.output {
			continue;
		}

		if path.extension().and_then(|ext| ext.to_str()) != Some(options.extension.as_str()) {
			continue;
		}

		let Some(file_name) = path.file_name() else {
			continue;
		};

		if options.exclude.is_match(Path::new(file_name)) {
			tracing::debug!(path = %path.display(), "excluded");
			continue;
		}

		let Some(tag) = path.file_stem().and_then(|stem| stem.to_str()) else {
			tracing::warn!(path = %path.display(), "skipping file with a non UTF-8 name");
			continue;
		};

		files.push(ComponentFile {
			tag: tag.to_string(),
			path,
		});
	}

	files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
	Ok(files)
}

/// Compile the source of a single component: rewrite markup, extract the
/// class, parse its directive and generate the accessors.
pub fn compile_source(tag: &str, source: &str, options: &RewriteOptions) -> CompostResult<String> {
	compile_source_tracked(tag, source, options, &mut BuildTracker::new())
}

fn compile_source_tracked(
	tag: &str,
	source: &str,
	options: &RewriteOptions,
	tracker: &mut BuildTracker,
) -> CompostResult<String> {
	tracker.enter(BuildState::Rewrite);
	let rewritten = rewrite_markup_with_options(source, options);

	tracker.enter(BuildState::Extract);
	let descriptor = parse_component(tag, &rewritten)?;

	tracker.enter(BuildState::Generate);
	Ok(compile_component(&rewritten, &descriptor))
}

/// Read and compile one component file.
pub fn compile_file(file: &ComponentFile, options: &RewriteOptions) -> CompostResult<CompiledUnit> {
	compile_file_tracked(file, options, &mut BuildTracker::new())
}

fn compile_file_tracked(
	file: &ComponentFile,
	options: &RewriteOptions,
	tracker: &mut BuildTracker,
) -> CompostResult<CompiledUnit> {
	let file_name = file.file_name();
	let source = normalize_line_endings(&std::fs::read_to_string(&file.path)?);
	let code = compile_source_tracked(&file.tag, &source, options, tracker)
		.map_err(|error| error.with_file(&file_name))?;

	Ok(CompiledUnit {
		file: file.path.clone(),
		tag: file.tag.clone(),
		code,
	})
}

/// Concatenate the prelude and `units` in order.
pub fn assemble_bundle(units: &[CompiledUnit]) -> String {
	let mut bundle = String::from(PRELUDE);

	for unit in units {
		let name = unit
			.file
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();

		bundle.push('\n');
		bundle.push_str(&unit_header(&name));
		bundle.push('\n');
		bundle.push_str(unit.code.trim_end());
		bundle.push('\n');
	}

	bundle
}

/// Compile every component file in memory without writing anything.
pub fn compute_bundle(options: &BuildOptions) -> CompostResult<BuildReport> {
	let mut tracker = BuildTracker::new();
	tracker.enter(BuildState::ScanningDirectory);

	let files = collect_component_files(options)?;
	let mut units = Vec::with_capacity(files.len());
	let mut failures = Vec::new();

	for file in &files {
		tracing::debug!(path = %file.path.display(), tag = %file.tag, "compiling");

		match compile_file_tracked(file, &options.rewrite, &mut tracker) {
			Ok(unit) => {
				tracker.enter(BuildState::Append);
				units.push(unit);
			}
			Err(error) => {
				tracing::debug!(path = %file.path.display(), %error, "component failed");
				failures.push(BuildFailure {
					file: file.path.clone(),
					error,
				});
			}
		}

		tracker.enter(BuildState::ScanningDirectory);
	}

	if failures.is_empty() || options.on_error == OnError::Skip {
		tracker.enter(BuildState::Idle);
	} else {
		tracker.enter(BuildState::Aborted);
	}

	let bundle = assemble_bundle(&units);

	Ok(BuildReport {
		units,
		failures,
		bundle,
		artifact: options.output.clone(),
		written: false,
	})
}

/// Write the bundle of `report` when the failure policy allows it.
pub fn write_bundle(report: &mut BuildReport, on_error: OnError) -> CompostResult<()> {
	if !report.should_write(on_error) {
		tracing::debug!(
			failed = report.failures.len(),
			artifact = %report.artifact.display(),
			"not writing artifact"
		);
		return Ok(());
	}

	if let Some(parent) = report.artifact.parent() {
		std::fs::create_dir_all(parent)?;
	}

	std::fs::write(&report.artifact, &report.bundle)?;
	report.written = true;

	tracing::debug!(
		units = report.units.len(),
		artifact = %report.artifact.display(),
		"wrote artifact"
	);

	Ok(())
}

/// Run one build pass for the project at `root` with its configuration.
pub fn build_project(root: &Path) -> CompostResult<BuildReport> {
	let config = CompostConfig::load_or_default(root)?;
	build_project_with_config(root, &config)
}

pub fn build_project_with_config(root: &Path, config: &CompostConfig) -> CompostResult<BuildReport> {
	let options = BuildOptions::from_config(root, config)?;
	let mut report = compute_bundle(&options)?;
	write_bundle(&mut report, options.on_error)?;

	Ok(report)
}

/// Build in memory and compare the result with the artifact on disk.
pub fn check_project(root: &Path) -> CompostResult<CheckResult> {
	let config = CompostConfig::load_or_default(root)?;
	let options = BuildOptions::from_config(root, &config)?;
	let report = compute_bundle(&options)?;

	let current = match std::fs::read_to_string(&report.artifact) {
		Ok(content) => Some(content),
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
		Err(error) => return Err(error.into()),
	};

	Ok(CheckResult { report, current })
}
