use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CompostError {
	#[error(transparent)]
	#[diagnostic(code(compost::io_error))]
	Io(#[from] std::io::Error),

	#[error("attribute directive not found for `<{tag}>` in {file}")]
	#[diagnostic(
		code(compost::missing_directive),
		help("add `// <{tag} />` to the top of the component class body")
	)]
	MissingDirective { tag: String, file: String },

	#[error("no component class found in {file}")]
	#[diagnostic(
		code(compost::missing_class),
		help("each component file must declare a class, e.g. `class MyThing {{ ... }}`")
	)]
	MissingClass { file: String },

	#[error("class body starting at {file}:{line}:{column} is never closed")]
	#[diagnostic(
		code(compost::unbalanced_body),
		help("check for a missing `}}` at the end of the class")
	)]
	UnbalancedBody {
		file: String,
		line: usize,
		column: usize,
	},

	#[error("invalid tag name: `{0}`")]
	#[diagnostic(
		code(compost::invalid_tag_name),
		help(
			"use kebab-case with at least two words (lowercase letters, digits and hyphens) and \
			 no digits in the first word, e.g. `my-component`"
		)
	)]
	InvalidTagName(String),

	#[error("component file already exists: `{0}`")]
	#[diagnostic(code(compost::component_exists))]
	ComponentExists(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(compost::config_parse),
		help("check that compost.toml is valid TOML, or that package.json has a valid `compost` object")
	)]
	ConfigParse(String),

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(compost::invalid_exclude))]
	InvalidExclude { pattern: String, reason: String },

	#[error("component directory not found: `{0}`")]
	#[diagnostic(
		code(compost::missing_components_dir),
		help("run `compost init` or set `components` in compost.toml")
	)]
	MissingComponentsDir(String),

	#[error("build aborted: {failed} of {total} component file(s) failed to compile")]
	#[diagnostic(
		code(compost::build_aborted),
		help("fix the reported files, or set `on_error = \"skip\"` in compost.toml to write a partial bundle")
	)]
	BuildAborted { failed: usize, total: usize },
}

impl CompostError {
	/// Fill in the file name on errors raised by the per-file passes, which
	/// only see source text.
	#[must_use]
	pub fn with_file(mut self, path: &str) -> Self {
		match &mut self {
			Self::MissingDirective { file, .. }
			| Self::MissingClass { file }
			| Self::UnbalancedBody { file, .. } => {
				path.clone_into(file);
			}
			_ => {}
		}

		self
	}
}

/// Placeholder file name used until the orchestrator attaches the real one.
pub(crate) const UNKNOWN_FILE: &str = "<source>";

pub type CompostResult<T> = Result<T, CompostError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
