use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile class components with embedded markup into a custom elements bundle.",
	long_about = "compost turns component files, plain classes annotated with an attribute \
	              directive like `// <my-thing title! open? .active />` and containing embedded \
	              markup, into a single JavaScript bundle of custom element definitions.\n\nQuick \
	              start:\n  compost init            Create compost.toml and the component \
	              directory\n  compost create my-thing Scaffold a component\n  compost build        \
	              Compile every component\n  compost watch           Rebuild on every change"
)]
pub struct CompostCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Set up compost in a project.
	///
	/// Writes a `compost.toml` with the default settings, creates the
	/// component directory and an empty bundle. Existing files are left
	/// untouched, so running it twice is a no-op.
	Init {
		/// Component directory to configure, relative to the project root.
		#[arg(long)]
		components: Option<PathBuf>,
	},
	/// Scaffold a new component.
	///
	/// The tag must be a valid custom element name: kebab-case with at least
	/// two words and no digits in the first one. The class name is derived
	/// from it, e.g. `my-thing` becomes `MyThing`.
	Create {
		/// The custom element name, e.g. `my-thing`.
		tag: String,
	},
	/// Compile every component into the bundle.
	///
	/// Exits with a non-zero status when any component fails to compile.
	/// With the default `on_error = "abort"` the existing bundle is then
	/// left untouched.
	Build {
		/// Only print errors.
		#[arg(long, short, default_value_t = false)]
		quiet: bool,
	},
	/// Check that the bundle on disk is up to date.
	///
	/// Compiles in memory and compares the result with the bundle. Exits with
	/// a non-zero status when it is stale or a component fails to compile.
	Check {
		/// Show a line diff between the bundle on disk and the expected one.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Build, then rebuild whenever a component file changes.
	Watch,
}

/// Block until one event arrives, then keep receiving until the channel has
/// been quiet for `debounce`.
///
/// Returns the number of events in the batch, or `None` once every sender is
/// gone and nothing was received.
pub fn wait_for_batch<T>(rx: &Receiver<T>, debounce: Duration) -> Option<usize> {
	rx.recv().ok()?;
	let mut count = 1;

	loop {
		match rx.recv_timeout(debounce) {
			Ok(_) => count += 1,
			Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
		}
	}

	Some(count)
}

/// Whether a change to `paths` should trigger a rebuild: at least one path
/// is a component file and not the bundle itself.
pub fn is_component_change(paths: &[PathBuf], extension: &str, artifact: &Path) -> bool {
	paths.iter().any(|path| {
		path != artifact && path.extension().and_then(|ext| ext.to_str()) == Some(extension)
	})
}
