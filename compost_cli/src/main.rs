use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;

use clap::Parser;
use compost_cli::Commands;
use compost_cli::CompostCli;
use compost_cli::is_component_change;
use compost_cli::wait_for_batch;
use compost_core::AnyEmptyResult;
use compost_core::BuildFailure;
use compost_core::BuildOptions;
use compost_core::CompostConfig;
use compost_core::check_project;
use compost_core::class_name_for_tag;
use compost_core::compute_bundle;
use compost_core::create_component;
use compost_core::init_project;
use compost_core::write_bundle;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter, e.g. `COMPOST_LOG=trace`.
const LOG_ENV: &str = "COMPOST_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,cyan) => {
		if color_enabled() {
			format!("{}", $text.cyan())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = CompostCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init { components }) => run_init(&args, components.as_deref()),
		Some(Commands::Create { tag }) => run_create(&args, tag),
		Some(Commands::Build { quiet }) => run_build(&args, *quiet),
		Some(Commands::Check { diff }) => run_check(&args, *diff),
		Some(Commands::Watch) => run_watch(&args),
		None => {
			eprintln!("No subcommand specified. Run `compost --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<compost_core::CompostError>() {
			Ok(compost_err) => {
				let report: miette::Report = (*compost_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &CompostCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_init(args: &CompostCli, components: Option<&Path>) -> AnyEmptyResult {
	let root = resolve_root(args);
	let report = init_project(&root, components)?;

	if report.is_noop() {
		println!("compost is already set up, nothing to do.");
		return Ok(());
	}

	for created in [&report.config_file, &report.components_dir, &report.artifact]
		.into_iter()
		.flatten()
	{
		println!("Created {}", colored!(make_relative(created, &root), green));
	}

	let config = CompostConfig::load_or_default(&root)?;
	println!(
		"\nRun {} and add the bundle to your page:",
		colored!("compost watch", cyan)
	);
	println!(
		"  {}",
		colored!(
			format!("<script src=\"/{}\"></script>", config.output.display()),
			cyan
		)
	);

	Ok(())
}

fn run_create(args: &CompostCli, tag: &str) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = CompostConfig::load_or_default(&root)?;
	let path = create_component(&root, &config, tag)?;

	println!(
		"Created {} {} in {}",
		colored!(class_name_for_tag(tag), yellow),
		colored!(format!("<{tag} />"), cyan),
		colored!(make_relative(&path, &root), green)
	);

	Ok(())
}

/// Render every per-file failure through miette.
fn print_failures(failures: Vec<BuildFailure>) {
	for failure in failures {
		let report = miette::Report::new(failure.error);
		eprintln!("{report:?}");
	}
}

/// What a build pass did, once its failures have been printed.
struct BuildSummary {
	compiled: usize,
	failed: usize,
	written: bool,
}

/// Run one build pass and print its outcome.
fn build_once(root: &Path, quiet: bool) -> Result<BuildSummary, Box<dyn std::error::Error>> {
	let config = CompostConfig::load_or_default(root)?;
	let options = BuildOptions::from_config(root, &config)?;
	let mut report = compute_bundle(&options)?;
	write_bundle(&mut report, options.on_error)?;

	if !quiet {
		for unit in &report.units {
			println!("Compiled {}", colored!(make_relative(&unit.file, root), yellow));
		}
	}

	let failed = report.failures.len();
	let total = report.total();
	let artifact = make_relative(&report.artifact, root);
	let written = report.written;
	print_failures(std::mem::take(&mut report.failures));

	if failed == 0 {
		if !quiet {
			println!("{} wrote {artifact}", colored!("OK", green));
		}
	} else if written {
		eprintln!(
			"{} {failed} of {total} component(s) skipped, wrote partial bundle {artifact}",
			colored!("warning:", yellow)
		);
	} else {
		let error = compost_core::CompostError::BuildAborted { failed, total };
		eprintln!("{:?}", miette::Report::new(error));
	}

	Ok(BuildSummary {
		compiled: report.units.len(),
		failed,
		written,
	})
}

fn run_build(args: &CompostCli, quiet: bool) -> AnyEmptyResult {
	let root = resolve_root(args);
	let summary = build_once(&root, quiet)?;

	if !summary.written {
		process::exit(1);
	}

	Ok(())
}

fn run_check(args: &CompostCli, show_diff: bool) -> AnyEmptyResult {
	let root = resolve_root(args);
	let mut result = check_project(&root)?;
	let artifact = make_relative(&result.report.artifact, &root);
	let failed = !result.report.failures.is_empty();
	print_failures(std::mem::take(&mut result.report.failures));

	if failed {
		eprintln!("{} components failed to compile", colored!("error:", red));
		process::exit(1);
	}

	if !result.is_stale() {
		println!("{} {artifact} is up to date.", colored!("OK", green));
		return Ok(());
	}

	match &result.current {
		Some(_) => eprintln!("{} {artifact} is out of date.", colored!("stale:", red)),
		None => eprintln!("{} {artifact} does not exist.", colored!("stale:", red)),
	}

	if show_diff {
		print_diff(result.current.as_deref().unwrap_or_default(), &result.report.bundle);
	}

	eprintln!("\nRun `compost build` to update it.");
	process::exit(1);
}

fn run_watch(args: &CompostCli) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = CompostConfig::load_or_default(&root)?;
	let components_dir = config.components_dir(&root);
	let artifact = config.output_path(&root);
	let extension = config.extension.trim_start_matches('.').to_string();

	build_once(&root, true)?;

	let (tx, rx) = mpsc::channel();
	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			let Ok(event) = res else {
				return;
			};

			if matches!(
				event.kind,
				notify::EventKind::Modify(_)
					| notify::EventKind::Create(_)
					| notify::EventKind::Remove(_)
			) && is_component_change(&event.paths, &extension, &artifact)
			{
				let _ = tx.send(());
			}
		})?;

	use notify::Watcher;
	watcher.watch(&components_dir, notify::RecursiveMode::NonRecursive)?;

	println!(
		"Watching {} for changes... (press Ctrl+C to stop)",
		colored!(make_relative(&components_dir, &root), green)
	);

	// Builds run on this thread only. Events arriving during a build queue up
	// in the channel and become the next batch.
	while let Some(events) = wait_for_batch(&rx, config.watch.debounce()) {
		tracing::debug!(events, "change batch");
		println!("\nChange detected, rebuilding...");

		match build_once(&root, true) {
			Ok(summary) if summary.written && summary.failed == 0 => {
				println!("{} rebuilt {} component(s)", colored!("OK", green), summary.compiled);
			}
			Ok(_) => {}
			Err(e) => eprintln!("{} {e}", colored!("error:", red)),
		}
	}

	Ok(())
}

/// Print a line diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
