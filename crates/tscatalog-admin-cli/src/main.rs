//! tscatalog Admin CLI
//!
//! Inspects and validates Qt Linguist translation catalogs.
//!
//! ## Usage
//!
//! ```bash
//! tscatalog-admin stats dist/languages
//! tscatalog-admin lookup dist/languages/da.ts --context ConfigureAudio Audio
//! tscatalog-admin contexts dist/languages/da.ts
//! tscatalog-admin check dist/languages
//! ```
//!
//! With no paths, `stats` and `check` use the configured languages directory.

mod check;
mod files;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tscatalog_conf::Settings;
use tscatalog_i18n::{Catalog, CatalogStats, TsReader};

#[derive(Parser)]
#[command(name = "tscatalog-admin")]
#[command(about = "Qt Linguist translation catalog utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,

	/// Settings file (TOML or JSON)
	#[arg(long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Show message counts per catalog
	Stats {
		/// Catalog files or directories
		#[arg(value_name = "PATH")]
		paths: Vec<PathBuf>,

		/// Print JSON instead of a table
		#[arg(long)]
		json: bool,
	},

	/// Resolve one message
	Lookup {
		/// Catalog file
		#[arg(value_name = "FILE")]
		file: PathBuf,

		/// Context name
		#[arg(long, value_name = "NAME")]
		context: String,

		/// Source string
		#[arg(value_name = "SOURCE")]
		source_text: String,

		/// Disambiguating comment
		#[arg(long, value_name = "TEXT")]
		comment: Option<String>,

		/// Plural count substituted for %n
		#[arg(short = 'n', long, value_name = "N")]
		count: Option<u64>,

		/// Positional argument for %1, %2, ... (can be repeated)
		#[arg(long = "arg", value_name = "VALUE")]
		args: Vec<String>,
	},

	/// List contexts with their message counts
	Contexts {
		/// Catalog file
		#[arg(value_name = "FILE")]
		file: PathBuf,
	},

	/// Validate catalogs; exits non-zero on any problem
	Check {
		/// Catalog files or directories
		#[arg(value_name = "PATH")]
		paths: Vec<PathBuf>,
	},
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbosity);

	if let Err(e) = run(cli) {
		eprintln!("{} {:#}", "Error:".red(), e);
		process::exit(1);
	}
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from `warn`
fn init_logging(verbosity: u8) {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
	let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
	tracing::debug!(?settings, "settings loaded");
	let reader = settings.reader();

	match cli.command {
		Commands::Stats { paths, json } => {
			run_stats(&reader, &default_paths(paths, &settings), json)
		}
		Commands::Lookup {
			file,
			context,
			source_text,
			comment,
			count,
			args,
		} => run_lookup(
			&reader,
			&file,
			&context,
			&source_text,
			comment.as_deref(),
			count,
			&args,
		),
		Commands::Contexts { file } => run_contexts(&reader, &file),
		Commands::Check { paths } => run_check(&reader, &default_paths(paths, &settings)),
	}
}

fn default_paths(paths: Vec<PathBuf>, settings: &Settings) -> Vec<PathBuf> {
	if paths.is_empty() {
		vec![settings.languages_dir.clone()]
	} else {
		paths
	}
}

fn load(reader: &TsReader, path: &Path) -> anyhow::Result<Catalog> {
	reader
		.read_path(path)
		.with_context(|| format!("Failed to load {}", path.display()))
}

#[derive(Serialize)]
struct StatsRow {
	path: PathBuf,
	language: Option<String>,
	#[serde(flatten)]
	stats: CatalogStats,
	completion: f64,
}

fn run_stats(reader: &TsReader, paths: &[PathBuf], json: bool) -> anyhow::Result<()> {
	let files = files::collect_catalog_files(paths).map_err(anyhow::Error::msg)?;

	let mut rows = Vec::with_capacity(files.len());
	for file in &files {
		let catalog = load(reader, file)?;
		let stats = catalog.stats();
		rows.push(StatsRow {
			path: file.clone(),
			language: catalog.language().map(str::to_string),
			completion: stats.completion(),
			stats,
		});
	}

	if json {
		println!("{}", serde_json::to_string_pretty(&rows)?);
		return Ok(());
	}

	println!(
		"{:<12} {:>9} {:>9} {:>11} {:>9}",
		"LANGUAGE".bright_cyan(),
		"MESSAGES".bright_cyan(),
		"FINISHED".bright_cyan(),
		"UNFINISHED".bright_cyan(),
		"COMPLETE".bright_cyan()
	);
	for row in &rows {
		let complete = format!("{:.1}%", row.completion);
		println!(
			"{:<12} {:>9} {:>9} {:>11} {:>9}",
			row.language.as_deref().unwrap_or("?"),
			row.stats.messages,
			row.stats.finished,
			row.stats.unfinished,
			if row.completion >= 100.0 {
				complete.green()
			} else {
				complete.yellow()
			}
		);
	}
	Ok(())
}

fn run_lookup(
	reader: &TsReader,
	file: &Path,
	context: &str,
	source_text: &str,
	comment: Option<&str>,
	count: Option<u64>,
	args: &[String],
) -> anyhow::Result<()> {
	let catalog = load(reader, file)?;
	let found = catalog.lookup(context, source_text, comment)?;

	let (text, fallback) = match count {
		Some(n) => match found.plural_form_opt(n) {
			Some(text) => (text, false),
			None => (found.plural_form(n), true),
		},
		None => (found.as_str().to_string(), found.is_fallback()),
	};
	let text = tscatalog_i18n::format(&text, args);

	if fallback {
		println!("{} {}", text, "(untranslated)".dimmed());
	} else {
		println!("{}", text);
	}
	Ok(())
}

fn run_contexts(reader: &TsReader, file: &Path) -> anyhow::Result<()> {
	let catalog = load(reader, file)?;
	for context in catalog.contexts() {
		println!("{:>5}  {}", context.len(), context.name());
	}
	Ok(())
}

fn run_check(reader: &TsReader, paths: &[PathBuf]) -> anyhow::Result<()> {
	let files = files::collect_catalog_files(paths).map_err(anyhow::Error::msg)?;
	if files.is_empty() {
		bail!("No catalog files found");
	}

	let mut failed = 0;
	for file in &files {
		let catalog = match reader.read_path(file) {
			Ok(catalog) => catalog,
			Err(e) => {
				eprintln!("{} {}: {}", "Error".red(), file.display(), e);
				failed += 1;
				continue;
			}
		};

		let problems = check::check_catalog(&catalog);
		if problems.is_empty() {
			println!("{} {}", "OK:".green(), file.display());
			continue;
		}
		failed += 1;
		println!(
			"{} {} ({} problems)",
			"Failed:".red(),
			file.display(),
			problems.len()
		);
		for problem in &problems {
			println!("  - {}", problem);
		}
	}

	println!();
	println!(
		"{}: {} checked, {} failed",
		"Summary".bright_cyan(),
		files.len(),
		if failed > 0 {
			failed.to_string().red()
		} else {
			failed.to_string().green()
		}
	);

	if failed > 0 {
		bail!("{} catalog(s) failed the check", failed);
	}
	Ok(())
}
