use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use pairfreq_core::corpus::{stdin_json_lines, CorpusSource, JsonLinesSource, TextFileSource, DEFAULT_TEXT_FIELD};
use pairfreq_core::model::count_matrix::CountMatrix;
use pairfreq_core::model::probability_table::ProbabilityTable;
use pairfreq_core::model::symbol::{index_glyph, META_INDEX, SYMBOL_COUNT};
use pairfreq_core::{finalize, run_with_progress, ScanConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Symbol-transition probability tables from text corpora", long_about = None)]
struct Cli {
	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, global = true, action = ArgAction::Count)]
	verbose: u8,

	/// Decrease verbosity (-q, -qq)
	#[arg(short = 'q', long, global = true, action = ArgAction::Count)]
	quiet: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Scan a corpus and write the probability table
	Scan(ScanArgs),
	/// Write a probability table from previously cached counts
	Finalize(FinalizeArgs),
	/// Print a summary of an existing probability table
	Inspect(InspectArgs),
}

/// Options shared by every command that writes a table.
#[derive(Args, Debug)]
struct TableArgs {
	/// TOML file with `output_path`, `size_budget` and `deletion_rate`
	#[arg(short, long, value_name = "FILE", env = "PAIRFREQ_CONFIG")]
	config: Option<PathBuf>,

	/// Where the probability table is written
	#[arg(short, long, value_name = "PATH", env = "PAIRFREQ_OUTPUT")]
	output: Option<PathBuf>,

	/// Scaling factor for the marginal column, in [0, 1]
	#[arg(long, value_name = "RATE", env = "PAIRFREQ_DELETION_RATE")]
	deletion_rate: Option<f64>,
}

#[derive(Args, Debug)]
struct ScanArgs {
	#[command(flatten)]
	table: TableArgs,

	/// JSON-lines corpus file (standard input when neither --jsonl nor --dir is given)
	#[arg(long, value_name = "PATH", conflicts_with = "dir")]
	jsonl: Option<PathBuf>,

	/// Directory whose files are read as one record each
	#[arg(long, value_name = "DIR")]
	dir: Option<PathBuf>,

	/// JSON field holding the record text
	#[arg(long, value_name = "NAME", default_value = DEFAULT_TEXT_FIELD)]
	field: String,

	/// File extension selected with --dir
	#[arg(long, value_name = "EXT", default_value = "txt")]
	extension: String,

	/// Stop once more than this many transitions have been recorded
	#[arg(long, value_name = "COUNT", env = "PAIRFREQ_SIZE_BUDGET")]
	size_budget: Option<u64>,

	/// Also save the raw counts here for a later `finalize`
	#[arg(long, value_name = "PATH")]
	counts_cache: Option<PathBuf>,

	/// Disable the progress bar
	#[arg(long)]
	no_progress: bool,
}

#[derive(Args, Debug)]
struct FinalizeArgs {
	#[command(flatten)]
	table: TableArgs,

	/// Count cache written by `scan --counts-cache`
	#[arg(long, value_name = "PATH")]
	counts: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
	/// Probability table to read
	path: PathBuf,

	/// Number of transitions to list
	#[arg(long, value_name = "N", default_value_t = 20)]
	top: usize,
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	match cli.command {
		Commands::Scan(args) => scan(args),
		Commands::Finalize(args) => finalize_cached(args),
		Commands::Inspect(args) => inspect(args),
	}
}

fn init_logging(verbose: u8, quiet: u8) {
	let level = match i16::from(verbose) - i16::from(quiet) {
		i16::MIN..=-2 => "error",
		-1 => "warn",
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

/// Defaults, then the config file, then command-line flags.
fn load_config(args: &TableArgs) -> Result<ScanConfig> {
	let mut config = match &args.config {
		Some(path) => ScanConfig::from_file(path)?,
		None => ScanConfig::default(),
	};
	if let Some(output) = &args.output {
		config.output_path = output.clone();
	}
	if let Some(rate) = args.deletion_rate {
		config.deletion_rate = rate;
	}
	config.validate()?;
	Ok(config)
}

fn open_source(args: &ScanArgs) -> Result<Box<dyn CorpusSource>> {
	if let Some(path) = &args.jsonl {
		let source = JsonLinesSource::open(path, args.field.as_str())
			.with_context(|| format!("failed to open corpus {}", path.display()))?;
		return Ok(Box::new(source));
	}
	if let Some(dir) = &args.dir {
		let source = TextFileSource::new(dir, &args.extension)
			.with_context(|| format!("failed to list corpus directory {}", dir.display()))?;
		info!("{} files to scan in {}", source.remaining(), dir.display());
		return Ok(Box::new(source));
	}
	Ok(Box::new(stdin_json_lines(args.field.as_str())))
}

fn create_bar(size_budget: u64) -> ProgressBar {
	let bar = ProgressBar::new(size_budget);
	bar.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {human_pos}/{human_len} transitions ({per_sec}, {eta}) {msg}")
			.unwrap_or_else(|_| ProgressStyle::default_bar())
			.progress_chars("#>-"),
	);
	bar
}

fn scan(args: ScanArgs) -> Result<()> {
	let mut config = load_config(&args.table)?;
	if let Some(size_budget) = args.size_budget {
		config.size_budget = size_budget;
	}

	let mut source = open_source(&args)?;
	let bar = if args.no_progress { ProgressBar::hidden() } else { create_bar(config.size_budget) };

	let output = run_with_progress(&config, &mut source, |progress| {
		bar.inc(progress.last_record);
		bar.set_message(format!("{} records", progress.records));
	});
	bar.finish_and_clear();
	let output = output.context("scan failed")?;

	if let Some(cache) = &args.counts_cache {
		output.counts.save_cache(cache).context("failed to save count cache")?;
	}

	println!(
		"Scanned {} records, {} transitions{}",
		output.summary.records,
		output.summary.transitions,
		if output.summary.budget_exceeded { " (size budget exceeded)" } else { "" }
	);
	println!("Wrote {}", config.output_path.display());
	Ok(())
}

fn finalize_cached(args: FinalizeArgs) -> Result<()> {
	let config = load_config(&args.table)?;
	let counts = CountMatrix::load_cache(&args.counts)
		.with_context(|| format!("failed to load count cache {}", args.counts.display()))?;
	finalize(&counts, &config).context("finalize failed")?;
	println!("Wrote {}", config.output_path.display());
	Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
	let table = ProbabilityTable::load(&args.path)?;
	println!("{}: sum = {:.12}", args.path.display(), table.sum());

	for (rank, (prev, curr, probability)) in table.top_pairs(args.top).into_iter().enumerate() {
		println!("{:>4}. {} {}  {:.6}", rank + 1, prev, curr, probability);
	}

	let deletions: Vec<String> = (0..SYMBOL_COUNT)
		.filter_map(|row| {
			let glyph = index_glyph(row)?;
			let share = table.get(row, META_INDEX);
			(share > 0.0).then(|| format!("{glyph}={share:.6}"))
		})
		.collect();
	if !deletions.is_empty() {
		println!("{} column: {}", index_glyph(META_INDEX).unwrap_or('?'), deletions.join(" "));
	}
	Ok(())
}
