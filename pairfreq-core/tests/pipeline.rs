use std::io::Cursor;

use pairfreq_core::corpus::{IterSource, JsonLinesSource, TextFileSource};
use pairfreq_core::model::count_matrix::CountMatrix;
use pairfreq_core::model::probability_table::{ProbabilityTable, ARTIFACT_SIZE};
use pairfreq_core::model::scanner::Scanner;
use pairfreq_core::model::symbol::{Symbol, META_INDEX};
use pairfreq_core::{finalize, run, run_with_progress, Error, ScanConfig};

fn config_in(dir: &tempfile::TempDir) -> ScanConfig {
	ScanConfig {
		output_path: dir.path().join("data").join("code.data"),
		..ScanConfig::default()
	}
}

#[test]
fn json_lines_corpus_to_artifact() {
	let dir = tempfile::tempdir().unwrap();
	let config = config_in(&dir);
	let corpus = concat!(
		"{\"code\": \"def f(x):\\r\\n\\treturn x\\n\"}\n",
		"{\"code\": \"a\u{20ac}b\"}\n",
		"{\"code\": \"int main() { return 0; }\"}\n",
	);
	let mut source = JsonLinesSource::new(Cursor::new(corpus), "corpus.jsonl", "code");

	let output = run(&config, &mut source).unwrap();
	assert_eq!(output.summary.records, 3);
	assert!(!output.summary.budget_exceeded);
	assert_eq!(output.summary.transitions, output.counts.total_transitions());

	let bytes = std::fs::read(&config.output_path).unwrap();
	assert_eq!(bytes.len(), ARTIFACT_SIZE);

	let table = ProbabilityTable::load(&config.output_path).unwrap();
	assert_eq!(table, output.table);
	assert!((table.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn euro_sign_records_no_transitions_but_counts_marginals() {
	let dir = tempfile::tempdir().unwrap();
	let config = ScanConfig { deletion_rate: 1.0, ..config_in(&dir) };
	let mut source = IterSource::new([vec![0x61u8, 0xE2, 0x82, 0xAC, 0x62]]);

	let output = run(&config, &mut source).unwrap();
	assert_eq!(output.summary.transitions, 0);
	assert_eq!(output.counts.get(67, META_INDEX), 1);
	assert_eq!(output.counts.get(68, META_INDEX), 1);

	// Only the two marginal cells carry mass.
	assert_eq!(output.table.get(67, META_INDEX), 0.5);
	assert_eq!(output.table.get(68, META_INDEX), 0.5);
}

#[test]
fn budget_stops_before_exhaustion() {
	let dir = tempfile::tempdir().unwrap();
	let config = ScanConfig { size_budget: 3, ..config_in(&dir) };
	let records = ["abcd", "efgh", "ijkl", "mnop"];

	let mut pulled = 0;
	let output = run_with_progress(&config, &mut IterSource::new(records), |progress| pulled = progress.records).unwrap();

	// 3 transitions per record: the second record takes the total to 6 > 3.
	assert_eq!(pulled, 2);
	assert_eq!(output.summary.transitions, 6);
	assert!(output.summary.budget_exceeded);
}

#[test]
fn empty_corpus_fails_without_writing() {
	let dir = tempfile::tempdir().unwrap();
	let config = config_in(&dir);
	let result = run(&config, &mut IterSource::new(Vec::<String>::new()));

	assert!(matches!(result, Err(Error::EmptyMatrix)));
	assert!(!config.output_path.exists());
}

#[test]
fn failed_run_leaves_previous_artifact_untouched() {
	let dir = tempfile::tempdir().unwrap();
	let config = config_in(&dir);
	run(&config, &mut IterSource::new(["hello world"])).unwrap();
	let before = std::fs::read(&config.output_path).unwrap();

	let corpus = "{\"code\": \"ok\"}\nnot json\n";
	let mut source = JsonLinesSource::new(Cursor::new(corpus), "broken.jsonl", "code");
	assert!(matches!(run(&config, &mut source), Err(Error::CorpusJson { line: 2, .. })));

	assert_eq!(std::fs::read(&config.output_path).unwrap(), before);
}

#[test]
fn invalid_deletion_rate_is_rejected_before_scanning() {
	let dir = tempfile::tempdir().unwrap();
	let config = ScanConfig { deletion_rate: 1.5, ..config_in(&dir) };
	let mut pulled = false;
	let result = run_with_progress(&config, &mut IterSource::new(["ab"]), |_| pulled = true);

	assert!(matches!(result, Err(Error::InvalidConfig(_))));
	assert!(!pulled);
}

#[test]
fn cached_counts_refinalize_with_another_rate() {
	let dir = tempfile::tempdir().unwrap();
	let config = config_in(&dir);
	let output = run(&config, &mut IterSource::new(["aaaaaaaaaa"])).unwrap();

	let cache = dir.path().join("counts.bin");
	output.counts.save_cache(&cache).unwrap();
	let counts = CountMatrix::load_cache(&cache).unwrap();

	let refinal = ScanConfig {
		output_path: dir.path().join("unscaled.data"),
		deletion_rate: 1.0,
		..ScanConfig::default()
	};
	let table = finalize(&counts, &refinal).unwrap();

	let a = Symbol::from_index(67).unwrap();
	// 9 transitions a→a and 10 occurrences of a.
	assert_eq!(table.pair(a, a), 9.0 / 19.0);
	assert_eq!(table.deletion(a), 10.0 / 19.0);
	assert_eq!(output.table.deletion(a), 2.0 / 11.0);
}

#[test]
fn sharded_counts_merge_to_a_single_scan() {
	let records = ["fn a() {}\n", "\tlet x = 1;\r\n", "caf\u{e9} ol\u{e9}", "}\n"];
	let scanner = Scanner::new(u64::MAX);

	let mut whole = CountMatrix::new();
	scanner.scan(&mut IterSource::new(records), &mut whole).unwrap();

	let mut left = CountMatrix::new();
	let mut right = CountMatrix::new();
	scanner.scan(&mut IterSource::new(records[..2].iter().copied()), &mut left).unwrap();
	scanner.scan(&mut IterSource::new(records[2..].iter().copied()), &mut right).unwrap();
	left.merge(&right);

	assert_eq!(left, whole);
}

#[test]
fn text_file_directory_corpus() {
	let dir = tempfile::tempdir().unwrap();
	let corpus = dir.path().join("corpus");
	std::fs::create_dir(&corpus).unwrap();
	std::fs::write(corpus.join("one.rs"), b"a\nb").unwrap();
	std::fs::write(corpus.join("two.rs"), b"a\r\nb").unwrap();

	let config = ScanConfig { deletion_rate: 0.0, ..config_in(&dir) };
	let mut source = TextFileSource::new(&corpus, "rs").unwrap();
	let output = run(&config, &mut source).unwrap();

	assert_eq!(output.summary.records, 2);
	assert_eq!(output.summary.transitions, 4);
	assert_eq!(output.table.pair(Symbol::from_index(67).unwrap(), Symbol::LINE_FEED), 0.5);
	assert_eq!(output.table.pair(Symbol::LINE_FEED, Symbol::from_index(68).unwrap()), 0.5);
}
