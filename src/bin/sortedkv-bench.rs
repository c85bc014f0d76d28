//! sortedkv benchmark harness
//!
//! Loads a word list and times puts, deletes, gets and a range scan against
//! each in-memory backend. With `--table`, each backend is also flushed to a
//! table file that is then reopened and queried.

use anyhow::{Context, Result};
use clap::Parser;
use sortedkv::sstable::{flush_store, Table};
use sortedkv::{open_store, KvIterator, Options, Store, StoreKind};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// sortedkv benchmark harness
#[derive(Parser, Debug)]
#[command(name = "sortedkv-bench")]
#[command(about = "Time the sortedkv store backends and table format")]
struct Args {
    /// Word list, one key per line
    #[arg(short, long, default_value = "/usr/share/dict/words")]
    words: PathBuf,

    /// Maximum number of words to load
    #[arg(short, long, default_value_t = 100)]
    limit: usize,

    /// Delete every Nth word
    #[arg(short, long, default_value_t = 8)]
    stride: usize,

    /// Range scan lower bound
    #[arg(long, default_value = "a")]
    begin: String,

    /// Range scan upper bound (exclusive)
    #[arg(long, default_value = "z")]
    end: String,

    /// Backend to run (repeatable); defaults to all of them
    #[arg(short, long = "backend")]
    backends: Vec<StoreKind>,

    /// Sparse index checkpoint granularity in bytes
    #[arg(long, default_value_t = sortedkv::sstable::DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Seed for skip list level generation
    #[arg(long)]
    seed: Option<u64>,

    /// Also flush each backend to this table file and time reads from it
    #[arg(short, long)]
    table: Option<PathBuf>,
}

const COLUMN: usize = 20;

fn load_words(path: &Path, limit: usize) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening word list {}", path.display()))?;

    let mut words = Vec::new();
    for line in BufReader::new(file).lines().take(limit) {
        words.push(line.with_context(|| format!("reading word list {}", path.display()))?);
    }
    Ok(words)
}

fn print_row(cells: &[String]) {
    let row: String = cells.iter().map(|c| format!("{:<width$}", c, width = COLUMN)).collect();
    println!("{}", row.trim_end());
}

fn elapsed(start: Instant) -> String {
    format!("{:?}", start.elapsed())
}

/// Drains a scan, touching every key and value.
fn drain<I: KvIterator + ?Sized>(iter: &mut I) -> Result<usize> {
    let mut count = 0;
    while iter.advance() {
        std::hint::black_box((iter.key(), iter.value()));
        count += 1;
    }
    if let Some(err) = iter.take_error() {
        return Err(err.into());
    }
    Ok(count)
}

fn run_store(args: &Args, words: &[String], store: &mut dyn Store) -> Result<Vec<Duration>> {
    let mut timings = Vec::with_capacity(4);

    let start = Instant::now();
    for word in words {
        store.put(word.as_bytes(), word.as_bytes());
    }
    timings.push(start.elapsed());

    let start = Instant::now();
    for word in words.iter().step_by(args.stride) {
        match store.delete(word.as_bytes()) {
            Ok(()) => {}
            // Duplicate words in the list make a second delete miss
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e).context("store delete"),
        }
    }
    timings.push(start.elapsed());

    let start = Instant::now();
    for word in words {
        std::hint::black_box(store.get(word.as_bytes()).ok());
    }
    timings.push(start.elapsed());

    let start = Instant::now();
    let mut iter = store.range_scan(args.begin.as_bytes(), args.end.as_bytes())?;
    let scanned = drain(&mut iter)?;
    timings.push(start.elapsed());
    log::debug!("Range scan visited {} entries", scanned);

    Ok(timings)
}

fn run_table(
    args: &Args,
    words: &[String],
    store: &dyn Store,
    path: &Path,
    options: &Options,
) -> Result<Vec<String>> {
    let start = Instant::now();
    let file = File::create(path).with_context(|| format!("creating table {}", path.display()))?;
    let summary = flush_store(store, BufWriter::new(file), options)?;
    let flush_time = elapsed(start);
    log::info!(
        "Wrote {} entries to {} ({} bytes, {} index entries)",
        summary.num_entries,
        path.display(),
        summary.total_len,
        summary.index_entries
    );

    let start = Instant::now();
    let table =
        Table::open_path(path).with_context(|| format!("opening table {}", path.display()))?;
    let open_time = elapsed(start);

    let start = Instant::now();
    for word in words {
        match table.get(word.as_bytes()) {
            Ok(value) => {
                std::hint::black_box(value);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e).context("table lookup"),
        }
    }
    let get_time = elapsed(start);

    let start = Instant::now();
    let mut iter = table.range_scan(args.begin.as_bytes(), args.end.as_bytes())?;
    drain(&mut iter)?;
    let scan_time = elapsed(start);

    Ok(vec![flush_time, open_time, get_time, scan_time])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.stride == 0 {
        anyhow::bail!("--stride must be at least 1");
    }

    let mut options = Options::default().block_size(args.block_size);
    if let Some(seed) = args.seed {
        options = options.seed(seed);
    }
    options.validate().context("invalid options")?;

    let words = load_words(&args.words, args.limit)?;
    log::info!("Loaded {} words from {}", words.len(), args.words.display());

    let backends = if args.backends.is_empty() {
        StoreKind::ALL.to_vec()
    } else {
        args.backends.clone()
    };

    let mut table_rows = Vec::new();
    print_row(&["name", "puts", "deletes", "gets", "rangescan"].map(String::from));
    for kind in backends {
        let mut store = open_store(kind, &options)?;
        let timings = run_store(&args, &words, &mut *store)?;

        let mut row = vec![kind.to_string()];
        row.extend(timings.iter().map(|d| format!("{:?}", d)));
        print_row(&row);

        if let Some(path) = &args.table {
            let mut row = vec![kind.to_string()];
            row.extend(run_table(&args, &words, &*store, path, &options)?);
            table_rows.push(row);
        }
    }

    if !table_rows.is_empty() {
        println!();
        print_row(&["table", "flush", "open", "gets", "rangescan"].map(String::from));
        for row in &table_rows {
            print_row(row);
        }
    }
    println!();

    Ok(())
}
