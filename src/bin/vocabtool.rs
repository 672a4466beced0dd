use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use jmvocab::jmdict;
use jmvocab::vocab::{self, csv, BuildOptions};

/// Unwrap a Result or print the error and exit.
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "vocabtool", about = "JMdict vocabulary dataset build tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the raw gzip-compressed dump
    Fetch {
        /// Dump URL
        #[arg(long, default_value = jmdict::JMDICT_URL)]
        url: String,
        /// Output file (.gz)
        output_file: String,
    },
    /// Build the vocabulary CSV from the dump
    Build {
        /// Dump URL (ignored when --input is given)
        #[arg(long, default_value = jmdict::JMDICT_URL)]
        url: String,
        /// Local dump file (.gz or decompressed .xml) instead of downloading
        #[arg(long)]
        input: Option<String>,
        /// Maximum number of output rows
        #[arg(long, default_value = "600")]
        count: usize,
        /// Stop parsing after N entries (smoke-testing)
        #[arg(long)]
        limit: Option<usize>,
        /// Output CSV file
        output_file: String,
    },
    /// Show dataset statistics
    Info {
        /// Dataset CSV file
        file: String,
        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    jmvocab::trace_init::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Fetch { url, output_file } => fetch(&url, &output_file),
        Command::Build {
            url,
            input,
            count,
            limit,
            output_file,
        } => build(&url, input.as_deref(), count, limit, &output_file),
        Command::Info { file, json } => info(&file, json),
    }
}

fn fetch(url: &str, output_file: &str) {
    if Path::new(output_file).exists() {
        eprintln!("{output_file} (already exists, skipping)");
        return;
    }
    eprintln!("Downloading {url}...");
    let raw = die!(jmdict::fetch(url), "Error fetching dictionary: {}");
    die!(fs::write(output_file, &raw), "Error writing {output_file}: {}");
    eprintln!("Wrote {output_file} ({:.1} MB)", raw.len() as f64 / 1_048_576.0);
}

fn build(url: &str, input: Option<&str>, count: usize, limit: Option<usize>, output_file: &str) {
    let opts = BuildOptions {
        url: url.to_string(),
        target_count: count,
        limit,
    };
    let out_path = Path::new(output_file);

    let summary = match input {
        Some(input) => {
            eprintln!("Reading {input}...");
            let raw = die!(fs::read(input), "Error reading {input}: {}");
            let xml = if input.ends_with(".gz") {
                die!(jmdict::decompress(&raw), "Error decompressing dump: {}")
            } else {
                raw
            };
            die!(
                vocab::build_dataset_from_xml(&xml, &opts, out_path),
                "Error building dataset: {}"
            )
        }
        None => {
            eprintln!("Downloading {url}...");
            die!(
                vocab::build_dataset(&opts, out_path),
                "Error building dataset: {}"
            )
        }
    };

    let file_size = fs::metadata(output_file).map(|m| m.len()).unwrap_or(0);
    eprintln!(
        "Wrote {output_file} ({} rows from {} entries, {:.1} KB)",
        summary.rows_written,
        summary.entries_seen,
        file_size as f64 / 1024.0
    );
}

#[derive(Serialize)]
struct DatasetInfo {
    rows: usize,
    common: usize,
    with_meaning_ko: usize,
    pos_counts: Vec<(String, usize)>,
}

fn info(file: &str, json: bool) {
    let rows = die!(csv::read_dataset(Path::new(file)), "Error reading dataset: {}");

    let common = rows.iter().filter(|r| r.is_common).count();
    let with_meaning_ko = rows.iter().filter(|r| !r.meaning_ko.is_empty()).count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &rows {
        if !row.pos.is_empty() {
            *counts.entry(row.pos.as_str()).or_insert(0) += 1;
        }
    }
    let mut pos_counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(pos, n)| (pos.to_string(), n))
        .collect();
    pos_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let stats = DatasetInfo {
        rows: rows.len(),
        common,
        with_meaning_ko,
        pos_counts,
    };

    if json {
        let out = die!(
            serde_json::to_string_pretty(&stats),
            "Error encoding stats: {}"
        );
        println!("{out}");
        return;
    }

    println!("Dataset:    {file}");
    println!("Rows:       {}", stats.rows);
    println!("Common:     {}", stats.common);
    println!("Translated: {}", stats.with_meaning_ko);
    if !stats.pos_counts.is_empty() {
        println!();
        println!("POS distribution:");
        for (pos, n) in stats.pos_counts.iter().take(10) {
            println!("  {pos} × {n}");
        }
    }
}
