pub mod cache;
pub mod csv;

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::jmdict::{self, DictionaryEntry, ExtractError};
use crate::pos_map;

/// Provisional JLPT level marker. Rows start at the frequency-based core set
/// and get refined when a real JLPT list is merged in.
pub const JLPT_PLACEHOLDER: &str = "N5*";

/// Glosses joined beyond this many characters are cut off.
const MAX_MEANING_CHARS: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV parse error: {0}")]
    Parse(String),
}

/// One flattened flashcard record, a single sense per row.
///
/// `meaning_ko` and the five enrichment fields are never computed here; they
/// are populated externally (manual editing or a later translation pass) and
/// round-trip through the CSV untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabRow {
    pub word: String,
    pub kana: String,
    pub meaning_ko: String,
    pub meaning_en: String,
    pub pos: String,
    pub jlpt: String,
    pub is_common: bool,
    pub mnemonic_sound: String,
    pub mnemonic_image: String,
    pub mnemonic_story: String,
    pub example_jp: String,
    pub example_ko: String,
}

/// Flatten one entry into a row, or `None` when the entry has neither a
/// written form nor a reading (no usable vocabulary data).
///
/// Only the first sense contributes POS and meaning; later senses are
/// ignored because the schema has one slot per row.
pub fn build_row(entry: &DictionaryEntry) -> Option<VocabRow> {
    let word = entry
        .kebs
        .first()
        .or_else(|| entry.rebs.first())?
        .trim()
        .to_string();
    if word.is_empty() {
        return None;
    }
    let kana = entry
        .rebs
        .first()
        .map(|r| r.trim().to_string())
        .unwrap_or_default();

    let (pos, meaning_en) = match entry.senses.first() {
        Some(sense) => (pos_map::map_pos(&sense.pos), join_glosses(&sense.glosses)),
        None => (String::new(), String::new()),
    };

    Some(VocabRow {
        word,
        kana,
        meaning_en,
        pos,
        jlpt: JLPT_PLACEHOLDER.to_string(),
        is_common: jmdict::is_common(&entry.priorities),
        ..VocabRow::default()
    })
}

fn join_glosses(glosses: &[String]) -> String {
    let joined = glosses.join("; ");
    if joined.chars().count() > MAX_MEANING_CHARS {
        joined.chars().take(MAX_MEANING_CHARS).collect()
    } else {
        joined
    }
}

/// Sort rows common-first, then lexicographically by `word`, and keep the
/// first `target_count`. Ranking plus truncation, not a filter: near-cap
/// ties are broken solely by the word key.
pub fn rank_rows(mut rows: Vec<VocabRow>, target_count: usize) -> Vec<VocabRow> {
    rows.sort_by(|a, b| {
        b.is_common
            .cmp(&a.is_common)
            .then_with(|| a.word.cmp(&b.word))
    });
    rows.truncate(target_count);
    rows
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub url: String,
    pub target_count: usize,
    /// Entry cap applied during the parse. Smoke-testing only.
    pub limit: Option<usize>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            url: jmdict::JMDICT_URL.to_string(),
            target_count: 600,
            limit: None,
        }
    }
}

/// What a build run produced, for operator reporting.
#[derive(Debug)]
pub struct BuildSummary {
    pub rows_written: usize,
    pub entries_seen: usize,
    pub entries_dropped: usize,
}

/// Full pipeline: fetch → decompress → parse → flatten → rank → write CSV.
///
/// The network fetch is the only non-deterministic step; everything after it
/// is a pure function of the document. Writing the output file is the sole
/// side effect.
pub fn build_dataset(opts: &BuildOptions, out_path: &Path) -> Result<BuildSummary, ExtractError> {
    let xml = jmdict::fetch_xml(&opts.url)?;
    build_dataset_from_xml(&xml, opts, out_path)
}

/// Build from an already-decompressed document. Split out so local dumps
/// (and tests) skip the network entirely.
pub fn build_dataset_from_xml(
    xml: &[u8],
    opts: &BuildOptions,
    out_path: &Path,
) -> Result<BuildSummary, ExtractError> {
    let entries = jmdict::parse_entries(xml, opts.limit)?;
    let entries_seen = entries.len();

    let rows: Vec<VocabRow> = entries.iter().filter_map(build_row).collect();
    let entries_dropped = entries_seen - rows.len();
    if entries_dropped > 0 {
        eprintln!("  (dropped {entries_dropped} of {entries_seen} entries without word/reading)");
    }

    let rows = rank_rows(rows, opts.target_count);
    let rows_written = csv::write_dataset(out_path, &rows)?;

    Ok(BuildSummary {
        rows_written,
        entries_seen,
        entries_dropped,
    })
}
