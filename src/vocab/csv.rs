//! Delimited-text serialization of the vocabulary dataset.
//!
//! UTF-8 with a byte-order marker (spreadsheet tools misdetect the encoding
//! without it), comma-separated, header row in the fixed schema order.
//! Fields are quoted only when they contain the delimiter, a quote, or a
//! line break; glosses routinely contain all three. The reader tolerates
//! missing columns by substituting empty strings, which is the consumer
//! contract of the dashboard.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::{DatasetError, VocabRow};

/// Output schema, in fixed column order.
pub const FIELDS: [&str; 12] = [
    "word",
    "kana",
    "meaning_ko",
    "meaning_en",
    "pos",
    "jlpt",
    "is_common",
    "mnemonic_sound",
    "mnemonic_image",
    "mnemonic_story",
    "example_jp",
    "example_ko",
];

const BOM: &str = "\u{feff}";

/// Write the dataset. An empty row set still produces a complete file with
/// the header row. Returns the number of data rows written.
pub fn write_dataset(path: &Path, rows: &[VocabRow]) -> io::Result<usize> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);

    w.write_all(BOM.as_bytes())?;
    write_record(&mut w, &FIELDS)?;
    for row in rows {
        let is_common = if row.is_common { "true" } else { "false" };
        write_record(
            &mut w,
            &[
                &row.word,
                &row.kana,
                &row.meaning_ko,
                &row.meaning_en,
                &row.pos,
                &row.jlpt,
                is_common,
                &row.mnemonic_sound,
                &row.mnemonic_image,
                &row.mnemonic_story,
                &row.example_jp,
                &row.example_ko,
            ],
        )?;
    }
    w.flush()?;
    Ok(rows.len())
}

fn write_record<W: Write>(w: &mut W, fields: &[&str]) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if field.contains(['"', ',', '\n', '\r']) {
            w.write_all(b"\"")?;
            w.write_all(field.replace('"', "\"\"").as_bytes())?;
            w.write_all(b"\"")?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Read a dataset back. Column order is taken from the header row; columns
/// absent from the file come back as empty strings.
pub fn read_dataset(path: &Path) -> Result<Vec<VocabRow>, DatasetError> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix(BOM).unwrap_or(&content);

    let mut records = parse_records(content)?.into_iter();
    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };

    // Column index per schema field, None when the file lacks the column.
    let index: Vec<Option<usize>> = FIELDS
        .iter()
        .map(|field| header.iter().position(|h| h == field))
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let get = |field: usize| -> &str {
            index[field]
                .and_then(|i| record.get(i))
                .map(String::as_str)
                .unwrap_or("")
        };
        rows.push(VocabRow {
            word: get(0).to_string(),
            kana: get(1).to_string(),
            meaning_ko: get(2).to_string(),
            meaning_en: get(3).to_string(),
            pos: get(4).to_string(),
            jlpt: get(5).to_string(),
            is_common: get(6).eq_ignore_ascii_case("true"),
            mnemonic_sound: get(7).to_string(),
            mnemonic_image: get(8).to_string(),
            mnemonic_story: get(9).to_string(),
            example_jp: get(10).to_string(),
            example_ko: get(11).to_string(),
        });
    }
    Ok(rows)
}

/// Split CSV text into records of fields, honoring quoted fields with
/// embedded delimiters, quotes and line breaks.
fn parse_records(input: &str) -> Result<Vec<Vec<String>>, DatasetError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {} // swallowed with the \n
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(DatasetError::Parse("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Blank lines parse as a single empty field; drop them.
    records.retain(|r| r.len() > 1 || !r[0].is_empty());
    Ok(records)
}
