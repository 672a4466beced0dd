mod parse;

use std::io::{self, Read};

use flate2::read::GzDecoder;

pub use parse::parse_entries;

/// Default JMdict_e dump URL (English-gloss edition, gzip-compressed).
pub const JMDICT_URL: &str = "https://ftp.edrdg.org/pub/Nihongo/JMdict_e.gz";

/// Cap on the downloaded body. The compressed dump is ~12 MB; anything near
/// this limit means the server sent something else entirely.
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("gzip error: {0}")]
    Gzip(String),

    #[error("XML error: {0}")]
    Xml(String),
}

/// One meaning grouping within an entry: its POS tags and English glosses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sense {
    pub pos: Vec<String>,
    pub glosses: Vec<String>,
}

/// One parsed JMdict entry: written forms, readings, priority tags, senses.
///
/// Field order within each vector matches document order. An entry with no
/// written form and no reading carries no usable vocabulary data and is
/// dropped downstream by [`crate::vocab::build_row`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// Written forms (`k_ele/keb`). Empty for kana-only words.
    pub kebs: Vec<String>,
    /// Phonetic readings (`r_ele/reb`).
    pub rebs: Vec<String>,
    /// Priority tags from both `ke_pri` and `re_pri`.
    pub priorities: Vec<String>,
    pub senses: Vec<Sense>,
}

/// Download the raw gzip-compressed dump. A non-2xx response or interrupted
/// transfer is fatal; there is no retry — the operator re-runs the tool.
pub fn fetch(url: &str) -> Result<Vec<u8>, ExtractError> {
    tracing::debug!(url, "fetching dictionary dump");
    ureq::get(url)
        .call()
        .map_err(|e| ExtractError::Http(format!("{url}: {e}")))?
        .into_body()
        .with_config()
        .limit(MAX_DOWNLOAD_BYTES)
        .read_to_vec()
        .map_err(|e| ExtractError::Http(format!("{url}: {e}")))
}

/// Gunzip the downloaded payload. Failure here is a payload problem, kept
/// distinct from [`ExtractError::Http`] so callers can tell "server problem"
/// from "corrupt payload".
pub fn decompress(raw: &[u8]) -> Result<Vec<u8>, ExtractError> {
    let mut xml = Vec::new();
    GzDecoder::new(raw)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Gzip(e.to_string()))?;
    Ok(xml)
}

/// Fetch and decompress in one step.
pub fn fetch_xml(url: &str) -> Result<Vec<u8>, ExtractError> {
    let raw = fetch(url)?;
    decompress(&raw)
}

/// True iff at least one priority tag marks the entry as a common word.
///
/// The accepted set is exactly `ichi1`, `news1`, `spec1`, `gai1` and
/// `nf01`..`nf12` (two-digit, zero-padded). Exact string comparison only —
/// `news2` or `NF01` do not count.
pub fn is_common(priorities: &[String]) -> bool {
    priorities.iter().any(|tag| is_common_tag(tag))
}

fn is_common_tag(tag: &str) -> bool {
    match tag {
        "ichi1" | "news1" | "spec1" | "gai1" => true,
        _ => {
            let Some(digits) = tag.strip_prefix("nf") else {
                return false;
            };
            if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            matches!(digits.parse::<u8>(), Ok(1..=12))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_common_exact_set() {
        assert!(is_common(&tags(&["ichi1"])));
        assert!(is_common(&tags(&["news1"])));
        assert!(is_common(&tags(&["spec1"])));
        assert!(is_common(&tags(&["gai1"])));
        assert!(is_common(&tags(&["nf01"])));
        assert!(is_common(&tags(&["nf09"])));
        assert!(is_common(&tags(&["nf12"])));
        // One matching tag among noise is enough
        assert!(is_common(&tags(&["xyz", "ichi1"])));
    }

    #[test]
    fn test_is_common_rejects_near_misses() {
        assert!(!is_common(&tags(&["news2"])));
        assert!(!is_common(&tags(&["ichi2"])));
        assert!(!is_common(&tags(&["spec2"])));
        assert!(!is_common(&tags(&["nf13"])));
        assert!(!is_common(&tags(&["nf00"])));
        assert!(!is_common(&tags(&["nf1"]))); // not zero-padded
        assert!(!is_common(&tags(&["nf012"]))); // three digits
        assert!(!is_common(&tags(&["NF01"]))); // case-sensitive
        assert!(!is_common(&tags(&["ichi10"])));
        assert!(!is_common(&tags(&[])));
    }

    #[test]
    fn test_decompress_roundtrip() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all("<JMdict></JMdict>".as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let xml = decompress(&gz).unwrap();
        assert_eq!(xml, b"<JMdict></JMdict>");
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let err = decompress(b"not gzip at all").unwrap_err();
        assert!(matches!(err, ExtractError::Gzip(_)));
    }
}
