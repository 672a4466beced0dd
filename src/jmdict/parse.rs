use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use super::{DictionaryEntry, ExtractError, Sense};

/// Leaf element currently being collected.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Leaf {
    Keb,
    Reb,
    KePri,
    RePri,
    Pos,
    Gloss,
}

/// Parse the decompressed JMdict document into entries, in document order.
///
/// The whole document is parsed in one pass; per-entry defects (missing
/// forms, empty senses) are not errors here — such entries simply carry
/// empty vectors and get dropped when rows are built. Only a document-level
/// failure (invalid UTF-8, malformed markup) is fatal.
///
/// `limit` truncates the result after N entries. Intended for smoke-testing,
/// not production runs.
pub fn parse_entries(
    xml: &[u8],
    limit: Option<usize>,
) -> Result<Vec<DictionaryEntry>, ExtractError> {
    let xml = std::str::from_utf8(xml).map_err(|e| ExtractError::Xml(e.to_string()))?;

    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut out: Vec<DictionaryEntry> = Vec::new();
    let mut entry: Option<DictionaryEntry> = None;
    let mut sense: Option<Sense> = None;
    let mut leaf: Option<Leaf> = None;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => entry = Some(DictionaryEntry::default()),
                b"sense" if entry.is_some() => sense = Some(Sense::default()),
                b"keb" => start_leaf(&mut leaf, &mut text, Leaf::Keb),
                b"reb" => start_leaf(&mut leaf, &mut text, Leaf::Reb),
                b"ke_pri" => start_leaf(&mut leaf, &mut text, Leaf::KePri),
                b"re_pri" => start_leaf(&mut leaf, &mut text, Leaf::RePri),
                b"pos" if sense.is_some() => start_leaf(&mut leaf, &mut text, Leaf::Pos),
                b"gloss" if sense.is_some() => {
                    // English-gloss entries only; other languages are
                    // excluded at this stage.
                    if gloss_is_english(e) {
                        start_leaf(&mut leaf, &mut text, Leaf::Gloss);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if leaf.is_some() {
                    text.push_str(&decode_text(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        out.push(done);
                        if limit.is_some_and(|n| out.len() >= n) {
                            break;
                        }
                    }
                }
                b"sense" => {
                    if let (Some(done), Some(ent)) = (sense.take(), entry.as_mut()) {
                        ent.senses.push(done);
                    }
                }
                b"keb" | b"reb" | b"ke_pri" | b"re_pri" | b"pos" | b"gloss" => {
                    end_leaf(&mut leaf, &mut text, entry.as_mut(), sense.as_mut());
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
        }
        buf.clear();
    }

    tracing::debug!(entries = out.len(), "parsed dictionary document");
    Ok(out)
}

fn start_leaf(leaf: &mut Option<Leaf>, text: &mut String, which: Leaf) {
    *leaf = Some(which);
    text.clear();
}

fn end_leaf(
    leaf: &mut Option<Leaf>,
    text: &mut String,
    entry: Option<&mut DictionaryEntry>,
    sense: Option<&mut Sense>,
) {
    let Some(which) = leaf.take() else { return };
    let value = std::mem::take(text);
    if value.is_empty() {
        return;
    }
    match which {
        Leaf::Keb => {
            if let Some(ent) = entry {
                ent.kebs.push(value);
            }
        }
        Leaf::Reb => {
            if let Some(ent) = entry {
                ent.rebs.push(value);
            }
        }
        Leaf::KePri | Leaf::RePri => {
            if let Some(ent) = entry {
                ent.priorities.push(value);
            }
        }
        Leaf::Pos => {
            if let Some(s) = sense {
                s.pos.push(value);
            }
        }
        Leaf::Gloss => {
            if let Some(s) = sense {
                s.glosses.push(value);
            }
        }
    }
}

/// True if a `<gloss>` element carries no language attribute or is tagged
/// English. JMdict uses `xml:lang`; plain `lang` is accepted for tolerance.
fn gloss_is_english(e: &quick_xml::events::BytesStart<'_>) -> bool {
    for attr in e.attributes().flatten() {
        if matches!(attr.key.as_ref(), b"xml:lang" | b"lang") {
            if let Ok(val) = attr.unescape_value() {
                return val == "eng";
            }
        }
    }
    true
}

/// Decode entity references in element text.
///
/// JMdict declares its tag vocabulary as custom DTD entities (`&n;`,
/// `&adj-i;`, …) that a non-validating parser cannot expand. Resolving each
/// unknown entity to its own name yields exactly the short tags the POS
/// mapping table keys on. Standard predefined and numeric character
/// references are decoded normally.
fn decode_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            // Entity names are short; an unterminated or oversized run is
            // treated as a literal ampersand.
            Some(end) if end <= 32 => {
                let name = &after[..end];
                match name {
                    "amp" => out.push('&'),
                    "lt" => out.push('<'),
                    "gt" => out.push('>'),
                    "quot" => out.push('"'),
                    "apos" => out.push('\''),
                    _ => {
                        if let Some(c) = decode_char_ref(name) {
                            out.push(c);
                        } else {
                            out.push_str(name);
                        }
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode `#NNN` / `#xHH` numeric character references. Returns `None` for
/// anything else (including named entities).
fn decode_char_ref(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<JMdict>
<entry>
<ent_seq>1000001</ent_seq>
<k_ele><keb>食べる</keb><ke_pri>ichi1</ke_pri></k_ele>
<r_ele><reb>たべる</reb><re_pri>ichi1</re_pri><re_pri>nf03</re_pri></r_ele>
<sense><pos>&v1;</pos><gloss>to eat</gloss><gloss xml:lang="ger">essen</gloss></sense>
<sense><pos>&v1;</pos><gloss>to live on</gloss></sense>
</entry>
<entry>
<ent_seq>1000002</ent_seq>
<r_ele><reb>ラーメン</reb></r_ele>
<sense><pos>&n;</pos><gloss>ramen</gloss><gloss>Chinese-style noodles</gloss></sense>
</entry>
<entry>
<ent_seq>1000003</ent_seq>
<sense><gloss>orphaned sense</gloss></sense>
</entry>
</JMdict>
"#;

    #[test]
    fn test_parse_sample_document() {
        let entries = parse_entries(SAMPLE.as_bytes(), None).unwrap();
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.kebs, vec!["食べる"]);
        assert_eq!(first.rebs, vec!["たべる"]);
        // Priorities are collected from both k_ele and r_ele
        assert_eq!(first.priorities, vec!["ichi1", "ichi1", "nf03"]);
        assert_eq!(first.senses.len(), 2);
        // Custom DTD entity resolves to its short tag name
        assert_eq!(first.senses[0].pos, vec!["v1"]);
        // German gloss excluded
        assert_eq!(first.senses[0].glosses, vec!["to eat"]);
        assert_eq!(first.senses[1].glosses, vec!["to live on"]);

        let second = &entries[1];
        assert!(second.kebs.is_empty());
        assert_eq!(second.rebs, vec!["ラーメン"]);
        assert_eq!(second.senses[0].pos, vec!["n"]);
        assert_eq!(
            second.senses[0].glosses,
            vec!["ramen", "Chinese-style noodles"]
        );

        // Entry with neither keb nor reb still parses; dropping it is the
        // row builder's job.
        let third = &entries[2];
        assert!(third.kebs.is_empty() && third.rebs.is_empty());
    }

    #[test]
    fn test_parse_limit() {
        let entries = parse_entries(SAMPLE.as_bytes(), Some(2)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kebs, vec!["食べる"]);
        assert_eq!(entries[1].rebs, vec!["ラーメン"]);
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let err = parse_entries(&[0x3c, 0xff, 0xfe], None).unwrap_err();
        assert!(matches!(err, ExtractError::Xml(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_markup() {
        let err = parse_entries(b"<JMdict><entry></JMdict>", None).unwrap_err();
        assert!(matches!(err, ExtractError::Xml(_)));
    }

    #[test]
    fn test_decode_text_entities() {
        assert_eq!(decode_text("&n;"), "n");
        assert_eq!(decode_text("&adj-i;"), "adj-i");
        assert_eq!(decode_text("fish &amp; chips"), "fish & chips");
        assert_eq!(decode_text("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_text("&#x3042;"), "あ");
        assert_eq!(decode_text("&#12354;"), "あ");
        // Unterminated reference stays literal
        assert_eq!(decode_text("AT&T"), "AT&T");
        assert_eq!(decode_text("plain"), "plain");
    }
}
