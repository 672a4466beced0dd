//! JMdict POS tag → display label mapping.
//!
//! The table covers the tags the flashcard schema distinguishes; everything
//! else degrades gracefully to the raw tag so an unmapped entry is still
//! usable as a filter key downstream.

/// Fixed tag → label table. Labels are the Korean display strings the
/// dashboard filters on. All six godan variants share one label.
const POS_MAP: &[(&str, &str)] = &[
    ("n", "명사"),
    ("adj-i", "형용사(i)"),
    ("adj-na", "형용동사(na)"),
    ("v1", "동사(1단)"),
    ("v5", "동사(5단)"),
    ("v5u", "동사(5단)"),
    ("v5k", "동사(5단)"),
    ("v5s", "동사(5단)"),
    ("v5t", "동사(5단)"),
    ("v5r", "동사(5단)"),
    ("vs", "사변동사(suru)"),
    ("vk", "동사(kuru)"),
    ("aux", "조동사"),
    ("prt", "조사"),
];

fn lookup(tag: &str) -> Option<&'static str> {
    POS_MAP
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, label)| *label)
}

/// Map a sense's POS tags to a display label.
///
/// Tags are tried in order: exact table lookup first, then the tag truncated
/// at its first hyphen (`v5k-s` → `v5`). The first hit wins. If nothing
/// maps, the first raw tag is returned unmodified, so the result is never
/// empty for non-empty input. Empty input maps to an empty string.
pub fn map_pos(tags: &[String]) -> String {
    for tag in tags {
        let base = tag.split('-').next().unwrap_or(tag);
        if let Some(label) = lookup(tag).or_else(|| lookup(base)) {
            return label.to_string();
        }
    }
    tags.first().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(map_pos(&tags(&["n"])), "명사");
        assert_eq!(map_pos(&tags(&["v5k"])), "동사(5단)");
        assert_eq!(map_pos(&tags(&["vs"])), "사변동사(suru)");
    }

    #[test]
    fn test_hyphen_base_fallback() {
        // v5k-s is not in the table but its base v5 is
        assert_eq!(map_pos(&tags(&["v5k-s"])), "동사(5단)");
        assert_eq!(map_pos(&tags(&["v1-s"])), "동사(1단)");
    }

    #[test]
    fn test_first_mapping_wins() {
        assert_eq!(map_pos(&tags(&["exp", "n"])), "명사");
        assert_eq!(map_pos(&tags(&["adj-i", "v1"])), "형용사(i)");
    }

    #[test]
    fn test_unmapped_returns_first_raw_tag() {
        assert_eq!(map_pos(&tags(&["xyz-unknown"])), "xyz-unknown");
        assert_eq!(map_pos(&tags(&["exp", "int"])), "exp");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(map_pos(&[]), "");
    }
}
