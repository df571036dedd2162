//! Linear text scanners for clause bodies, identifiers and interpolations
//!
//! Everything here walks the input left to right without backtracking, so
//! running time stays linear in the input length however hostile it is.
//! Identifier characters are ASCII letters, digits and `_`; any other byte
//! (including UTF-8 continuation bytes) is a boundary.

use std::ops::Range;

/// Text substituted for every `${...}` interpolation before checks run
pub const PLACEHOLDER: &str = "__DQL_PLACEHOLDER__";

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Match `word` case-insensitively at `at`, returning the end offset
fn match_word(bytes: &[u8], at: usize, word: &[u8]) -> Option<usize> {
    let end = at.checked_add(word.len())?;
    if end <= bytes.len() && bytes[at..end].eq_ignore_ascii_case(word) {
        Some(end)
    } else {
        None
    }
}

/// Match a possibly multi-word keyword at `at`; a space in the keyword
/// matches one or more whitespace characters
fn match_keyword_at(bytes: &[u8], at: usize, keyword: &str) -> Option<usize> {
    let mut pos = at;
    for (i, word) in keyword.split_whitespace().enumerate() {
        if i > 0 {
            let gap_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos == gap_start {
                return None;
            }
        }
        pos = match_word(bytes, pos, word.as_bytes())?;
    }
    Some(pos)
}

/// Find the first whole-word, case-insensitive occurrence of `keyword`
/// at or after `from`
pub fn find_keyword(text: &str, keyword: &str, from: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let first = keyword.split_whitespace().next()?.as_bytes()[0];
    let mut at = from;
    while at < bytes.len() {
        if bytes[at].eq_ignore_ascii_case(&first)
            && (at == 0 || !is_ident_byte(bytes[at - 1]))
        {
            if let Some(end) = match_keyword_at(bytes, at, keyword) {
                if end == bytes.len() || !is_ident_byte(bytes[end]) {
                    return Some(at..end);
                }
            }
        }
        at += 1;
    }
    None
}

/// Whether `keyword` appears as a whole word anywhere in `text`
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    find_keyword(text, keyword, 0).is_some()
}

/// Byte range of the body following `open`, up to the first of `closes`
/// or the end of the text. Leading and trailing whitespace is excluded.
pub fn clause_range(text: &str, open: &str, closes: &[&str]) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let open = find_keyword(text, open, 0)?;

    let mut start = open.end;
    while start < bytes.len() && bytes[start].is_ascii_whitespace() {
        start += 1;
    }

    let end = closes
        .iter()
        .filter_map(|close| find_keyword(text, close, start))
        .map(|range| range.start)
        .min()
        .unwrap_or(bytes.len());

    let mut trimmed_end = end.max(start);
    while trimmed_end > start && bytes[trimmed_end - 1].is_ascii_whitespace() {
        trimmed_end -= 1;
    }
    Some(start..trimmed_end)
}

/// Body of the clause opened by `open` and closed by any of `closes`
pub fn extract_clause_body<'t>(text: &'t str, open: &str, closes: &[&str]) -> Option<&'t str> {
    clause_range(text, open, closes).map(|range| &text[range])
}

/// Identifier starting at or after `from`, skipping leading whitespace
pub fn identifier_after(text: &str, from: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut start = from;
    while start < bytes.len() && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    if start >= bytes.len() || !is_ident_start(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    Some(start..end)
}

/// Range of the resource name in the first `FROM <identifier>` of `text`
pub fn resource_after_from(text: &str) -> Option<Range<usize>> {
    let mut from = 0;
    while let Some(keyword) = find_keyword(text, "FROM", from) {
        if let Some(ident) = identifier_after(text, keyword.end) {
            return Some(ident);
        }
        from = keyword.end;
    }
    None
}

/// Every `ident.ident` pair in `text` with its byte offset
///
/// Exactly one dot is consumed per token; a dot not followed by an
/// identifier start is skipped and scanning resumes after it. Quoted
/// literals are skipped whole, so `'shop.example'` is not a field.
pub fn scan_dotted_identifiers(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\'' || bytes[i] == b'"' {
            i = skip_quoted(bytes, i);
            continue;
        }
        if !is_ident_start(bytes[i]) {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && is_ident_byte(bytes[i]) {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'.' {
            if i + 1 < bytes.len() && is_ident_start(bytes[i + 1]) {
                i += 1;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                found.push((start, &text[start..i]));
            } else {
                i += 1;
            }
        }
    }

    found
}

/// Index just past the literal opened by the quote at `start`; an
/// unterminated literal runs to the end of `bytes`
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Dotted identifiers in `text`, in order of appearance
pub fn extract_dotted_identifiers(text: &str) -> Vec<&str> {
    scan_dotted_identifiers(text)
        .into_iter()
        .map(|(_, ident)| ident)
        .collect()
}

/// Split on commas outside parentheses and quotes, trimming each item.
/// Offsets are relative to `text`; empty items are dropped.
pub fn split_top_level(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut item_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    push_item(text, item_start..i, &mut items);
                    item_start = i + 1;
                }
                _ => {}
            },
        }
    }
    push_item(text, item_start..bytes.len(), &mut items);

    items
}

fn push_item<'t>(text: &'t str, range: Range<usize>, items: &mut Vec<(usize, &'t str)>) {
    let raw = &text[range.clone()];
    let trimmed = raw.trim_start();
    let offset = range.start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        items.push((offset, trimmed));
    }
}

/// A text with its interpolations replaced by [`PLACEHOLDER`]
#[derive(Debug, Clone)]
pub struct MaskedText {
    pub text: String,
    replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, Copy)]
struct Replacement {
    masked_start: usize,
    masked_end: usize,
    original_start: usize,
    original_end: usize,
}

impl MaskedText {
    /// Map an offset in the masked text back to the original text.
    /// Offsets inside a placeholder map to the start of its interpolation.
    pub fn to_original(&self, offset: usize) -> usize {
        let mut mapped = offset;
        for r in &self.replacements {
            if offset < r.masked_start {
                break;
            }
            if offset < r.masked_end {
                return r.original_start;
            }
            mapped = offset - r.masked_end + r.original_end;
        }
        mapped
    }
}

/// Replace each `${...}` span (brace-balanced) with [`PLACEHOLDER`].
/// An unterminated `${` leaves the remainder of the text untouched.
pub fn mask_interpolations(text: &str) -> MaskedText {
    let bytes = text.as_bytes();
    let mut masked = String::with_capacity(text.len());
    let mut replacements = Vec::new();
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'{' {
            i += 1;
            continue;
        }

        let mut depth = 1usize;
        let mut j = i + 2;
        while j < bytes.len() && depth > 0 {
            match bytes[j] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            j += 1;
        }
        if depth > 0 {
            break;
        }

        masked.push_str(&text[copied..i]);
        let masked_start = masked.len();
        masked.push_str(PLACEHOLDER);
        replacements.push(Replacement {
            masked_start,
            masked_end: masked.len(),
            original_start: i,
            original_end: j,
        });
        copied = j;
        i = j;
    }
    masked.push_str(&text[copied..]);

    MaskedText {
        text: masked,
        replacements,
    }
}

/// A delimited query found inside a larger document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedQuery {
    /// Byte range of the body, delimiters excluded
    pub body: Range<usize>,
    /// Line of the opening delimiter (0-indexed)
    pub start_line: usize,
}

/// Find backtick-delimited substrings that contain both SELECT and FROM.
///
/// Backslash escapes are honoured and a backtick inside `${...}` does not
/// end the literal. An unterminated literal ends the scan.
pub fn find_embedded_queries(document: &str) -> Vec<EmbeddedQuery> {
    let bytes = document.as_bytes();
    let mut queries = Vec::new();
    let mut line = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => line += 1,
            b'`' => {
                let start_line = line;
                let start = i + 1;
                let mut depth = 0usize;
                let mut j = start;
                let mut close = None;

                while j < bytes.len() {
                    match bytes[j] {
                        b'\\' => {
                            if bytes.get(j + 1) == Some(&b'\n') {
                                line += 1;
                            }
                            j += 2;
                            continue;
                        }
                        b'\n' => line += 1,
                        b'$' if bytes.get(j + 1) == Some(&b'{') => {
                            depth += 1;
                            j += 2;
                            continue;
                        }
                        b'{' if depth > 0 => depth += 1,
                        b'}' if depth > 0 => depth -= 1,
                        b'`' if depth == 0 => {
                            close = Some(j);
                            break;
                        }
                        _ => {}
                    }
                    j += 1;
                }

                let Some(end) = close else {
                    break;
                };
                let body = &document[start..end];
                if contains_keyword(body, "SELECT") && contains_keyword(body, "FROM") {
                    queries.push(EmbeddedQuery {
                        body: start..end,
                        start_line,
                    });
                }
                i = end + 1;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyword_whole_word_case_insensitive() {
        assert_eq!(find_keyword("select a from b", "FROM", 0), Some(9..13));
        assert_eq!(find_keyword("SELECT fromage FROM b", "FROM", 0), Some(15..19));
        assert_eq!(find_keyword("SELECT a_from FROM b", "FROM", 0), Some(14..18));
        assert_eq!(find_keyword("SELECT a", "FROM", 0), None);
    }

    #[test]
    fn test_find_multi_word_keyword() {
        let text = "WHERE a.b = 1 ORDER\n  BY a.b";
        assert_eq!(find_keyword(text, "ORDER BY", 0), Some(14..24));
        assert_eq!(find_keyword("ORDERBY x", "ORDER BY", 0), None);
    }

    #[test]
    fn test_extract_clause_body() {
        let q = "SELECT campaign.id, campaign.name FROM campaign WHERE campaign.status = 'ENABLED' ORDER BY campaign.id LIMIT 5";
        assert_eq!(
            extract_clause_body(q, "SELECT", &["FROM"]),
            Some("campaign.id, campaign.name")
        );
        assert_eq!(
            extract_clause_body(q, "WHERE", &["ORDER BY", "LIMIT"]),
            Some("campaign.status = 'ENABLED'")
        );
        assert_eq!(extract_clause_body(q, "HAVING", &["LIMIT"]), None);
    }

    #[test]
    fn test_extract_clause_body_runs_to_end() {
        let q = "SELECT a.b FROM c WHERE a.b > 3   ";
        assert_eq!(extract_clause_body(q, "WHERE", &["ORDER BY", "LIMIT"]), Some("a.b > 3"));
        assert_eq!(extract_clause_body("SELECT", "SELECT", &["FROM"]), Some(""));
    }

    #[test]
    fn test_clause_scan_handles_large_adversarial_input() {
        let text = format!("SELECT {} FROM campaign", "a ".repeat(200_000));
        let body = extract_clause_body(&text, "SELECT", &["FROM"]).unwrap();
        assert_eq!(body.len(), 399_999);
    }

    #[test]
    fn test_dotted_identifiers() {
        assert_eq!(
            extract_dotted_identifiers("campaign.id = 1 AND metrics.clicks > 10"),
            vec!["campaign.id", "metrics.clicks"]
        );
    }

    #[test]
    fn test_dotted_identifiers_take_one_pair() {
        assert_eq!(extract_dotted_identifiers("a.b.c"), vec!["a.b"]);
        assert_eq!(extract_dotted_identifiers("a..b.c"), vec!["b.c"]);
        assert_eq!(extract_dotted_identifiers("x. y 1.5 'z'"), Vec::<&str>::new());
    }

    #[test]
    fn test_dotted_identifiers_skip_quoted_literals() {
        assert_eq!(
            extract_dotted_identifiers(
                "campaign.name = 'shop.example' AND ad.url CONTAINS ANY (\"https://x.com\", 'it\\'s.here')"
            ),
            vec!["campaign.name", "ad.url"]
        );
        assert_eq!(extract_dotted_identifiers("a.b = 'open.ended"), vec!["a.b"]);
    }

    #[test]
    fn test_scan_reports_offsets() {
        assert_eq!(
            scan_dotted_identifiers("  ad_group.id"),
            vec![(2, "ad_group.id")]
        );
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level(" a.b ,c.d,, f(x, y) , 'p,q' "),
            vec![(1, "a.b"), (6, "c.d"), (12, "f(x, y)"), (22, "'p,q'")]
        );
    }

    #[test]
    fn test_identifier_after() {
        let text = "FROM   campaign WHERE";
        assert_eq!(identifier_after(text, 4), Some(7..15));
        assert_eq!(identifier_after("FROM 9x", 4), None);
        assert_eq!(identifier_after("FROM", 4), None);
    }

    #[test]
    fn test_resource_after_from_skips_bare_from() {
        assert_eq!(resource_after_from("FROM , FROM ad_group"), Some(12..20));
        assert_eq!(resource_after_from("SELECT a.b"), None);
    }

    #[test]
    fn test_mask_interpolations() {
        let masked = mask_interpolations("a = '${x.y}' AND b = ${ {k: 1} }");
        assert_eq!(
            masked.text,
            format!("a = '{}' AND b = {}", PLACEHOLDER, PLACEHOLDER)
        );
        assert_eq!(masked.replacements.len(), 2);
    }

    #[test]
    fn test_mask_maps_offsets_back() {
        let original = "${a} x ${bb} y";
        let masked = mask_interpolations(original);
        let y = masked.text.find('y').unwrap();
        assert_eq!(masked.to_original(y), original.find('y').unwrap());
        let x = masked.text.find(" x").unwrap() + 1;
        assert_eq!(masked.to_original(x), 5);
        assert_eq!(masked.to_original(2), 0);
    }

    #[test]
    fn test_unterminated_interpolation_is_left_alone() {
        let masked = mask_interpolations("a ${b.c");
        assert_eq!(masked.text, "a ${b.c");
        assert!(masked.replacements.is_empty());
    }

    #[test]
    fn test_find_embedded_queries() {
        let doc = "const a = 1;\nconst q = `\n  SELECT campaign.id\n  FROM campaign`;\nconst s = `hello ${name}`;\nconst r = `SELECT x FROM ${t}`;\n";
        let queries = find_embedded_queries(doc);
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].start_line, 1);
        assert_eq!(
            &doc[queries[0].body.clone()],
            "\n  SELECT campaign.id\n  FROM campaign"
        );
        assert_eq!(queries[1].start_line, 5);
    }

    #[test]
    fn test_embedded_query_with_backtick_in_interpolation() {
        let doc = "`SELECT a.b FROM c WHERE a.b = ${f(`x`)}` `FROM`";
        let queries = find_embedded_queries(doc);
        assert_eq!(queries.len(), 1);
        assert!(doc[queries[0].body.clone()].ends_with("${f(`x`)}"));
    }
}
