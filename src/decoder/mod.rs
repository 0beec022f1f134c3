//! Two-stage detection and decoding of JSON-style string literals.
//!
//! Stage one treats the whole trimmed selection as a single quoted literal;
//! stage two scans the selection for embedded literals and decodes the
//! longest one. Both stages reject literals whose decoded value equals their
//! quoted content, so escape-free text never opens a preview.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMethod {
    /// The entire trimmed selection was one quoted literal.
    Direct,
    /// The longest quoted literal found inside a larger selection.
    Extract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    pub decoded: String,
    pub method: DecodeMethod,
}

/// Decodes a quoted, escaped string literal out of `text`, or returns `None`
/// when nothing decodable is present. A miss is a normal outcome; this never
/// fails.
pub fn decode(text: &str) -> Option<DecodeResult> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(decoded) = decode_direct(trimmed) {
        tracing::trace!(chars = decoded.chars().count(), "decoded whole selection");
        return Some(DecodeResult {
            decoded,
            method: DecodeMethod::Direct,
        });
    }

    let decoded = decode_extracted(trimmed)?;
    tracing::trace!(chars = decoded.chars().count(), "decoded embedded literal");
    Some(DecodeResult {
        decoded,
        method: DecodeMethod::Extract,
    })
}

fn decode_direct(trimmed: &str) -> Option<String> {
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return None;
    }

    let decoded = serde_json::from_str::<String>(trimmed).ok()?;
    changed_by_decoding(trimmed, &decoded).then_some(decoded)
}

fn decode_extracted(trimmed: &str) -> Option<String> {
    let candidate = longest_literal_span(trimmed)?;
    if candidate.len() < 2 {
        return None;
    }

    let decoded = match serde_json::from_str::<String>(candidate) {
        Ok(value) => value,
        // Grammar matches are not always valid JSON (stray escapes, raw
        // control characters). Degrade to the manual unescape instead of
        // dropping the candidate outright.
        Err(_) => unescape_loose(&candidate[1..candidate.len() - 1]),
    };

    changed_by_decoding(candidate, &decoded).then_some(decoded)
}

/// A literal with no escapes decodes to its own quoted content, which makes
/// the preview a no-op. The empty literal `""` is the one exception: it is a
/// valid match whose decoded value is the empty string.
fn changed_by_decoding(literal: &str, decoded: &str) -> bool {
    let content = &literal[1..literal.len() - 1];
    content.is_empty() || decoded != content
}

/// Single left-to-right pass over the text collecting complete string-literal
/// spans: opening quote, zero or more of (any character except quote or
/// backslash) or (backslash followed by any character), closing quote. The
/// longest raw span wins; equal lengths keep the first one found.
fn longest_literal_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<&str> = None;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        match literal_end(bytes, i) {
            Some(end) => {
                let span = &text[i..=end];
                if best.is_none_or(|current| span.len() > current.len()) {
                    best = Some(span);
                }
                i = end + 1;
            }
            // Unterminated opening quote. Resume right after it so a quote
            // inside the failed span can still open a later literal.
            None => i += 1,
        }
    }

    best
}

/// Index of the closing quote for the literal opened at `open`, or `None`
/// when the text ends first. Quote and backslash are ASCII, so a byte scan
/// never confuses them with UTF-8 continuation bytes.
fn literal_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Best-effort replacement of the common escape pairs. Unrecognized pairs and
/// a trailing backslash pass through untouched; this never fails.
fn unescape_loose(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
