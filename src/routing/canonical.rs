//! Canonical request paths.
//!
//! Access rules, mount stripping and the forwarded URI all use one form of
//! the inbound path: percent-decoded once, empty segments collapsed, `.` and
//! `..` resolved. The upstream receives that same form, re-encoded.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes escaped when a canonical path is put back into a URI.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Decode and normalize a raw URI path.
///
/// Returns `None` when the path does not decode to UTF-8 or contains NUL.
/// `..` never climbs above the root. A trailing slash is kept.
pub fn canonicalize(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let trailing = decoded.ends_with('/') || decoded.ends_with("/.") || decoded.ends_with("/..");

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(decoded.len() + 1);
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() || trailing {
        out.push('/');
    }
    Some(out)
}

/// Escape a canonical path for use in a URI.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}
