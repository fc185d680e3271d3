//! manifest/pack.rs
//! Reading `header.uuid` from a pack's `manifest.json`.
//!
//! Pack manifests are hand-edited and commonly carry `//` and `/* */` comments and
//! blank lines. Those are stripped before strict JSON parsing; string literals are
//! left untouched so URLs inside values survive.

use crate::manifest::types::{ManifestError, PackManifest};

/// Extract the content id (`header.uuid`) from raw `manifest.json` bytes.
pub fn read_content_id(raw: &[u8]) -> Result<String, ManifestError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ManifestError::MalformedPackManifest(e.to_string()))?;
    let cleaned = strip_json_comments(text);
    let manifest: PackManifest = serde_json::from_str(&cleaned)
        .map_err(|e| ManifestError::MalformedPackManifest(e.to_string()))?;

    let uuid = manifest.header.uuid.trim();
    if uuid.is_empty() {
        return Err(ManifestError::MalformedPackManifest("header.uuid is empty".into()));
    }
    Ok(uuid.to_owned())
}

/// Remove `//` line comments, `/* */` block comments and blank lines.
pub fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: drop up to (not including) the newline.
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
