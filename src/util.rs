use anyhow::{anyhow, Result};
use std::path::Path;

/// The extension of content documents.
pub const MARKDOWN_EXTENSION: &str = "md";

pub fn read_to_string(path: &Path, kind: &str) -> Result<String> {
    match std::fs::read_to_string(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(contents) => Ok(contents),
    }
}

/// Returns true if `path` names a markdown document.
pub fn is_document(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
}

/// Title-cases `s`: the first letter of every run of letters is upper-cased
/// and the rest lower-cased (`my-first_post` becomes `My-First_Post`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            match in_word {
                true => out.extend(c.to_lowercase()),
                false => out.extend(c.to_uppercase()),
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
