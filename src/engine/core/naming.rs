use std::cmp::Ordering;
use std::path::Path;

/// Video file extensions eligible for re-encoding
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"];

/// Prefix reserved for in-progress encoder output. Files carrying it are never scanned.
pub const TEMP_PREFIX: &str = "temp_";

/// Collapse a duplicated trailing extension (`movie.mp4.mp4` -> `movie.mp4`).
///
/// The suffix match is case-sensitive and only considers ASCII alphanumeric
/// extensions. Repeats are collapsed until none remain, so applying this twice
/// gives the same result as applying it once.
pub fn normalize_name(name: &str) -> String {
    let mut current = name;
    while let Some(collapsed) = strip_duplicate_extension(current) {
        current = collapsed;
    }
    current.to_string()
}

/// Single collapse step: returns the name without its final extension when
/// that extension is immediately repeated.
fn strip_duplicate_extension(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;
    let ext = &name[dot..];
    if ext.len() < 2 || !ext[1..].bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    let head = &name[..dot];
    head.ends_with(ext).then_some(head)
}

/// Check if a file name has a supported video extension and is not one of our temporaries
pub fn is_eligible(file_name: &str) -> bool {
    if file_name.starts_with(TEMP_PREFIX) {
        return false;
    }
    has_video_extension(Path::new(file_name))
}

/// Check if a path has a video file extension
pub fn has_video_extension(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return VIDEO_EXTENSIONS.contains(&ext_str.to_lowercase().as_str());
        }
    }
    false
}

/// Name of the temporary output written next to the source while encoding
pub fn temp_name_for(normalized: &str) -> String {
    format!("{}{}", TEMP_PREFIX, normalized.replace(' ', "_"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Text(String),
    /// Digit run with leading zeros stripped
    Number(String),
}

impl Ord for Chunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            // Shorter digit run is the smaller number once zeros are gone
            (Chunk::Number(a), Chunk::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Less,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key that orders embedded digit runs numerically and text case-insensitively,
/// so "Module 2" sorts before "Module 10".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Chunk>);

/// Split a name into alternating text/digit runs. The key always starts with a
/// (possibly empty) text run, so text and numbers line up position by position.
pub fn natural_sort_key(name: &str) -> NaturalKey {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in name.chars() {
        if c.is_ascii_digit() {
            if digits.is_empty() {
                chunks.push(Chunk::Text(std::mem::take(&mut text).to_lowercase()));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                chunks.push(number_chunk(&std::mem::take(&mut digits)));
            }
            text.push(c);
        }
    }

    if !digits.is_empty() {
        chunks.push(number_chunk(&digits));
    }
    chunks.push(Chunk::Text(text.to_lowercase()));

    NaturalKey(chunks)
}

fn number_chunk(digits: &str) -> Chunk {
    let trimmed = digits.trim_start_matches('0');
    Chunk::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Comparator form of [`natural_sort_key`]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}
