use thiserror::Error;

use crate::orbit::OrbitError;

pub const TLE_LINE_LENGTH: usize = 69;

/// The raw lines of one element set, optionally preceded by a name line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleLines {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

/// Split a line-feed joined element set (2 or 3 lines) into its parts.
pub fn split_tle(text: &str) -> Result<TleLines, OrbitError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.trim().is_empty())
        .collect();

    match lines.as_slice() {
        [line1, line2] => Ok(TleLines {
            name: None,
            line1: line1.trim_start().to_string(),
            line2: line2.trim_start().to_string(),
        }),
        [name, line1, line2] => Ok(TleLines {
            name: Some(clean_name(name)),
            line1: line1.trim_start().to_string(),
            line2: line2.trim_start().to_string(),
        }),
        other => Err(OrbitError::malformed(format!(
            "expected 2 or 3 lines, got {}",
            other.len()
        ))),
    }
}

/// Lines that start an element set but do not complete one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct IncompleteSet {
    pub name: Option<String>,
    pub reason: String,
}

impl IncompleteSet {
    fn new(name: Option<String>, reason: &str) -> Self {
        Self {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Split a file holding any number of 2-line or 3-line sets.
///
/// Element lines that cannot be paired, and a name line left dangling at
/// the end, come back as `Err`. `#` lines are comments.
pub fn parse_multi_tle(content: &str) -> Vec<Result<TleLines, IncompleteSet>> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let mut result = Vec::new();
    let mut pending_name: Option<String> = None;
    let mut i = 0;

    while i < lines.len() {
        if is_line(lines[i], 1) && i + 1 < lines.len() && is_line(lines[i + 1], 2) {
            pending_name = None;
            result.push(Ok(TleLines {
                name: None,
                line1: lines[i].to_string(),
                line2: lines[i + 1].to_string(),
            }));
            i += 2;
        } else if i + 2 < lines.len() && is_line(lines[i + 1], 1) && is_line(lines[i + 2], 2) {
            pending_name = None;
            result.push(Ok(TleLines {
                name: Some(clean_name(lines[i])),
                line1: lines[i + 1].to_string(),
                line2: lines[i + 2].to_string(),
            }));
            i += 3;
        } else if is_line(lines[i], 1) {
            result.push(Err(IncompleteSet::new(
                pending_name.take(),
                "line 1 is not followed by a line 2",
            )));
            i += 1;
        } else if is_line(lines[i], 2) {
            result.push(Err(IncompleteSet::new(
                pending_name.take(),
                "line 2 has no preceding line 1",
            )));
            i += 1;
        } else {
            // first unpaired text line names whatever broken set follows
            if pending_name.is_none() {
                pending_name = Some(clean_name(lines[i]));
            }
            i += 1;
        }
    }

    if let Some(name) = pending_name {
        result.push(Err(IncompleteSet::new(
            Some(name),
            "name line is not followed by element lines",
        )));
    }

    result
}

fn is_line(line: &str, number: u8) -> bool {
    let bytes = line.as_bytes();
    bytes.len() > 1 && bytes[0] == b'0' + number && bytes[1] == b' '
}

/// Modulo-10 checksum over the first 68 columns.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Check width, line number and checksum of one element line.
pub fn validate_line(line: &str, number: u8) -> Result<(), OrbitError> {
    let line = line.trim_end();
    if !line.is_ascii() {
        return Err(OrbitError::malformed(format!(
            "line {number} contains non-ASCII characters"
        )));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(OrbitError::malformed(format!(
            "line {number} has {} characters, expected {TLE_LINE_LENGTH}",
            line.len()
        )));
    }

    let bytes = line.as_bytes();
    if bytes[0] != b'0' + number || bytes[1] != b' ' {
        return Err(OrbitError::malformed(format!(
            "line {number} does not start with \"{number} \""
        )));
    }

    let expected = char::from(bytes[TLE_LINE_LENGTH - 1])
        .to_digit(10)
        .ok_or_else(|| OrbitError::malformed(format!("line {number} has no checksum digit")))?;
    let actual = checksum(line);
    if expected != actual {
        return Err(OrbitError::malformed(format!(
            "line {number} checksum mismatch: expected {expected}, computed {actual}"
        )));
    }

    Ok(())
}

/// Catalog number field (columns 3-7), as written.
pub(crate) fn catalog_field(line: &str) -> &str {
    line.get(2..7).unwrap_or("").trim()
}

fn clean_name(line: &str) -> String {
    let line = line.trim();
    line.strip_prefix("0 ").unwrap_or(line).trim().to_string()
}
