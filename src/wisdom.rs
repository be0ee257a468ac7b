//! Persisted planning decisions ("wisdom").
//!
//! When the provider runs with [`PlanningPolicy::Measure`](crate::lifecycle::PlanningPolicy)
//! it times the candidate transform algorithms for each new size and records
//! the winner here. Exporting the table lets later runs skip measurement.
//!
//! The on-disk format is line based:
//!
//! ```text
//! anasig-wisdom 1
//! blake3 <hex digest of the body>
//! f64 complex forward 4096 vectorized
//! ```
//!
//! The body (every line after the digest) is checksummed with BLAKE3 so a
//! truncated or hand-edited file is rejected instead of silently steering
//! planning.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;

use crate::error::WisdomError;
use crate::layout::{BufferLayout, Direction};

const HEADER: &str = "anasig-wisdom 1";
const DIGEST_PREFIX: &str = "blake3 ";

/// Which family of transform a wisdom entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformKind {
    /// Full complex transform (interleaved and split layouts).
    Complex,
    /// Real-to-complex / complex-to-real pair (half-spectrum layout).
    Real,
}

impl TransformKind {
    pub fn of(layout: BufferLayout) -> Self {
        if layout.is_full_spectrum() {
            TransformKind::Complex
        } else {
            TransformKind::Real
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TransformKind::Complex => "complex",
            TransformKind::Real => "real",
        }
    }
}

/// Transform algorithm chosen for a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// The provider's CPU-detected vector implementation.
    Vectorized,
    /// The provider's portable scalar implementation.
    Scalar,
}

impl Algorithm {
    fn as_str(self) -> &'static str {
        match self {
            Algorithm::Vectorized => "vectorized",
            Algorithm::Scalar => "scalar",
        }
    }
}

/// Key of a wisdom entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WisdomKey {
    pub precision: String,
    pub kind: TransformKind,
    pub direction: Direction,
    pub len: usize,
}

impl WisdomKey {
    pub fn new(precision: &str, kind: TransformKind, direction: Direction, len: usize) -> Self {
        Self {
            precision: precision.to_string(),
            kind,
            direction,
            len,
        }
    }
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    }
}

/// Table of recorded planning decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wisdom {
    entries: HashMap<WisdomKey, Algorithm>,
}

impl Wisdom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &WisdomKey) -> Option<Algorithm> {
        self.entries.get(key).copied()
    }

    /// Record a decision, returning the previous one for the key.
    pub fn insert(&mut self, key: WisdomKey, algorithm: Algorithm) -> Option<Algorithm> {
        self.entries.insert(key, algorithm)
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: Wisdom) {
        self.entries.extend(other.entries);
    }

    fn body(&self) -> String {
        let mut keys: Vec<&WisdomKey> = self.entries.keys().collect();
        keys.sort();
        let mut body = String::new();
        for key in keys {
            let algorithm = self.entries[key];
            // Writing into a String cannot fail.
            let _ = writeln!(
                body,
                "{} {} {} {} {}",
                key.precision,
                key.kind.as_str(),
                direction_str(key.direction),
                key.len,
                algorithm.as_str()
            );
        }
        body
    }

    /// Serialize to the checksummed text format.
    pub fn to_text(&self) -> String {
        let body = self.body();
        let digest = blake3::hash(body.as_bytes());
        format!("{}\n{}{}\n{}", HEADER, DIGEST_PREFIX, digest.to_hex(), body)
    }

    /// Parse the text format produced by [`Wisdom::to_text`].
    pub fn parse(text: &str) -> Result<Self, WisdomError> {
        let mut parts = text.splitn(3, '\n');
        if parts.next().map(str::trim_end) != Some(HEADER) {
            return Err(WisdomError::Header);
        }
        let digest = parts
            .next()
            .and_then(|line| line.trim_end().strip_prefix(DIGEST_PREFIX))
            .ok_or(WisdomError::Header)?;
        let body = parts.next().unwrap_or("");
        if blake3::hash(body.as_bytes()).to_hex().as_str() != digest {
            return Err(WisdomError::Checksum);
        }

        let mut wisdom = Wisdom::new();
        for (idx, line) in body.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // Header and digest occupy lines 1 and 2.
            let line_no = idx + 3;
            let (key, algorithm) =
                parse_entry(line).ok_or(WisdomError::Entry { line: line_no })?;
            wisdom.insert(key, algorithm);
        }
        Ok(wisdom)
    }

    /// Read a wisdom file.
    pub fn load(path: &Path) -> Result<Self, WisdomError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Write a wisdom file, replacing any existing one.
    pub fn save(&self, path: &Path) -> Result<(), WisdomError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

fn parse_entry(line: &str) -> Option<(WisdomKey, Algorithm)> {
    let mut fields = line.split_whitespace();
    let precision = match fields.next()? {
        p @ ("f32" | "f64") => p,
        _ => return None,
    };
    let kind = match fields.next()? {
        "complex" => TransformKind::Complex,
        "real" => TransformKind::Real,
        _ => return None,
    };
    let direction = match fields.next()? {
        "forward" => Direction::Forward,
        "backward" => Direction::Backward,
        _ => return None,
    };
    let len: usize = fields.next()?.parse().ok()?;
    let algorithm = match fields.next()? {
        "vectorized" => Algorithm::Vectorized,
        "scalar" => Algorithm::Scalar,
        _ => return None,
    };
    if fields.next().is_some() || len == 0 {
        return None;
    }
    Some((WisdomKey::new(precision, kind, direction, len), algorithm))
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;

    fn sample() -> Wisdom {
        let mut w = Wisdom::new();
        w.insert(
            WisdomKey::new("f64", TransformKind::Complex, Direction::Forward, 4096),
            Algorithm::Vectorized,
        );
        w.insert(
            WisdomKey::new("f32", TransformKind::Real, Direction::Backward, 10),
            Algorithm::Scalar,
        );
        w
    }

    #[test]
    fn text_is_sorted_and_parses_back() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[2], "f32 real backward 10 scalar");
        assert_eq!(lines[3], "f64 complex forward 4096 vectorized");
        assert_eq!(Wisdom::parse(&text).unwrap(), sample());
    }

    #[test]
    fn rejects_bad_entry_with_line_number() {
        let body = "f64 complex sideways 8 scalar\n";
        let text = format!(
            "{}\n{}{}\n{}",
            HEADER,
            DIGEST_PREFIX,
            blake3::hash(body.as_bytes()).to_hex(),
            body
        );
        assert_eq!(Wisdom::parse(&text), Err(WisdomError::Entry { line: 3 }));
    }

    #[test]
    fn empty_table_round_trips() {
        let text = Wisdom::new().to_text();
        assert!(Wisdom::parse(&text).unwrap().is_empty());
    }
}
