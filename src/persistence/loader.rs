//! Asteroid record loader
//!
//! One record per line, whitespace separated:
//! - 6 fields: `id x y vx vy radius`
//! - 5 fields: `x y vx vy radius` (the 1-based line number becomes the id)
//!
//! Bad records are skipped and reported, never fatal. Non-finite numbers are
//! kept; the simulation flags those bodies as data-quality warnings.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::DVec2;

use crate::sim::{Body, BodyId};

const FIELD_NAMES: [&str; 5] = ["x", "y", "vx", "vy", "radius"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read asteroid records: {0}")]
    Io(#[from] std::io::Error),

    #[error("no valid asteroid records ({skipped} skipped)")]
    NoValidRecords { skipped: usize },
}

/// Why a line was not turned into a body
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FieldCount(usize),
    Encoding,
    BadId(String),
    BadNumber { field: &'static str, text: String },
    NonPositiveRadius(f64),
    DuplicateId(BodyId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FieldCount(n) => write!(f, "expected 5 or 6 fields, found {}", n),
            SkipReason::Encoding => write!(f, "line is not valid UTF-8"),
            SkipReason::BadId(text) => write!(f, "invalid id {:?}", text),
            SkipReason::BadNumber { field, text } => write!(f, "invalid {} {:?}", field, text),
            SkipReason::NonPositiveRadius(r) => write!(f, "radius must be positive, got {}", r),
            SkipReason::DuplicateId(id) => write!(f, "id {} already used", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// 1-based line number
    pub line: usize,
    pub reason: SkipReason,
}

/// Parsed bodies plus every rejected line
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub bodies: Vec<Body>,
    pub skipped: Vec<SkippedRecord>,
}

fn parse_record(line_num: usize, parts: &[&str]) -> Result<Body, SkipReason> {
    let (id, numbers) = match parts.len() {
        6 => {
            let id = parts[0]
                .parse::<i64>()
                .map_err(|_| SkipReason::BadId(parts[0].to_string()))?;
            (id, &parts[1..])
        }
        5 => (line_num as i64, parts),
        n => return Err(SkipReason::FieldCount(n)),
    };

    let mut values = [0.0_f64; 5];
    for ((slot, text), field) in values.iter_mut().zip(numbers).zip(FIELD_NAMES) {
        *slot = text.parse::<f64>().map_err(|_| SkipReason::BadNumber {
            field,
            text: text.to_string(),
        })?;
    }

    let [x, y, vx, vy, radius] = values;
    // NaN passes through here and is flagged later as a data-quality warning
    if radius <= 0.0 {
        return Err(SkipReason::NonPositiveRadius(radius));
    }
    Ok(Body::new(id, DVec2::new(x, y), DVec2::new(vx, vy), radius))
}

/// Parse asteroid records from any buffered reader
pub fn parse_asteroids<R: BufRead>(reader: R) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();
    let mut seen: HashSet<BodyId> = HashSet::new();

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let line_num = idx + 1;
        let raw = raw?;
        let parsed = match std::str::from_utf8(&raw) {
            Ok(line) => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.is_empty() {
                    continue;
                }
                parse_record(line_num, &parts).and_then(|body| {
                    if seen.insert(body.id) {
                        Ok(body)
                    } else {
                        Err(SkipReason::DuplicateId(body.id))
                    }
                })
            }
            Err(_) => Err(SkipReason::Encoding),
        };
        match parsed {
            Ok(body) => report.bodies.push(body),
            Err(reason) => {
                log::warn!("Skipping asteroid record at line {}: {}", line_num, reason);
                report.skipped.push(SkippedRecord {
                    line: line_num,
                    reason,
                });
            }
        }
    }

    if report.bodies.is_empty() {
        return Err(LoadError::NoValidRecords {
            skipped: report.skipped.len(),
        });
    }
    log::info!(
        "Loaded {} asteroids ({} records skipped)",
        report.bodies.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Load asteroid records from a file
pub fn load_asteroids(path: &Path) -> Result<LoadReport, LoadError> {
    let file = File::open(path)?;
    parse_asteroids(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<LoadReport, LoadError> {
        parse_asteroids(text.as_bytes())
    }

    #[test]
    fn test_six_field_records() {
        let report = parse("1 100 200 1.5 -0.5 20\n2 300 400 -1.0 1.2 15\n").unwrap();
        assert_eq!(report.bodies.len(), 2);
        assert!(report.skipped.is_empty());

        let first = report.bodies[0];
        assert_eq!(first.id, BodyId(1));
        assert_eq!(first.pos, DVec2::new(100.0, 200.0));
        assert_eq!(first.vel, DVec2::new(1.5, -0.5));
        assert_eq!(first.radius, 20.0);
    }

    #[test]
    fn test_five_field_record_uses_line_number() {
        let report = parse("7 0 0 0 0 1\n\n10 10 0 0 2\n").unwrap();
        assert_eq!(report.bodies[1].id, BodyId(3));
        assert_eq!(report.bodies[1].radius, 2.0);
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let text = "\
1 0 0 0 0 1
2 0 0 0
x 0 0 0 0 1
3 0 zero 0 0 1
4 0 0 0 0 -1
1 5 5 0 0 1
5 1 1 0 0 1
";
        let report = parse(text).unwrap();
        let ids: Vec<_> = report.bodies.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![1, 5]);

        let reasons: Vec<_> = report.skipped.iter().map(|s| (s.line, s.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (2, SkipReason::FieldCount(4)),
                (3, SkipReason::BadId("x".to_string())),
                (
                    4,
                    SkipReason::BadNumber {
                        field: "y",
                        text: "zero".to_string()
                    }
                ),
                (5, SkipReason::NonPositiveRadius(-1.0)),
                (6, SkipReason::DuplicateId(BodyId(1))),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut bytes = b"1 0 0 0 0 1\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b' ', b'1', b'\n']);
        bytes.extend_from_slice(b"2 5 5 0 0 1\r\n");

        let report = parse_asteroids(bytes.as_slice()).unwrap();
        let ids: Vec<_> = report.bodies.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(
            report.skipped,
            vec![SkippedRecord {
                line: 2,
                reason: SkipReason::Encoding
            }]
        );
    }

    #[test]
    fn test_non_finite_values_are_kept() {
        let report = parse("1 nan 0 0 0 1\n2 0 0 0 0 inf\n").unwrap();
        assert_eq!(report.bodies.len(), 2);
        assert!(!report.bodies[0].is_measurable());
        assert!(!report.bodies[1].is_measurable());
    }

    #[test]
    fn test_nothing_valid_is_an_error() {
        assert!(matches!(
            parse("garbage\n\n1 2 3\n"),
            Err(LoadError::NoValidRecords { skipped: 2 })
        ));
        assert!(matches!(parse(""), Err(LoadError::NoValidRecords { skipped: 0 })));
    }
}
