//! Surface coordinate extraction.
//!
//! Four-step cascade, most explicit form first:
//! 1. labeled DMS ("Latitude: 47 12' 30\" N")
//! 2. two DMS triples with hemisphere letters in one line or a 3-line window
//! 3. labeled decimal degrees
//! 4. any adjacent decimal pair that lands inside the jurisdiction box
//!
//! Only complete pairs win; a lone latitude is treated as not found. Parse
//! failures and out-of-range values fall through silently, never error.

use once_cell::sync::Lazy;
use regex::Regex;

use wellsift_core::geo::{ND_LAT_MAX, ND_LAT_MIN, ND_LON_MAX, ND_LON_MIN, dms_to_decimal};

use crate::cascade::Cascade;

/// A DMS triple with hemisphere, tolerant of OCR-mangled degree marks.
static DMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\d{1,3})[\s*o]+(\d{1,2})['\s]+(\d{1,2}(?:\.\d+)?)\s*"?\s*([NnSsEeWw])\b"#)
        .unwrap()
});

static LAT_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blat(?:itude)?\b").unwrap());
static LON_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blong(?:itude)?\b").unwrap());

static LAT_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blat(?:itude)?\s*[:=]?\s*([+-]?\d{1,3}\.\d+)").unwrap());
static LON_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blong(?:itude)?\s*[:=]?\s*([+-]?\d{1,3}\.\d+)").unwrap());

static ANY_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]?\d{2,3}\.\d{3,}").unwrap());

#[derive(Debug, Clone, Copy)]
struct DmsTriple {
    degrees: f64,
    minutes: f64,
    seconds: f64,
    hemisphere: char,
}

impl DmsTriple {
    fn from_captures(caps: &regex::Captures) -> Option<DmsTriple> {
        Some(DmsTriple {
            degrees: caps.get(1)?.as_str().parse().ok()?,
            minutes: caps.get(2)?.as_str().parse().ok()?,
            seconds: caps.get(3)?.as_str().parse().ok()?,
            hemisphere: caps.get(4)?.as_str().chars().next()?,
        })
    }

    fn decimal(&self) -> f64 {
        dms_to_decimal(self.degrees, self.minutes, self.seconds, self.hemisphere)
    }

    fn is_latitude(&self) -> bool {
        matches!(self.hemisphere.to_ascii_uppercase(), 'N' | 'S')
    }
}

fn lat_in_range(v: f64) -> bool {
    (ND_LAT_MIN..=ND_LAT_MAX).contains(&v)
}

fn lon_in_range(v: f64) -> bool {
    (ND_LON_MIN..=ND_LON_MAX).contains(&v)
}

/// Pair up two DMS triples as (lat, lon), keyed off hemisphere letters.
fn pair_triples(triples: &[DmsTriple]) -> Option<(f64, f64)> {
    if triples.len() < 2 {
        return None;
    }
    let lat = triples.iter().find(|t| t.is_latitude())?;
    let lon = triples.iter().find(|t| !t.is_latitude())?;
    Some((lat.decimal(), lon.decimal()))
}

fn labeled_dms(text: &str) -> Option<(f64, f64)> {
    let mut lat = None;
    let mut lon = None;
    for line in text.lines() {
        if lat.is_none()
            && let Some(m) = LAT_LABEL.find(line)
            && let Some(caps) = DMS.captures(&line[m.end()..])
            && let Some(triple) = DmsTriple::from_captures(&caps)
            && triple.is_latitude()
        {
            lat = Some(triple.decimal());
        }
        if lon.is_none()
            && let Some(m) = LON_LABEL.find(line)
            && let Some(caps) = DMS.captures(&line[m.end()..])
            && let Some(triple) = DmsTriple::from_captures(&caps)
            && !triple.is_latitude()
        {
            lon = Some(triple.decimal());
        }
    }
    Some((lat?, lon?))
}

fn windowed_dms(text: &str) -> Option<(f64, f64)> {
    let lines: Vec<&str> = text.lines().collect();
    for window in 1..=3usize {
        for start in 0..lines.len().saturating_sub(window - 1) {
            let chunk = lines[start..start + window].join("\n");
            let triples: Vec<DmsTriple> = DMS
                .captures_iter(&chunk)
                .filter_map(|caps| DmsTriple::from_captures(&caps))
                .collect();
            if let Some(pair) = pair_triples(&triples) {
                return Some(pair);
            }
        }
    }
    None
}

fn labeled_decimal(text: &str) -> Option<(f64, f64)> {
    let lat: f64 = LAT_DECIMAL.captures(text)?.get(1)?.as_str().parse().ok()?;
    let lon: f64 = LON_DECIMAL.captures(text)?.get(1)?.as_str().parse().ok()?;
    Some((lat, lon))
}

fn adjacent_decimal_pair(text: &str) -> Option<(f64, f64)> {
    let values: Vec<f64> = ANY_DECIMAL
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    for pair in values.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if lat_in_range(a) && lon_in_range(b) {
            return Some((a, b));
        }
        if lat_in_range(b) && lon_in_range(a) {
            return Some((b, a));
        }
    }
    None
}

static COORD_CASCADE: Lazy<Cascade<(f64, f64)>> = Lazy::new(|| {
    Cascade::new("coordinates")
        .rule("labeled_dms", labeled_dms)
        .rule("windowed_dms_pair", windowed_dms)
        .rule("labeled_decimal", labeled_decimal)
        .rule("adjacent_decimal_pair", adjacent_decimal_pair)
});

/// Extract a (latitude, longitude) pair, or `None` when no rule produces
/// a complete pair.
pub fn extract_coordinates(text: &str) -> Option<(f64, f64)> {
    COORD_CASCADE.extract(text)
}
