//! Stimulation section parsing.
//!
//! The section is located by heading variants, bounded by the next known
//! section marker (or a fixed span when none follows). Tabular rows are
//! parsed with one composite pattern; when that matches nothing, a coarse
//! column-split fallback runs over date-bearing lines. Document-level
//! extended treatment fields are scanned independently and merged onto
//! every row at persistence time.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use wellsift_core::StimulationRecord;

/// One tabular stimulation row, before extended fields are merged in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimRow {
    pub date_stimulated: Option<NaiveDate>,
    pub stimulated_formation: Option<String>,
    pub top_ft: Option<f64>,
    pub bottom_ft: Option<f64>,
    pub stages: Option<u32>,
    pub volume: Option<f64>,
    pub volume_units: Option<String>,
    pub notes: Option<String>,
}

/// Document-level treatment fields, scanned independently of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedTreatment {
    pub treatment_type: Option<String>,
    pub lbs_proppant: Option<f64>,
    pub acid_percent: Option<f64>,
    pub treatment_pressure: Option<f64>,
    pub max_treatment_rate: Option<f64>,
    pub details_text: Option<String>,
}

impl ExtendedTreatment {
    /// Whether the extras alone justify a stimulation record.
    /// Acid percent and detail lines by themselves do not.
    pub fn has_any(&self) -> bool {
        self.treatment_type.is_some()
            || self.lbs_proppant.is_some()
            || self.treatment_pressure.is_some()
            || self.max_treatment_rate.is_some()
    }
}

// ── Section location ────────────────────────────────────────────────────

/// Heading variants in priority order.
const HEADINGS: &[&str] = &[
    "Well Specific Stimulations",
    "Stimulation Data",
    "Stimulations",
    "Type Treatment",
];

/// Markers that end the stimulation section when they follow the heading.
const END_MARKERS: &[&str] = &[
    "Casing Record",
    "Tubing Record",
    "Liner Record",
    "Perforation Record",
    "Formation Tops",
    "Well Specific Production",
];

/// Span used when no end marker follows the heading.
const MAX_SECTION_SPAN: usize = 2000;

static HEADING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    HEADINGS
        .iter()
        .map(|h| {
            let words = h.split_whitespace().collect::<Vec<_>>().join(r"\s+");
            Regex::new(&format!(r"(?i)\b{words}\b")).unwrap()
        })
        .collect()
});

static END_MARKER_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    END_MARKERS
        .iter()
        .map(|m| {
            let words = m.split_whitespace().collect::<Vec<_>>().join(r"\s+");
            Regex::new(&format!(r"(?i)\b{words}\b")).unwrap()
        })
        .collect()
});

/// Locate the stimulation section: from the heading up to the nearest end
/// marker, or a fixed span. The heading itself is kept in the slice; the
/// "Type Treatment" heading variant doubles as a labeled field.
fn locate_section(text: &str) -> Option<&str> {
    let heading = HEADING_RES.iter().find_map(|re| re.find(text))?;
    let rest = &text[heading.start()..];
    let after_heading = heading.end() - heading.start();

    let end = END_MARKER_RES
        .iter()
        .filter_map(|re| re.find(&rest[after_heading..]))
        .map(|m| after_heading + m.start())
        .min()
        .unwrap_or(MAX_SECTION_SPAN)
        .min(rest.len());

    // Stay on a char boundary when the span cut lands mid-char.
    let mut end = end;
    while !rest.is_char_boundary(end) {
        end -= 1;
    }
    Some(&rest[..end])
}

// ── Row parsing ─────────────────────────────────────────────────────────

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());

/// Combined column header row; parsing starts after it when present.
static TABLE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date\s+stimulated\b.*\bformation\b").unwrap());

/// Composite row: date, formation, top, bottom, stages, volume, units.
/// Thousands separators tolerated in the numeric columns.
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(\d{1,2}/\d{1,2}/\d{2,4})\s+([A-Za-z][A-Za-z /&.'-]*?)\s+([\d,]+)\s+([\d,]+)\s+(\d{1,3})\s+([\d,]+(?:\.\d+)?)\s+([A-Za-z]+)\s*$",
    )
    .unwrap()
});

fn parse_date(token: &str) -> Option<NaiveDate> {
    for format in ["%m/%d/%Y", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(token, format) {
            return Some(date);
        }
    }
    None
}

/// Permissive numeric coercion: strip everything but digits and dots.
fn coerce_f64(token: &str) -> Option<f64> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn coerce_u32(token: &str) -> Option<u32> {
    let cleaned: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn row_from_captures(caps: &regex::Captures) -> StimRow {
    StimRow {
        date_stimulated: caps.get(1).and_then(|m| parse_date(m.as_str())),
        stimulated_formation: caps.get(2).map(|m| m.as_str().trim().to_string()),
        top_ft: caps.get(3).and_then(|m| coerce_f64(m.as_str())),
        bottom_ft: caps.get(4).and_then(|m| coerce_f64(m.as_str())),
        stages: caps.get(5).and_then(|m| coerce_u32(m.as_str())),
        volume: caps.get(6).and_then(|m| coerce_f64(m.as_str())),
        volume_units: caps.get(7).map(|m| m.as_str().to_string()),
        notes: None,
    }
}

/// Coarse fallback: split date-bearing lines on multi-space runs and map
/// columns positionally.
fn fallback_rows(section: &str) -> Vec<StimRow> {
    static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

    let mut rows = Vec::new();
    for line in section.lines() {
        if !DATE_TOKEN.is_match(line) || TABLE_HEADER.is_match(line) {
            continue;
        }
        let columns: Vec<&str> = MULTI_SPACE
            .split(line.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if columns.len() < 2 {
            continue;
        }
        let row = StimRow {
            date_stimulated: columns.first().and_then(|c| {
                DATE_TOKEN
                    .find(c)
                    .and_then(|m| parse_date(m.as_str()))
            }),
            stimulated_formation: columns.get(1).map(|c| c.trim().to_string()),
            top_ft: columns.get(2).and_then(|c| coerce_f64(c)),
            bottom_ft: columns.get(3).and_then(|c| coerce_f64(c)),
            stages: columns.get(4).and_then(|c| coerce_u32(c)),
            volume: columns.get(5).and_then(|c| coerce_f64(c)),
            volume_units: columns.get(6).map(|c| c.trim().to_string()),
            notes: None,
        };
        if row.date_stimulated.is_some() {
            rows.push(row);
        }
    }
    rows
}

/// Digit-bearing lines in the section that failed the row pattern; kept as
/// shared notes on every row.
fn collect_notes(section: &str) -> Option<String> {
    static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

    let notes: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| HAS_DIGIT.is_match(line))
        .filter(|line| !ROW.is_match(line))
        .filter(|line| !TABLE_HEADER.is_match(line))
        .collect();
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

// ── Extended fields ─────────────────────────────────────────────────────

static TREATMENT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^.*?\b(?:type\s+treatment|treatment\s+type)\s*[:=]?\s*([A-Za-z][^\n]*)$")
        .unwrap()
});
static LBS_PROPPANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:lbs\.?\s+proppant|proppant\s+(?:lbs\.?|amount))\s*[:=]?\s*([\d,]+(?:\.\d+)?)").unwrap()
});
static ACID_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bacid\s*(?:%|percent)\s*[:=]?\s*([\d.]+)").unwrap());
static TREATMENT_PRESSURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:maximum\s+)?treatment\s+pressure\s*(?:\(psi\))?\s*[:=]?\s*([\d,]+(?:\.\d+)?)")
        .unwrap()
});
static MAX_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmax(?:imum)?\s+treatment\s+rate\s*(?:\(bbls?/min\))?\s*[:=]?\s*([\d,]+(?:\.\d+)?)")
        .unwrap()
});
static MESH_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b\d+/\d+\s+mesh\b").unwrap());
static LABELED_NUMERIC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Za-z][A-Za-z .]{2,40}:\s*[\d,]+(?:\.\d+)?\s*$").unwrap());

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| coerce_f64(caps.get(1)?.as_str()))
}

/// Scan for document-level treatment fields. Runs over the stimulation
/// section when one exists, the whole document otherwise.
fn extract_extended(scope: &str) -> ExtendedTreatment {
    let treatment_type = TREATMENT_TYPE
        .captures(scope)
        .map(|caps| caps[1].trim().to_string())
        .filter(|t| !t.is_empty());

    let details: Vec<&str> = scope
        .lines()
        .map(str::trim)
        .filter(|line| MESH_LINE.is_match(line) || LABELED_NUMERIC_LINE.is_match(line))
        .collect();

    ExtendedTreatment {
        treatment_type,
        lbs_proppant: capture_f64(&LBS_PROPPANT, scope),
        acid_percent: capture_f64(&ACID_PERCENT, scope),
        treatment_pressure: capture_f64(&TREATMENT_PRESSURE, scope),
        max_treatment_rate: capture_f64(&MAX_RATE, scope),
        details_text: if details.is_empty() {
            None
        } else {
            Some(details.join("; "))
        },
    }
}

// ── Entry points ────────────────────────────────────────────────────────

/// Parse stimulation rows and extended fields from normalized text.
pub fn parse_stimulations(text: &str) -> (Vec<StimRow>, ExtendedTreatment) {
    let section = locate_section(text);
    let ext = extract_extended(section.unwrap_or(text));

    let section = match section {
        Some(s) => s,
        None => return (Vec::new(), ext),
    };

    // Skip to just past the column header when the table carries one.
    let body = match TABLE_HEADER.find(section) {
        Some(m) => &section[m.end()..],
        None => section,
    };

    let mut rows: Vec<StimRow> = ROW.captures_iter(body).map(|c| row_from_captures(&c)).collect();

    if rows.is_empty() {
        rows = fallback_rows(body);
        tracing::debug!(rows = rows.len(), "composite row pattern missed, used column-split fallback");
    } else if let Some(notes) = collect_notes(body) {
        for row in &mut rows {
            row.notes = Some(notes.clone());
        }
    }

    (rows, ext)
}

/// Whether the text shows any stimulation presence at all; used by the
/// acquisition early-stop probe.
pub fn stimulation_signal(text: &str) -> bool {
    let (rows, ext) = parse_stimulations(text);
    !rows.is_empty() || ext.has_any()
}

/// Merge extended fields onto every row, producing the persisted shape.
///
/// No rows and no meaningful extras: nothing. Extras without rows: exactly
/// one synthetic record carrying them.
pub fn merge_stimulations(rows: Vec<StimRow>, ext: &ExtendedTreatment) -> Vec<StimulationRecord> {
    if rows.is_empty() && !ext.has_any() {
        return Vec::new();
    }

    let rows = if rows.is_empty() {
        vec![StimRow::default()]
    } else {
        rows
    };

    rows.into_iter()
        .map(|row| StimulationRecord {
            date_stimulated: row.date_stimulated,
            stimulated_formation: row.stimulated_formation,
            top_ft: row.top_ft,
            bottom_ft: row.bottom_ft,
            stages: row.stages,
            volume: row.volume,
            volume_units: row.volume_units,
            treatment_type: ext.treatment_type.clone(),
            lbs_proppant: ext.lbs_proppant,
            acid_percent: ext.acid_percent,
            treatment_pressure: ext.treatment_pressure,
            max_treatment_rate: ext.max_treatment_rate,
            additional_info: row.notes.or_else(|| ext.details_text.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = "\
Well Specific Stimulations
Date Stimulated  Stimulated Formation  Top (Ft)  Bottom (Ft)  Stages  Volume  Volume Units
06/14/2013 Bakken 10496 20421 30 59,470 Barrels
Type Treatment: Sand Frac
Lbs Proppant: 4,177,194
Maximum Treatment Pressure (PSI): 8,491
Maximum Treatment Rate (BBLS/Min): 39.5
Casing Record
7 inch casing set at 10496
";

    #[test]
    fn composite_row_parses() {
        let (rows, _) = parse_stimulations(SECTION);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(
            row.date_stimulated,
            Some(NaiveDate::from_ymd_opt(2013, 6, 14).unwrap())
        );
        assert_eq!(row.stimulated_formation.as_deref(), Some("Bakken"));
        assert_eq!(row.top_ft, Some(10496.0));
        assert_eq!(row.bottom_ft, Some(20421.0));
        assert_eq!(row.stages, Some(30));
        assert_eq!(row.volume, Some(59470.0));
        assert_eq!(row.volume_units.as_deref(), Some("Barrels"));
    }

    #[test]
    fn extended_fields_parse() {
        let (_, ext) = parse_stimulations(SECTION);
        assert_eq!(ext.treatment_type.as_deref(), Some("Sand Frac"));
        assert_eq!(ext.lbs_proppant, Some(4_177_194.0));
        assert_eq!(ext.treatment_pressure, Some(8491.0));
        assert_eq!(ext.max_treatment_rate, Some(39.5));
    }

    #[test]
    fn section_ends_at_next_marker() {
        // The casing line lives past the end marker and must not leak in
        // as a note or fallback row.
        let (rows, _) = parse_stimulations(SECTION);
        assert!(
            rows[0]
                .notes
                .as_deref()
                .is_none_or(|n| !n.contains("casing"))
        );
    }

    #[test]
    fn fallback_splits_on_multi_space() {
        let text = "\
Stimulation Data
06/14/2013  Three Forks  9800  19750  25  41,200  Barrels extra
";
        // Trailing junk defeats the composite pattern; the fallback maps
        // columns positionally.
        let (rows, _) = parse_stimulations(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stimulated_formation.as_deref(), Some("Three Forks"));
        assert_eq!(rows[0].top_ft, Some(9800.0));
        assert_eq!(rows[0].stages, Some(25));
    }

    #[test]
    fn no_section_no_rows() {
        let (rows, ext) = parse_stimulations("nothing relevant here\n");
        assert!(rows.is_empty());
        assert!(!ext.has_any());
    }

    #[test]
    fn extended_scanned_without_section() {
        let text = "Lbs Proppant: 2,000,000\nMaximum Treatment Pressure (PSI): 7,500\n";
        let (rows, ext) = parse_stimulations(text);
        assert!(rows.is_empty());
        assert_eq!(ext.lbs_proppant, Some(2_000_000.0));
        assert_eq!(ext.treatment_pressure, Some(7500.0));
    }

    #[test]
    fn merge_attaches_extras_to_every_row() {
        let rows = vec![
            StimRow {
                top_ft: Some(100.0),
                ..Default::default()
            },
            StimRow {
                top_ft: Some(200.0),
                ..Default::default()
            },
        ];
        let ext = ExtendedTreatment {
            treatment_type: Some("Sand Frac".into()),
            lbs_proppant: Some(1000.0),
            ..Default::default()
        };
        let merged = merge_stimulations(rows, &ext);
        assert_eq!(merged.len(), 2);
        for record in &merged {
            assert_eq!(record.treatment_type.as_deref(), Some("Sand Frac"));
            assert_eq!(record.lbs_proppant, Some(1000.0));
        }
    }

    #[test]
    fn extras_only_produce_synthetic_row() {
        let ext = ExtendedTreatment {
            treatment_pressure: Some(8000.0),
            ..Default::default()
        };
        let merged = merge_stimulations(Vec::new(), &ext);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].treatment_pressure, Some(8000.0));
        assert_eq!(merged[0].date_stimulated, None);
    }

    #[test]
    fn nothing_at_all_produces_nothing() {
        assert!(merge_stimulations(Vec::new(), &ExtendedTreatment::default()).is_empty());
    }

    #[test]
    fn acid_percent_alone_is_not_a_signal() {
        let ext = ExtendedTreatment {
            acid_percent: Some(15.0),
            ..Default::default()
        };
        assert!(!ext.has_any());
        assert!(merge_stimulations(Vec::new(), &ext).is_empty());
    }

    #[test]
    fn notes_attach_to_parsed_rows() {
        let text = "\
Well Specific Stimulations
06/14/2013 Bakken 10496 20421 30 59,470 Barrels
acidized with 500 gal 15% HCl
";
        let (rows, _) = parse_stimulations(text);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].notes.as_deref().unwrap().contains("acidized"));
    }

    #[test]
    fn two_digit_year_parses() {
        assert_eq!(
            parse_date("6/14/13"),
            Some(NaiveDate::from_ymd_opt(2013, 6, 14).unwrap())
        );
    }
}
