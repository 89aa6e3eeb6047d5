//! Per-field extraction cascades.
//!
//! Completion report layouts vary wildly between operators and decades of
//! form revisions, and OCR adds its own noise. Each field gets a ranked
//! chain of patterns, from the most specific labeled form down to coarse
//! positional fallbacks. Candidate values are validated before they win;
//! a candidate that fails validation falls through to the next rule.
//!
//! Labeled rules match the label itself and take the rest of the line as
//! the value. Matching the label (rather than capturing the value) keeps
//! greedy optional label suffixes like "and Number" from bleeding into
//! the value when the line is a bare column header.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cascade::Cascade;

/// Everything the field extractor produces for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WellFields {
    pub api: Option<String>,
    pub well_name: Option<String>,
    pub well_number: Option<String>,
    pub operator: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
}

pub fn extract_well_fields(text: &str) -> WellFields {
    WellFields {
        api: extract_api(text),
        well_name: extract_well_name(text),
        well_number: extract_well_number(text),
        operator: extract_operator(text),
        county: extract_county(text),
        state: extract_state(text),
        address: extract_address(text),
    }
}

/// The text after the label on the first line where `label` matches,
/// or `None` if no line carries a non-empty remainder.
fn labeled_same_line<'a>(label: &Regex, text: &'a str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let m = label.find(line)?;
        let rest = line[m.end()..].trim();
        (!rest.is_empty()).then_some(rest)
    })
}

/// The first non-empty line after a line that is only the label.
fn labeled_next_line<'a>(label: &Regex, text: &'a str) -> Option<&'a str> {
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if let Some(m) = label.find(line)
            && line[m.end()..].trim().is_empty()
            && line[..m.start()].trim().is_empty()
        {
            return lines.map(str::trim).find(|l| !l.is_empty());
        }
    }
    None
}

// ── API number ──────────────────────────────────────────────────────────

/// Reduce a raw API candidate to canonical `DD-DDD-DDDDD` form.
/// Anything that does not normalize to exactly 10 digits is discarded.
fn normalize_api(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 10 {
        return None;
    }
    Some(format!(
        "{}-{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..10]
    ))
}

static API_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bAPI\s*(?:#|No\b\.?|Number\b)?\s*[:=]?\s*([0-9][0-9 .\-]{7,18})").unwrap()
});
static API_ND_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b33[- ]?\d{3}[- ]?\d{5}\b").unwrap());
static API_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{10}\b").unwrap());

static API_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("api")
        .rule("labeled", |text| {
            API_LABELED
                .captures_iter(text)
                .find_map(|caps| normalize_api(caps.get(1)?.as_str()))
        })
        .rule("nd_format", |text| {
            API_ND_FORMAT
                .find(text)
                .and_then(|m| normalize_api(m.as_str()))
        })
        .rule("bare_ten_digits", |text| {
            API_BARE.find(text).and_then(|m| normalize_api(m.as_str()))
        })
});

/// Extract the API well identifier, normalized to `DD-DDD-DDDDD`.
pub fn extract_api(text: &str) -> Option<String> {
    API_CASCADE.extract(text)
}

// ── Well name ───────────────────────────────────────────────────────────

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(do not|instructions|certif|industrial commission|oil and gas|completion report|production|state of|form\s|page \d|sfn\s*\d)",
    )
    .unwrap()
});

static NAME_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwell\s*name(?:\s*(?:and|&)\s*(?:number\b|no\b\.?))?\s*[:=]?").unwrap()
});

fn plausible_name(candidate: &str) -> Option<String> {
    let candidate = candidate.trim().trim_matches(|c| c == ':' || c == '=');
    let non_space = candidate.chars().filter(|c| !c.is_whitespace()).count();
    if non_space < 3 || candidate.len() >= 120 {
        return None;
    }
    if !candidate.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if BOILERPLATE.is_match(candidate) {
        return None;
    }
    Some(candidate.to_string())
}

static NAME_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("well_name")
        .rule("labeled_same_line", |text| {
            labeled_same_line(&NAME_LABEL, text).and_then(plausible_name)
        })
        .rule("labeled_next_line", |text| {
            labeled_next_line(&NAME_LABEL, text).and_then(plausible_name)
        })
        .rule("first_mixed_line", |text| {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.contains(':'))
                .filter(|line| {
                    line.chars().any(|c| c.is_ascii_alphabetic())
                        && line.chars().any(|c| c.is_ascii_digit())
                })
                .find_map(plausible_name)
        })
});

pub fn extract_well_name(text: &str) -> Option<String> {
    NAME_CASCADE.extract(text)
}

// ── Well number ─────────────────────────────────────────────────────────

static NUMBER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwell\s*(?:no\b\.?|number\b|#)\s*[:=]?").unwrap());

pub fn extract_well_number(text: &str) -> Option<String> {
    let candidate = labeled_same_line(&NUMBER_LABEL, text)?;
    (candidate.len() <= 40).then(|| candidate.to_string())
}

// ── Operator ────────────────────────────────────────────────────────────

static OPERATOR_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*operator(?:\s+name\b)?\s*[:=]?").unwrap());

fn plausible_operator(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.len() < 2 || candidate.len() > 120 {
        return None;
    }
    if !candidate.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(candidate.to_string())
}

static OPERATOR_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("operator")
        .rule("labeled_same_line", |text| {
            labeled_same_line(&OPERATOR_LABEL, text).and_then(plausible_operator)
        })
        .rule("labeled_next_line", |text| {
            labeled_next_line(&OPERATOR_LABEL, text).and_then(plausible_operator)
        })
});

pub fn extract_operator(text: &str) -> Option<String> {
    OPERATOR_CASCADE.extract(text)
}

// ── County / state ──────────────────────────────────────────────────────

static COUNTY_LABELED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcounty\s*[:=]\s*([A-Za-z][A-Za-z .'-]{1,30})").unwrap());
static COUNTY_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z.'-]+(?:\s[A-Z][A-Za-z.'-]+)?)\s+County\b").unwrap()
});

/// Cut a labeled capture at the next inline label, since forms often pack
/// several fields on one line ("County: Williams State: ND").
fn cut_at_next_label(candidate: &str) -> &str {
    static NEXT_LABEL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\s+(state|county|zip|field|township|range)\b").unwrap());
    match NEXT_LABEL.find(candidate) {
        Some(m) => &candidate[..m.start()],
        None => candidate,
    }
}

static COUNTY_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("county")
        .rule("labeled", |text| {
            let caps = COUNTY_LABELED.captures(text)?;
            let candidate = cut_at_next_label(caps.get(1)?.as_str()).trim();
            (!candidate.is_empty()).then(|| candidate.to_string())
        })
        .rule("name_before_county", |text| {
            COUNTY_SUFFIX
                .captures(text)
                .map(|caps| caps[1].trim().to_string())
        })
});

pub fn extract_county(text: &str) -> Option<String> {
    COUNTY_CASCADE.extract(text)
}

static STATE_LABELED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstate\s*[:=]\s*([A-Za-z][A-Za-z ]{1,20})").unwrap());
static ND_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnorth\s+dakota\b").unwrap());

static STATE_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("state")
        .rule("labeled", |text| {
            let caps = STATE_LABELED.captures(text)?;
            let candidate = cut_at_next_label(caps.get(1)?.as_str()).trim();
            (!candidate.is_empty()).then(|| candidate.to_string())
        })
        .rule("north_dakota_literal", |text| {
            ND_LITERAL
                .is_match(text)
                .then(|| "North Dakota".to_string())
        })
});

pub fn extract_state(text: &str) -> Option<String> {
    STATE_CASCADE.extract(text)
}

// ── Address ─────────────────────────────────────────────────────────────

/// Hard cap carried into the schema; longer values are cut, not rejected.
const MAX_ADDRESS_LEN: usize = 500;

static ADDRESS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:mailing\s+)?address\s*[:=]?").unwrap());
static STREET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+[A-Za-z]").unwrap());
static CITY_STATE_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z .]+,?\s+[A-Z]{2}\s+\d{5}(?:-\d{4})?$").unwrap());

fn truncate_address(mut address: String) -> String {
    if address.len() > MAX_ADDRESS_LEN {
        // Normalized text is ASCII, but stay boundary-safe anyway.
        let mut cut = MAX_ADDRESS_LEN;
        while !address.is_char_boundary(cut) {
            cut -= 1;
        }
        address.truncate(cut);
    }
    address
}

static ADDRESS_CASCADE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("address")
        .rule("labeled_same_line", |text| {
            let candidate = labeled_same_line(&ADDRESS_LABEL, text)?;
            (candidate.len() >= 5).then(|| candidate.to_string())
        })
        .rule("labeled_next_line", |text| {
            let candidate = labeled_next_line(&ADDRESS_LABEL, text)?;
            (candidate.len() >= 5).then(|| candidate.to_string())
        })
        .rule("street_block", |text| {
            let lines: Vec<&str> = text.lines().map(str::trim).collect();
            for (i, line) in lines.iter().enumerate() {
                if !STREET_LINE.is_match(line) {
                    continue;
                }
                // City/state/zip must follow within the next three lines.
                for j in (i + 1)..lines.len().min(i + 4) {
                    if CITY_STATE_ZIP.is_match(lines[j]) {
                        let block: Vec<&str> = lines[i..=j]
                            .iter()
                            .copied()
                            .filter(|l| !l.is_empty())
                            .collect();
                        return Some(block.join(", "));
                    }
                }
            }
            None
        })
});

pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS_CASCADE.extract(text).map(truncate_address)
}
