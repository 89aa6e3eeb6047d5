//! Quality-control classification of extracted well records.
//!
//! A fixed-order decision list: the first matching rule assigns the
//! status. The order is part of the contract; reordering changes results
//! for records that trip more than one rule.

use crate::geo::within_north_dakota;

/// QC verdict for a well record. Recomputed in full on every ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QcStatus {
    Valid,
    #[default]
    NeedsReview,
    /// Missing identity; the record is rejected and never persisted.
    Invalid,
}

impl QcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QcStatus::Valid => "valid",
            QcStatus::NeedsReview => "needs_review",
            QcStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<QcStatus> {
        match s {
            "valid" => Some(QcStatus::Valid),
            "needs_review" => Some(QcStatus::NeedsReview),
            "invalid" => Some(QcStatus::Invalid),
            _ => None,
        }
    }
}

/// The fields QC looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct QcInput<'a> {
    pub api: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub well_name: Option<&'a str>,
}

/// Classify a record. Rules fire in order:
/// 1. no API number: invalid
/// 2. missing latitude or longitude: needs_review
/// 3. coordinates outside the jurisdiction: needs_review
/// 4. well name missing or under 3 non-space characters: needs_review
/// 5. otherwise: valid
pub fn classify(input: &QcInput) -> QcStatus {
    if input.api.is_none() {
        return QcStatus::Invalid;
    }

    let (latitude, longitude) = match (input.latitude, input.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return QcStatus::NeedsReview,
    };

    if !within_north_dakota(latitude, longitude) {
        return QcStatus::NeedsReview;
    }

    let name_chars = input
        .well_name
        .map(|n| n.chars().filter(|c| !c.is_whitespace()).count())
        .unwrap_or(0);
    if name_chars < 3 {
        return QcStatus::NeedsReview;
    }

    QcStatus::Valid
}
