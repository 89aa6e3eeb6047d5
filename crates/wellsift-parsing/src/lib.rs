//! Heuristic extraction from completion report text.
//!
//! Every extractor is a ranked cascade: patterns are tried in order and
//! the first semantically valid value wins. Extraction never fails; a
//! field that cannot be found is simply absent. Input text is expected to
//! be normalized via [`normalize_text`] first (extractors are line-based).

pub mod cascade;
pub mod coords;
pub mod fields;
pub mod stimulation;
pub mod text;

pub use cascade::Cascade;
pub use coords::extract_coordinates;
pub use fields::{
    WellFields, extract_address, extract_api, extract_county, extract_operator, extract_state,
    extract_well_fields, extract_well_name, extract_well_number,
};
pub use stimulation::{
    ExtendedTreatment, StimRow, merge_stimulations, parse_stimulations, stimulation_signal,
};
pub use text::normalize_text;
