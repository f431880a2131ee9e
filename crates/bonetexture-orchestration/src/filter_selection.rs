//! Filter selection logic.

use std::collections::BTreeSet;

use bonetexture_core::features::{FilterKind, UnknownFilterKind};

/// Parse a comma-separated list of filter kinds, or `all`.
///
/// An empty list yields an empty selection; the orchestrator rejects it.
pub fn parse_selection(spec: &str) -> Result<BTreeSet<FilterKind>, UnknownFilterKind> {
    if spec.trim().eq_ignore_ascii_case("all") {
        return Ok(FilterKind::ALL.into_iter().collect());
    }
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<FilterKind>)
        .collect()
}
