//! Return-parameter file parsing.
//!
//! Filters invoked with `--returnparameterfile <path>` write their output
//! parameters there as `name = value` lines.

use std::collections::BTreeMap;

/// Parse `name = value` lines. Blank lines, `#` comments and lines without
/// `=` are skipped; a repeated name keeps its last value.
///
/// ```
/// use bonetexture_orchestration::return_params::parse_return_parameters;
///
/// let params = parse_return_parameters("outputVector = 1,2,3\n# done\n");
/// assert_eq!(params["outputVector"], "1,2,3");
/// ```
#[must_use]
pub fn parse_return_parameters(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
