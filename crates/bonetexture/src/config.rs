//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// BoneTexture-rs: bone texture features from a scan and a region mask.
#[derive(Parser, Debug)]
#[command(name = "bonetexture", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Scan volume descriptor (JSON).
    #[arg(long, env = "BONETEXTURE_SCAN")]
    pub scan: Option<PathBuf>,

    /// Region mask descriptor (JSON).
    #[arg(long, env = "BONETEXTURE_MASK")]
    pub mask: Option<PathBuf>,

    /// Feature families to compute: glcm, glrlm, bm (comma-separated), or all.
    #[arg(long, default_value = "all")]
    pub features: String,

    /// Parameter file (JSON) overriding the filter defaults.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Derive bin count and intensity range from the region before launching.
    #[arg(long)]
    pub suggest: bool,

    /// Print the suggested parameters and exit.
    #[arg(long)]
    pub suggest_only: bool,

    /// Compute per-voxel feature maps into this directory instead of feature vectors.
    #[arg(long, value_name = "DIR")]
    pub feature_maps: Option<PathBuf>,

    /// Directory holding the filter executables (defaults to PATH lookup).
    #[arg(long, value_name = "DIR", env = "BONETEXTURE_FILTER_DIR")]
    pub filter_dir: Option<PathBuf>,

    /// How long to wait for job outcomes (e.g. "30s", "5m"); 0 waits forever.
    #[arg(long, default_value = "10m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Write the feature table to this CSV file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (only the feature table).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Wait limit, `None` when waiting forever.
    #[must_use]
    pub fn wait_limit(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}

/// Parse a duration string like "5m", "1h", "30s", "500ms".
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("invalid duration: {s:?}");
    let number = |digits: &str| digits.parse::<u64>().map_err(|_| invalid());
    let scaled = |digits: &str, unit: u64| {
        number(digits)?.checked_mul(unit).ok_or_else(invalid)
    };
    if let Some(ms) = s.strip_suffix("ms") {
        Ok(Duration::from_millis(number(ms)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        Ok(Duration::from_secs(scaled(mins, 60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        Ok(Duration::from_secs(scaled(hours, 3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(secs)?))
    } else {
        Ok(Duration::from_secs(number(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("45"), Ok(Duration::from_secs(45)));
    }

    #[test]
    fn parse_duration_ms() {
        assert_eq!(parse_duration("1ms"), Ok(Duration::from_millis(1)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("307445734561825861m").is_err());
        assert!(parse_duration("5124095576030432h").is_err());
    }

    #[test]
    fn defaults() {
        let config = AppConfig::try_parse_from(["bonetexture", "--scan", "scan.json"]).unwrap();
        assert_eq!(config.features, "all");
        assert_eq!(config.wait_limit(), Some(Duration::from_secs(600)));
        assert!(config.mask.is_none());
        assert!(!config.suggest);
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let config = AppConfig::try_parse_from(["bonetexture", "--timeout", "0"]).unwrap();
        assert_eq!(config.wait_limit(), None);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(AppConfig::try_parse_from(["bonetexture", "-v", "-q"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        AppConfig::command().debug_assert();
    }
}
