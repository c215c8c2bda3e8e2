//! Pipeline configuration.

use projection::LccParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{KcellError, KcellResult};

/// Default minimum mean NOx for a stack to be considered an EGU (mol/h).
pub const DEFAULT_MIN_NOX: f64 = 1000.0;

/// Default match radius between a stack and a substation (m).
pub const DEFAULT_MAX_DIST: f64 = 750.0;

/// Configuration for a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stacks with mean NOx at or below this are dropped (mol/h)
    pub min_nox: f64,

    /// Stacks farther than this from every substation are dropped (m)
    pub max_dist: f64,

    /// Column separator accepted in the reference file
    pub separator: Separator,

    /// How repeated source coordinates are collapsed
    pub dedup_mode: DedupMode,

    /// Planar projection of the point-source and reference coordinates
    pub projection: LccParams,

    /// Output file locations
    pub output: OutputLayout,

    /// Write a KML placemark file next to the group files
    pub write_kml: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_nox: DEFAULT_MIN_NOX,
            max_dist: DEFAULT_MAX_DIST,
            separator: Separator::default(),
            dedup_mode: DedupMode::default(),
            projection: LccParams::default(),
            output: OutputLayout::default(),
            write_kml: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> KcellResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| KcellError::read(path, e))?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> KcellResult<()> {
        if !self.min_nox.is_finite() || self.min_nox < 0.0 {
            return Err(KcellError::Config(format!(
                "min_nox must be >= 0, got {}",
                self.min_nox
            )));
        }
        if !self.max_dist.is_finite() || self.max_dist <= 0.0 {
            return Err(KcellError::Config(format!(
                "max_dist must be > 0, got {}",
                self.max_dist
            )));
        }
        if self.output.prefix.is_empty() {
            return Err(KcellError::Config("output prefix must not be empty".into()));
        }
        Ok(())
    }
}

/// Where output artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub dir: PathBuf,
    /// Group files are named `{prefix}{n}.out`
    pub prefix: String,
    pub kml_name: String,
    pub diag_name: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "kcell".to_string(),
            kml_name: "points.kml".to_string(),
            diag_name: "kcell_prep.diag".to_string(),
        }
    }
}

impl OutputLayout {
    pub fn group_path(&self, number: usize) -> PathBuf {
        self.dir.join(format!("{}{}.out", self.prefix, number))
    }

    pub fn kml_path(&self) -> PathBuf {
        self.dir.join(&self.kml_name)
    }

    pub fn diag_path(&self) -> PathBuf {
        self.dir.join(&self.diag_name)
    }
}

/// Column separator of the reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    /// A single space
    Space,
    /// A single comma
    Comma,
    /// A single space or comma
    #[default]
    Either,
}

impl Separator {
    /// Regex character class for this separator.
    pub fn pattern(&self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::Comma => ",",
            Separator::Either => "[ ,]",
        }
    }
}

impl FromStr for Separator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "space" | " " => Ok(Separator::Space),
            "comma" | "," => Ok(Separator::Comma),
            "either" | "any" => Ok(Separator::Either),
            other => Err(format!(
                "unknown separator '{}', expected space, comma or either",
                other
            )),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Separator::Space => "space",
            Separator::Comma => "comma",
            Separator::Either => "space or comma",
        };
        f.write_str(name)
    }
}

/// Duplicate-source handling during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Skip a source only when it repeats the previously accepted one
    #[default]
    Adjacent,
    /// Skip a source whose coordinates were accepted at any earlier point
    FullHistory,
}

impl FromStr for DedupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "adjacent" => Ok(DedupMode::Adjacent),
            "full_history" | "full" => Ok(DedupMode::FullHistory),
            other => Err(format!(
                "unknown dedup mode '{}', expected adjacent or full-history",
                other
            )),
        }
    }
}

impl fmt::Display for DedupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupMode::Adjacent => f.write_str("adjacent"),
            DedupMode::FullHistory => f.write_str("full-history"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_nox, 1000.0);
        assert_eq!(config.max_dist, 750.0);
        assert_eq!(config.dedup_mode, DedupMode::Adjacent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kcell.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            b"min_nox: 250.0\nseparator: comma\ndedup_mode: full_history\nprojection:\n  lat_0: 38.5\noutput:\n  prefix: egu\n",
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.min_nox, 250.0);
        assert_eq!(config.max_dist, DEFAULT_MAX_DIST);
        assert_eq!(config.separator, Separator::Comma);
        assert_eq!(config.dedup_mode, DedupMode::FullHistory);
        assert_eq!(config.projection.lat_0, 38.5);
        assert_eq!(config.projection.lat_1, 33.0);
        assert_eq!(config.output.prefix, "egu");
        assert_eq!(config.output.kml_name, "points.kml");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, KcellError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = PipelineConfig {
            max_dist: 0.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            min_nox: -1.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("comma".parse::<Separator>(), Ok(Separator::Comma));
        assert_eq!("SPACE".parse::<Separator>(), Ok(Separator::Space));
        assert!("tab".parse::<Separator>().is_err());
        assert_eq!(
            "full-history".parse::<DedupMode>(),
            Ok(DedupMode::FullHistory)
        );
        assert!("none".parse::<DedupMode>().is_err());
    }

    #[test]
    fn test_output_paths() {
        let layout = OutputLayout {
            dir: PathBuf::from("/tmp/run"),
            ..OutputLayout::default()
        };
        assert_eq!(layout.group_path(3), PathBuf::from("/tmp/run/kcell3.out"));
        assert_eq!(layout.kml_path(), PathBuf::from("/tmp/run/points.kml"));
    }
}
