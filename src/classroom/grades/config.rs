use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::classroom::grades::error::Result;
use crate::classroom::grades::model::USERNAME_COLUMN;

/// Header names of one provider's assignment export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProfile {
    pub username_column: String,
    pub score_column: String,
}

impl ExportProfile {
    /// EdPuzzle assignment exports.
    pub fn edpuzzle() -> Self {
        Self {
            username_column: USERNAME_COLUMN.to_string(),
            score_column: "GRADE (OUT OF 100)".to_string(),
        }
    }

    /// Plain `Username,Score` sheets, such as hand-kept quiz results.
    pub fn scored_sheet() -> Self {
        Self {
            username_column: "Username".to_string(),
            score_column: "Score".to_string(),
        }
    }

    pub fn from_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Edpuzzle => Self::edpuzzle(),
            ProfileKind::ScoredSheet => Self::scored_sheet(),
        }
    }
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self::edpuzzle()
    }
}

/// Built-in export profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    #[default]
    Edpuzzle,
    ScoredSheet,
}

/// Settings read from the optional JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    /// Profile used when an ingestion does not name one.
    pub profile: ProfileKind,
    /// Overrides the profile's identifier header.
    pub username_column: Option<String>,
    /// Overrides the profile's score header.
    pub score_column: Option<String>,
}

impl GraderConfig {
    /// Loads the config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Resolves the export profile for `kind`, or the configured default,
    /// applying any header overrides.
    pub fn export_profile(&self, kind: Option<ProfileKind>) -> ExportProfile {
        let mut profile = ExportProfile::from_kind(kind.unwrap_or(self.profile));
        if let Some(column) = &self.username_column {
            profile.username_column = column.clone();
        }
        if let Some(column) = &self.score_column {
            profile.score_column = column.clone();
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("grader.json");
        fs::write(&path, r#"{"score_column": "Percent"}"#).expect("config written");

        let config = GraderConfig::load(&path).expect("config loaded");
        let profile = config.export_profile(None);

        assert_eq!(config.profile, ProfileKind::Edpuzzle);
        assert_eq!(profile.username_column, "USERNAME");
        assert_eq!(profile.score_column, "Percent");
    }

    #[test]
    fn explicit_kind_beats_configured_profile() {
        let config = GraderConfig {
            profile: ProfileKind::Edpuzzle,
            ..GraderConfig::default()
        };
        assert_eq!(
            config.export_profile(Some(ProfileKind::ScoredSheet)),
            ExportProfile::scored_sheet()
        );
    }

    #[test]
    fn profile_kind_uses_kebab_case() {
        let config: GraderConfig =
            serde_json::from_str(r#"{"profile": "scored-sheet"}"#).expect("parsed");
        assert_eq!(config.profile, ProfileKind::ScoredSheet);
    }
}
