use std::path::Path;

use schemars::JsonSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};
use crate::format::RowFormat;
use crate::table::Table;

/// Settings for one generation run.
///
/// Loaded from a TOML file; every field is optional in the file and falls
/// back to the values of [`Session::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Session {
    /// Scale factor applied to table row counts.
    pub scale: f64,
    /// Directory receiving the generated files.
    pub target_directory: String,
    /// Separator placed between the directory and the file name.
    pub separator: String,
    /// File name suffix (ex.: `.dat`).
    pub suffix: String,
    /// Single table to generate; every table when absent. Names are matched
    /// case-insensitively.
    #[serde(deserialize_with = "deserialize_table")]
    #[schemars(with = "Option<Table>")]
    pub table: Option<Table>,
    /// Generate child tables together with their parent.
    pub family_run: bool,
    /// Number of chunks each table is split into.
    pub parallelism: u64,
    /// Chunk to generate, 1-based.
    pub chunk_number: u64,
    /// Generate every chunk locally instead of only `chunk_number`.
    pub generate_all_chunks: bool,
    /// Separator between column values.
    pub column_separator: char,
    /// Emit a column separator after the last value of each row.
    pub terminate_rows: bool,
    /// Remove existing output files before generating.
    pub overwrite: bool,
    /// Update run number; absent for the initial load.
    pub update: Option<u32>,
    /// Seed of the synthetic row producer.
    pub seed: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            scale: 1.0,
            target_directory: ".".to_string(),
            separator: std::path::MAIN_SEPARATOR.to_string(),
            suffix: ".dat".to_string(),
            table: None,
            family_run: true,
            parallelism: 1,
            chunk_number: 1,
            generate_all_chunks: false,
            column_separator: '|',
            terminate_rows: true,
            overwrite: false,
            update: None,
            seed: 19_620_718,
        }
    }
}

fn deserialize_table<'de, D>(deserializer: D) -> std::result::Result<Option<Table>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|name| name.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Where and under which name a generation call writes its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub target_directory: String,
    pub separator: String,
    pub suffix: String,
    /// Parent and child tables are generated together.
    pub family_run: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_directory: ".".to_string(),
            separator: std::path::MAIN_SEPARATOR.to_string(),
            suffix: ".dat".to_string(),
            family_run: true,
        }
    }
}

impl Session {
    /// Parse a session from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let session: Session = toml::from_str(content)?;
        Ok(session)
    }

    /// Load a session from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if self.parallelism == 0 {
            return Err(CoreError::InvalidConfig(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if self.chunk_number == 0 || self.chunk_number > self.parallelism {
            return Err(CoreError::InvalidConfig(format!(
                "chunk number {} is outside 1..={}",
                self.chunk_number, self.parallelism
            )));
        }
        if self.target_directory.is_empty() {
            return Err(CoreError::InvalidConfig(
                "target directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Chunks this session generates.
    pub fn chunks(&self) -> Vec<u64> {
        if self.generate_all_chunks {
            (1..=self.parallelism).collect()
        } else {
            vec![self.chunk_number]
        }
    }

    /// File name suffix for one chunk.
    ///
    /// Update runs are tagged `_u<n>`, split tables `_<chunk>_<parallelism>`;
    /// both tags precede the configured suffix.
    pub fn suffix_for_chunk(&self, chunk: u64) -> String {
        let mut suffix = String::new();
        if let Some(update) = self.update {
            suffix.push_str(&format!("_u{update}"));
        }
        if self.parallelism > 1 {
            suffix.push_str(&format!("_{chunk}_{}", self.parallelism));
        }
        suffix.push_str(&self.suffix);
        suffix
    }

    pub fn output_config(&self, chunk: u64) -> OutputConfig {
        OutputConfig {
            target_directory: self.target_directory.clone(),
            separator: self.separator.clone(),
            suffix: self.suffix_for_chunk(chunk),
            family_run: self.family_run,
        }
    }

    pub fn row_format(&self) -> RowFormat {
        RowFormat {
            column_separator: self.column_separator,
            terminate_rows: self.terminate_rows,
        }
    }
}

/// Emit the JSON Schema for session config files.
pub fn session_json_schema() -> RootSchema {
    schema_for!(Session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Session::default().validate().expect("default session");
    }

    #[test]
    fn rejects_chunk_outside_parallelism() {
        let session = Session {
            parallelism: 4,
            chunk_number: 5,
            ..Session::default()
        };
        assert!(matches!(
            session.validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_non_positive_scale() {
        for scale in [0.0, -1.0, f64::NAN] {
            let session = Session {
                scale,
                ..Session::default()
            };
            assert!(session.validate().is_err(), "scale {scale}");
        }
    }

    #[test]
    fn single_chunk_keeps_plain_suffix() {
        assert_eq!(Session::default().suffix_for_chunk(1), ".dat");
    }

    #[test]
    fn shard_and_update_tags_precede_suffix() {
        let session = Session {
            parallelism: 8,
            update: Some(2),
            ..Session::default()
        };
        assert_eq!(session.suffix_for_chunk(3), "_u2_3_8.dat");
        assert_ne!(session.suffix_for_chunk(3), session.suffix_for_chunk(4));
    }

    #[test]
    fn chunks_follow_generate_all_flag() {
        let mut session = Session {
            parallelism: 3,
            chunk_number: 2,
            ..Session::default()
        };
        assert_eq!(session.chunks(), vec![2]);
        session.generate_all_chunks = true;
        assert_eq!(session.chunks(), vec![1, 2, 3]);
    }

    #[test]
    fn parses_partial_toml() {
        let session = Session::from_toml_str(
            r#"
scale = 10.0
table = "store_sales"
parallelism = 4
chunk_number = 2
"#,
        )
        .expect("parse session");
        assert_eq!(session.table, Some(Table::StoreSales));
        assert_eq!(session.parallelism, 4);
        assert_eq!(session.suffix, ".dat");
        assert!(session.family_run);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Session::from_toml_str("scal = 2.0"),
            Err(CoreError::TomlDecode(_))
        ));
    }
}
