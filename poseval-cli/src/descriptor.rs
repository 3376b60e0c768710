use log::*;
use poseval::evaluate::EvaluationConfig;
use poseval::schema::{FallbackTable, SchemaTables, MIXAMO_52};
use poseval::synth::SynthesisConfig;
use poseval::unproject::UnprojectConfig;
use serde::Deserialize;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Joint names used for datasets without a trailing name row.
    pub fallback_table: Option<String>,
    /// Extra fallback tables, for rigs the built-in ones don't cover.
    pub tables: Vec<FallbackTable>,
    /// BVH file holding the skeleton both motions play on.
    pub skeleton: Option<PathBuf>,
    pub synthesis: SynthesisConfig,
    pub unproject: UnprojectConfig,
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Reads `path`, falling back to defaults when it is missing or broken.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                debug!("no config at {}: {}", path.display(), e);
                return Default::default();
            }
        };
        match toml::from_str(&data) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to parse config file: {}", e);
                Default::default()
            }
        }
    }

    pub fn schema_tables(&self) -> SchemaTables {
        let mut tables = SchemaTables::builtin();
        for table in &self.tables {
            if tables.register(table.clone()).is_some() {
                warn!("CONFIG: table `{}` replaces a built-in table", table.version);
            }
        }
        tables
    }

    pub fn table_name<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.or_else(|| self.fallback_table.as_deref())
            .unwrap_or(MIXAMO_52)
    }
}
