use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::EngineConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Directory `value --out` writes snapshots to when no directory is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
}
