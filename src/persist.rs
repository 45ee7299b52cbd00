use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::aggregator::Aggregator;
use crate::player::PlayerRecord;

pub fn encode_snapshot(players: &BTreeMap<String, PlayerRecord>) -> Result<Vec<u8>> {
    serde_json::to_vec(players).context("serialize player snapshot")
}

/// Writes every record of `aggregator` as one JSON object keyed by name.
/// Call only after the scheduler has drained.
pub fn write_snapshot(aggregator: &Aggregator, path: &Path) -> Result<usize> {
    let players = aggregator.snapshot();
    let json = encode_snapshot(&players)?;

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("create snapshot dir {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write snapshot {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap snapshot into {}", path.display()))?;
    Ok(players.len())
}
