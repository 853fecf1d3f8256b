use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decisions::Decision;
use crate::record::{FighterRecord, TrainingState};

const SNAPSHOT_VERSION: u32 = 1;

/// What the next run needs to avoid redundant writes, plus a few
/// informational fields for operators reading the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    pub name: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub correct_division: String,
    #[serde(default)]
    pub fight_weight: i32,
    #[serde(default)]
    pub cut_weight: i32,
    #[serde(default)]
    pub archetype: usize,
    #[serde(default)]
    pub grade: f64,
    #[serde(default)]
    pub training: Option<TrainingState>,
    #[serde(default)]
    pub fight_plan: Option<String>,
    #[serde(default)]
    pub requested_division: Option<String>,
}

impl FighterSnapshot {
    pub fn from_decision(record: &FighterRecord, decision: &Decision) -> Self {
        Self {
            name: record.name.clone(),
            division: record.division.current.clone(),
            correct_division: record.division.correct.clone(),
            fight_weight: record.weight.fight,
            cut_weight: record.weight.cut,
            archetype: record.archetype,
            grade: record.grade,
            training: Some(decision.training_state()),
            fight_plan: Some(decision.plan.label()),
            requested_division: decision.requested_division.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    #[serde(default)]
    saved_at: i64,
    fighters: HashMap<String, FighterSnapshot>,
}

/// Missing, unreadable or outdated snapshots load as empty.
pub fn load(path: &Path) -> HashMap<String, FighterSnapshot> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            if path.exists() {
                warn!(path = %path.display(), %err, "snapshot unreadable, starting empty");
            }
            return HashMap::new();
        }
    };
    let file = match serde_json::from_str::<SnapshotFile>(&raw) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot corrupt, starting empty");
            return HashMap::new();
        }
    };
    if file.version != SNAPSHOT_VERSION {
        warn!(
            path = %path.display(),
            found = file.version,
            expected = SNAPSHOT_VERSION,
            "snapshot version mismatch, starting empty"
        );
        return HashMap::new();
    }
    file.fighters
}

/// Replaces the snapshot through a sibling temp file so readers never see a
/// partial write.
pub fn save(path: &Path, fighters: &HashMap<String, FighterSnapshot>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("create snapshot dir {}", dir.display()))?;
    }

    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        saved_at: chrono::Utc::now().timestamp(),
        fighters: fighters.clone(),
    };
    let json = serde_json::to_string_pretty(&file).context("serialize snapshot")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Stat;

    fn entry(plan: &str) -> FighterSnapshot {
        FighterSnapshot {
            name: "Fel'ortiz".to_string(),
            division: "heavy".to_string(),
            correct_division: "heavy".to_string(),
            fight_weight: 312,
            cut_weight: 301,
            archetype: 2,
            grade: 4.5,
            training: Some(TrainingState {
                first: Some(Stat::Speed),
                second: Some(Stat::Chin),
                intensive: false,
            }),
            fight_plan: Some(plan.to_string()),
            requested_division: None,
        }
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("snapshot.json");
        let mut fighters = HashMap::new();
        fighters.insert("1695461".to_string(), entry("5H87ringR1"));

        save(&path, &fighters).expect("save");
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load(&path), fighters);
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshot.json");
        let mut fighters = HashMap::new();
        fighters.insert("1".to_string(), entry("5H87ringR1"));
        fighters.insert("2".to_string(), entry("4H97ringR1"));
        save(&path, &fighters).expect("first save");

        fighters.remove("2");
        save(&path, &fighters).expect("second save");
        let loaded = load(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("1"));
    }

    #[test]
    fn missing_or_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshot.json");
        assert!(load(&path).is_empty());

        fs::write(&path, "{ not json").expect("write");
        assert!(load(&path).is_empty());

        fs::write(&path, r#"{"version": 99, "fighters": {}}"#).expect("write");
        assert!(load(&path).is_empty());
    }
}
