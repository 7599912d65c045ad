use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Region;
use crate::error::Result;
use crate::types::Snapshot;

pub const SNAPSHOT_FILE: &str = "activity_cards.json";

pub fn snapshot_path(data_dir: &Path, region: Region) -> PathBuf {
    data_dir.join(region.folder()).join(SNAPSHOT_FILE)
}

/// Replace `<data_dir>/<folder>/activity_cards.json` with `snapshot`.
///
/// The JSON is written to a temp file in the same directory and renamed
/// over the target, so a failed write leaves the previous snapshot intact.
pub fn write_snapshot(data_dir: &Path, region: Region, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = snapshot_path(data_dir, region);
    let dir = data_dir.join(region.folder());
    fs::create_dir_all(&dir)?;

    let json = serde_json::to_vec_pretty(snapshot)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::tags_for_card;
    use crate::types::{EnrichedActivity, Status};
    use chrono::DateTime;
    use serde_json::Value;

    fn sample() -> Snapshot {
        let crawl_time = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+08:00").unwrap();
        Snapshot {
            crawl_time,
            activities: vec![EnrichedActivity {
                title: "复刻登入活动".to_string(),
                description: "每日登录领取奖励".to_string(),
                image_url: "https://cdn.example.com/a.png".to_string(),
                progress: "21天后结束".to_string(),
                tags: tags_for_card("复刻登入活动", "爬塔"),
                start_time: None,
                end_time: DateTime::parse_from_rfc3339("2024-01-22T00:00:00+08:00").ok(),
                status: Status::Ongoing,
            }],
        }
    }

    #[test]
    fn writes_envelope_under_region_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), Region::Jp, &sample()).unwrap();
        assert_eq!(path, dir.path().join("jp").join("activity_cards.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("复刻登入活动"), "non-ASCII must be written verbatim");

        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["crawl_time"], "2024-01-01T00:00:00+08:00");
        let activity = &json["activities"][0];
        assert_eq!(activity["tags"], serde_json::json!(["签到", "复刻", "爬塔"]));
        assert_eq!(activity["start_time"], Value::Null);
        assert_eq!(activity["end_time"], "2024-01-22T00:00:00+08:00");
        assert!(activity.get("status").is_none());
    }

    #[test]
    fn record_fields_are_in_documented_order() {
        let text = serde_json::to_string(&sample().activities[0]).unwrap();
        let keys = [
            "\"title\"",
            "\"description\"",
            "\"image_url\"",
            "\"progress\"",
            "\"tags\"",
            "\"start_time\"",
            "\"end_time\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), Region::Intl);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{\"stale\": true}").unwrap();

        let mut snapshot = sample();
        snapshot.activities.clear();
        write_snapshot(dir.path(), Region::Intl, &snapshot).unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json.get("stale").is_none());
        assert_eq!(json["activities"], serde_json::json!([]));
    }
}
