//! End-to-end runs: mock browser in, snapshot file out.

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};

use huodong_scout::extractor::Extractor;
use huodong_scout::scout::Scout;
use huodong_scout::testing::{instant_settings, MockBrowser, MockCard};
use huodong_scout::Config;

fn crawl_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00+08:00").unwrap()
}

fn config(server_id: &str, data_dir: &std::path::Path) -> Config {
    Config {
        server_id: server_id.to_string(),
        headless: true,
        webdriver_url: "http://localhost:9515".to_string(),
        data_dir: data_dir.to_path_buf(),
    }
}

fn scout(server_id: &str, data_dir: &std::path::Path, browser: MockBrowser) -> Scout {
    Scout::new(
        config(server_id, data_dir),
        Extractor::new(Box::new(browser), instant_settings()),
    )
}

fn listing() -> Vec<MockCard> {
    let mut cards = vec![
        MockCard::new("[活动] 夏日狂想曲 复刻", "已结束", "已结束3天"),
        MockCard::new("复刻登入活动", "进行中", "21天后结束").page_type("签到"),
        MockCard::new("总力战 主教", "未开始", "5天后开始"),
        MockCard::new("活动说明", "进行中", "活动说明"),
    ];
    cards.extend((1..=6).map(|i| MockCard::new(&format!("旧活动{i}"), "已结束", "已结束10天")));
    cards
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn writes_classified_snapshot_for_region() {
    let dir = tempfile::tempdir().unwrap();

    let report = scout("16", dir.path(), MockBrowser::new(listing()))
        .run_at(crawl_time())
        .await
        .unwrap();

    assert_eq!(report.path, dir.path().join("cn").join("activity_cards.json"));
    assert_eq!(report.extracted, 10);
    assert_eq!(report.stats.ended, 7);
    assert_eq!(report.stats.kept, 8);
    assert_eq!(report.first_title.as_deref(), Some("复刻登入活动"));

    let json = read_json(&report.path);
    assert_eq!(json["crawl_time"], "2024-01-01T00:00:00+08:00");

    let activities = json["activities"].as_array().unwrap();
    let titles: Vec<&str> = activities.iter().map(|a| a["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec![
            "复刻登入活动",
            "活动说明",
            "总力战 主教",
            "[活动] 夏日狂想曲 复刻",
            "旧活动1",
            "旧活动2",
            "旧活动3",
            "旧活动4",
        ]
    );

    assert_eq!(activities[0]["tags"], json!(["签到", "复刻"]));
    assert_eq!(activities[0]["end_time"], "2024-01-22T00:00:00+08:00");
    assert_eq!(activities[0]["start_time"], Value::Null);

    assert_eq!(activities[1]["tags"], json!(["其他"]));
    assert_eq!(activities[1]["start_time"], Value::Null);
    assert_eq!(activities[1]["end_time"], Value::Null);

    assert_eq!(activities[2]["start_time"], "2024-01-06T00:00:00+08:00");
    assert_eq!(activities[2]["end_time"], Value::Null);

    assert_eq!(activities[3]["tags"], json!(["活动", "复刻"]));
    assert_eq!(activities[3]["end_time"], "2023-12-29T00:00:00+08:00");

    for activity in activities {
        assert!(activity.get("status").is_none());
        assert!(activity["start_time"].is_null() || activity["end_time"].is_null());
    }
}

#[tokio::test]
async fn failed_extraction_still_writes_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let report = scout("15", dir.path(), MockBrowser::new(Vec::new()))
        .run_at(crawl_time())
        .await
        .unwrap();

    assert_eq!(report.path, dir.path().join("jp").join("activity_cards.json"));
    let json = read_json(&report.path);
    assert_eq!(json["activities"], json!([]));
    assert_eq!(json["crawl_time"], "2024-01-01T00:00:00+08:00");
}

#[tokio::test]
async fn unknown_server_writes_to_intl() {
    let dir = tempfile::tempdir().unwrap();

    let report = scout("42", dir.path(), MockBrowser::new(listing()))
        .run_at(crawl_time())
        .await
        .unwrap();

    assert_eq!(report.path, dir.path().join("intl").join("activity_cards.json"));
}

#[tokio::test]
async fn identical_runs_write_identical_bytes() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let a = scout("17", first.path(), MockBrowser::new(listing()))
        .run_at(crawl_time())
        .await
        .unwrap();
    let b = scout("17", second.path(), MockBrowser::new(listing()))
        .run_at(crawl_time())
        .await
        .unwrap();

    assert_eq!(std::fs::read(a.path).unwrap(), std::fs::read(b.path).unwrap());
}

#[tokio::test]
async fn unwritable_data_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way").unwrap();

    let result = scout("17", &blocker, MockBrowser::new(listing()))
        .run_at(crawl_time())
        .await;

    assert!(result.is_err());
}
