//! End-to-end pipeline tests
//!
//! Drives the FTU and AU commands against fixture lookup tables and
//! envelope files on disk, and checks the generated CSV datasets.

use chrono::{Duration, Utc};
use ping_processor::cli::args::{AppusageArgs, CommonArgs, FtuArgs};
use ping_processor::cli::commands;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write the fixture reference tables into a lookup directory
fn write_lookup_tables(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("countrycodes.json"),
        r#"{"BR": {"name": "Brazil"}, "DE": {"name": "Germany"}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("mobile-codes.json"),
        r#"{"724": {"country": "Brazil", "operators": {"5": "Claro"}}}"#,
    )
    .unwrap();
    fs::write(dir.join("language-codes.json"), r#"{"pt": "Portuguese"}"#).unwrap();
    fs::write(
        dir.join("ftu-fields.json"),
        r#"{"country": ["Brazil"], "device": ["One Touch Fire", "ZTE Open"], "operator": ["Claro"]}"#,
    )
    .unwrap();
}

/// Submission date inside every dataset window: two days ago
fn recent_submission_date() -> String {
    (Utc::now().date_naive() - Duration::days(2))
        .format("%Y%m%d")
        .to_string()
}

fn envelope_line(payload: &Value, submission_date: &str) -> String {
    json!({
        "key": "record",
        "dims": ["ftu", "FirefoxOS", "release", "2.0", "20150101", submission_date],
        "payload": payload,
    })
    .to_string()
}

fn info_block(reason: &str) -> Value {
    json!({
        "appName": "FirefoxOS",
        "reason": reason,
        "appUpdateChannel": "release",
        "appVersion": "2.0",
        "appBuildID": "20150101000000",
        "geoCountry": "BR",
    })
}

fn ftu_payload() -> Value {
    json!({
        "info": info_block("ftu"),
        "deviceinfo.update_channel": "release",
        "deviceinfo.platform_version": "2.0",
        "deviceinfo.platform_build_id": "20150101000000",
        "deviceinfo.os": "2.0.0.0",
        "deviceinfo.product_model": "ALCATEL ONE TOUCH FIRE C",
        "pingTime": 1400000000000i64,
        "locale": "pt-BR",
        "icc": {"mcc": "724", "mnc": "05", "spn": "Claro BR"},
    })
}

fn au_payload(device_id: &str, start: i64, stop: i64, os: &str) -> Value {
    json!({
        "info": info_block("appusage"),
        "deviceinfo.update_channel": "release",
        "deviceinfo.platform_version": "2.0",
        "deviceinfo.platform_build_id": "20150101000000",
        "deviceinfo.os": os,
        "deviceinfo.product_model": "ZTE OPEN",
        "deviceID": device_id,
        "start": start,
        "stop": stop,
        "locale": "pt-BR",
        "icc": {"mcc": "724", "mnc": "05"},
        "apps": {
            "2015-03-14": {
                "app://clock": {"usageTime": 60, "invocations": 2},
            },
        },
        "searches": {
            "2015-03-14": {"everything.me": 1},
        },
    })
}

fn common_args(input: PathBuf, lookup: PathBuf, output: PathBuf) -> CommonArgs {
    CommonArgs {
        input,
        lookup_dir: Some(lookup),
        output,
        workers: Some(2),
        no_progress: true,
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("missing output table {}", path.display()))
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn test_ftu_end_to_end() {
    let dir = TempDir::new().unwrap();
    let lookup = dir.path().join("lookup");
    write_lookup_tables(&lookup);

    let sdate = recent_submission_date();
    let mut lines = Vec::new();
    // Two identical payloads aggregate to one counted row.
    lines.push(envelope_line(&ftu_payload(), &sdate));
    lines.push(envelope_line(&ftu_payload(), &sdate));
    // An inconsistent payload is rejected, not counted.
    let mut bad = ftu_payload();
    bad["info"]["reason"] = json!("appusage");
    lines.push(envelope_line(&bad, &sdate));

    let input = dir.path().join("ftu.ndjson");
    fs::write(&input, lines.join("\n")).unwrap();

    let output = dir.path().join("out");
    let args = FtuArgs {
        common: common_args(input, lookup, output.clone()),
        rollup: false,
        dashboard_window_days: None,
        dump_window_days: None,
    };

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(commands::run_ftu(&args)).unwrap();

    // Dump CSV: header plus one aggregated row with count 2.
    let dump = read_lines(&output.join("dump.csv"));
    assert_eq!(dump.len(), 2);
    assert!(dump[0].starts_with("ping_date,submission_date,os,"));
    assert!(dump[1].contains("One Touch Fire C"));
    assert!(dump[1].contains("2014-05-13"));
    assert!(dump[1].ends_with(",2"));

    // Dashboard CSV: summarized dimensions with the activation count.
    let dashboard = read_lines(&output.join("dashboard.csv"));
    assert_eq!(dashboard.len(), 2);
    assert_eq!(dashboard[0], "date,os,country,device,operator,activations");
    let iso_date = format!(
        "{}-{}-{}",
        &sdate[0..4],
        &sdate[4..6],
        &sdate[6..8]
    );
    assert_eq!(
        dashboard[1],
        format!("{},2.0,Brazil,One Touch Fire C,Claro,2", iso_date)
    );
}

#[test]
fn test_ftu_rollup_expansion() {
    let dir = TempDir::new().unwrap();
    let lookup = dir.path().join("lookup");
    write_lookup_tables(&lookup);

    let sdate = recent_submission_date();
    let input = dir.path().join("ftu.ndjson");
    fs::write(&input, envelope_line(&ftu_payload(), &sdate)).unwrap();

    let output = dir.path().join("out");
    let args = FtuArgs {
        common: common_args(input, lookup, output.clone()),
        rollup: true,
        dashboard_window_days: None,
        dump_window_days: None,
    };

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(commands::run_ftu(&args)).unwrap();

    // One base tuple expands over 4 dimensions: 2^4 dashboard rows.
    let dashboard = read_lines(&output.join("dashboard.csv"));
    assert_eq!(dashboard.len(), 1 + 16);
    assert!(
        dashboard
            .iter()
            .any(|line| line.contains("All,All,All,All"))
    );
}

#[test]
fn test_appusage_end_to_end() {
    let dir = TempDir::new().unwrap();
    let lookup = dir.path().join("lookup");
    write_lookup_tables(&lookup);

    let sdate = recent_submission_date();
    let start = 1426377600000i64;
    let stop = start + 3_600_000;

    let mut lines = Vec::new();
    // Duplicate submission of one session.
    lines.push(envelope_line(&au_payload("d1", start, stop, "2.0.0.0"), &sdate));
    lines.push(envelope_line(&au_payload("d1", start, stop, "2.0.0.0"), &sdate));
    // A ping nested inside the kept session is pruned.
    lines.push(envelope_line(
        &au_payload("d1", start + 1000, start + 2000, "2.0.0.0"),
        &sdate,
    ));
    // A dogfood device with its own session.
    lines.push(envelope_line(
        &au_payload("dogfood-1", start, stop, "2.0.0.0"),
        &sdate,
    ));
    // A conflicted identity: same session, different OS.
    lines.push(envelope_line(&au_payload("d2", start, stop, "1.3"), &sdate));
    lines.push(envelope_line(&au_payload("d2", start, stop, "2.0.0.0"), &sdate));

    let input = dir.path().join("au.ndjson");
    fs::write(&input, lines.join("\n")).unwrap();

    let output = dir.path().join("out");
    let args = AppusageArgs {
        common: common_args(input, lookup, output.clone()),
        overlap_tolerance_ms: None,
        keep_latest_submission: false,
        dogfood_pattern: None,
    };

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(commands::run_appusage(&args)).unwrap();

    // Info CSV: d1's session (count 2, nested ping pruned) and the
    // dogfood session. The conflicted d2 identity is excluded.
    let info = read_lines(&output.join("info.csv"));
    assert_eq!(info.len(), 3);
    assert!(info[0].starts_with("device_id,start,stop,submission_date,os,"));

    let d1_row = info.iter().find(|line| line.starts_with("d1,")).unwrap();
    assert!(d1_row.contains(&format!("{},{}", start, stop)));
    assert!(d1_row.contains(",Claro,"));
    assert!(d1_row.contains(",false,"));
    assert!(d1_row.ends_with(",2"));

    let dogfood_row = info
        .iter()
        .find(|line| line.starts_with("dogfood-1,"))
        .unwrap();
    assert!(dogfood_row.contains(",true,"));
    assert!(dogfood_row.ends_with(",1"));

    // Derived rows exist only for kept identities: one app row and one
    // search row each for d1 and dogfood-1, none for d2 or the pruned ping.
    let apps = read_lines(&output.join("app.csv"));
    assert_eq!(apps.len(), 3);
    assert!(apps.iter().any(|l| l.starts_with("d1,") && l.contains("app://clock")));
    assert!(!apps.iter().any(|l| l.starts_with("d2,")));

    let searches = read_lines(&output.join("search.csv"));
    assert_eq!(searches.len(), 3);
    assert!(searches.iter().any(|l| l.starts_with("dogfood-1,")));

    // Conflicted variants are surfaced as their own partition.
    let conflicts = read_lines(&output.join("info_conflicts.csv"));
    assert_eq!(conflicts.len(), 3);
    assert!(conflicts[1].starts_with("d2,"));
    assert!(conflicts[2].starts_with("d2,"));

    // Dogfood devices get per-device summaries and aggregated app usage.
    let details = read_lines(&output.join("dogfood_details.csv"));
    assert_eq!(details.len(), 2);
    assert!(details[0].starts_with("device_id,earliest_start,latest_stop,"));
    assert!(details[1].starts_with(&format!("dogfood-1,{},{},", start, stop)));

    let dogfood_usage = read_lines(&output.join("dogfood_appusage.csv"));
    assert_eq!(dogfood_usage.len(), 2);
    assert!(dogfood_usage[1].starts_with("dogfood-1,2015-03-14,app://clock,60,2,"));
}
