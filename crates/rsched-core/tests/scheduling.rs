use std::fs;
use std::path::Path;

use rsched_core::{
    Crontab, END_MARKER, START_MARKER, delete_line, entries_for_profiles, extract_own_section,
    load_config,
};
use tempfile::tempdir;

const SAMPLE_CONFIG: &str = r#"
schema_version = 1

[global]
binary = "/usr/local/bin/rsched"

[profiles.home.backup]
schedule = ["01:01"]

[profiles.home.prune]
schedule = ["weekly"]
"#;

fn build_crontab(config_path: &Path) -> Crontab {
    let loaded = load_config(Some(config_path.to_string_lossy().as_ref())).expect("config loads");
    assert!(loaded.warnings.is_empty(), "unexpected warnings: {:?}", loaded.warnings);
    let entries = entries_for_profiles(&loaded.config, &loaded.path, &["home".to_string()])
        .expect("entries build");
    Crontab::new(entries)
}

#[test]
fn config_to_crontab_round_trip() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, SAMPLE_CONFIG).expect("write fixture");

    let crontab = build_crontab(&config_path);
    let mut buffer = Vec::new();
    crontab.update("", true, &mut buffer).expect("update");
    let installed = String::from_utf8(buffer).expect("utf-8 output");

    let config_file = config_path.to_string_lossy();
    let expected_backup = format!(
        "01 01 * * *\t/usr/local/bin/rsched --config {config_file} --name home backup\n"
    );
    let expected_prune = format!(
        "00 00 * * 01\t/usr/local/bin/rsched --config {config_file} --name home prune\n"
    );
    assert_eq!(
        installed,
        format!("\n{START_MARKER}{expected_backup}{expected_prune}{END_MARKER}")
    );
}

#[test]
fn reinstall_preserves_foreign_content_and_converges() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, SAMPLE_CONFIG).expect("write fixture");

    let crontab = build_crontab(&config_path);
    let existing = "MAILTO=ops@example.com\n30 6 * * *\t/usr/bin/uptime-report\n";

    let mut buffer = Vec::new();
    crontab.update(existing, true, &mut buffer).expect("first update");
    let first = String::from_utf8(buffer).expect("utf-8 output");
    assert!(first.starts_with(existing), "foreign lines must stay first");

    let mut buffer = Vec::new();
    crontab.update(&first, true, &mut buffer).expect("second update");
    let second = String::from_utf8(buffer).expect("utf-8 output");
    assert_eq!(first, second, "repeated updates must converge");

    let (before, section, after, found) = extract_own_section(&second);
    assert!(found);
    assert!(before.starts_with(existing));
    assert_eq!(section.lines().count(), 2);
    assert_eq!(after, "");
}

#[test]
fn unschedule_flow_removes_section_entries_and_legacy_lines() {
    let temp = tempdir().expect("tempdir");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, SAMPLE_CONFIG).expect("write fixture");

    let loaded = load_config(Some(config_path.to_string_lossy().as_ref())).expect("config loads");
    let removed = entries_for_profiles(&loaded.config, &loaded.path, &["home".to_string()])
        .expect("entries build");

    // a standalone line left behind by an old install, outside any section
    let config_file = loaded.path.to_string_lossy();
    let legacy = format!(
        "05 04 * * *\t/usr/local/bin/rsched --config {config_file} --name home backup\n"
    );
    let installed = {
        let mut buffer = Vec::new();
        Crontab::new(removed.clone())
            .update(&legacy, true, &mut buffer)
            .expect("install");
        String::from_utf8(buffer).expect("utf-8 output")
    };

    // desired state without the profile: empty section, then legacy cleanup
    let mut buffer = Vec::new();
    Crontab::new(Vec::new())
        .update(&installed, true, &mut buffer)
        .expect("unschedule update");
    let mut text = String::from_utf8(buffer).expect("utf-8 output");
    for entry in &removed {
        let (next, _found) = delete_line(&text, entry).expect("delete_line");
        text = next;
    }

    assert!(!text.contains("--name home backup"));
    assert!(text.contains(START_MARKER.trim_end()));
}
