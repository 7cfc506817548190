#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Command with HOME pointed at a scratch directory so config writes stay local
fn swapx_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("swapx").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// ============================================================================
// tree
// ============================================================================

#[test]
fn tree_rewrites_standalone_tokens_only() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();

    write_file(
        &site.path().join("inc/schema.php"),
        "The childcare center offers childcare_discovery services and ChildCareSchema markup.\n",
    );
    write_file(&site.path().join("inc/admin/labels.php"), "define('LABEL', 'CHILDCARE');\n");
    write_file(&site.path().join("inc/readme.txt"), "childcare\n");

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .args(["--ext", "php", "--word", "childcare=pediatric therapy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated inc/schema.php"))
        .stdout(predicate::str::contains("Updated inc/admin/labels.php"))
        .stdout(predicate::str::contains("Done"));

    assert_eq!(
        fs::read_to_string(site.path().join("inc/schema.php")).unwrap(),
        "The pediatric therapy center offers childcare_discovery services and ChildCareSchema markup.\n"
    );
    assert_eq!(
        fs::read_to_string(site.path().join("inc/admin/labels.php")).unwrap(),
        "define('LABEL', 'PEDIATRIC THERAPY');\n"
    );
    assert_eq!(fs::read_to_string(site.path().join("inc/readme.txt")).unwrap(), "childcare\n");
}

#[test]
fn tree_preset_defaults_to_php() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();

    write_file(&site.path().join("a.php"), "Childcare plans");
    write_file(&site.path().join("a.js"), "Childcare plans");

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .args(["--preset", "pediatric-therapy"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(site.path().join("a.php")).unwrap(), "Pediatric Therapy plans");
    assert_eq!(fs::read_to_string(site.path().join("a.js")).unwrap(), "Childcare plans");
}

#[test]
fn tree_dry_run_writes_nothing() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();
    write_file(&site.path().join("page.php"), "<h1>childcare</h1>\n");

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .args(["--preset", "pediatric-therapy", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("L1: ~ <h1>pediatric therapy</h1>"))
        .stdout(predicate::str::contains("1 would update"));

    assert_eq!(fs::read_to_string(site.path().join("page.php")).unwrap(), "<h1>childcare</h1>\n");
}

#[test]
fn tree_json_summary_reports_skips() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();
    write_file(&site.path().join("a.php"), "childcare");
    write_file(&site.path().join("b.php"), "nothing here");
    fs::write(site.path().join("c.php"), [0xff, 0xfe, 0x00]).unwrap();

    let assert = swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .args(["--preset", "pediatric-therapy", "--json"])
        .assert()
        .success();

    let summary: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(summary["scanned"], 3);
    assert_eq!(summary["updated"], 1);
    assert_eq!(summary["unchanged"], 1);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["files"][2]["reason"], "undecodable");
}

#[test]
fn tree_missing_root_fails() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path().join("missing"))
        .args(["--word", "a=b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn tree_rules_file() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();
    let rules = home.path().join("rules.toml");
    write_file(
        &rules,
        r#"
[[rule]]
pattern = "childcare"
replacement = "pediatric therapy"
kind = "word"
case_variants = true

[[rule]]
pattern = "chroma_"
replacement = "earlystart_"
"#,
    );
    write_file(&site.path().join("x.php"), "CHILDCARE chroma_seo childcare_id");

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(site.path().join("x.php")).unwrap(),
        "PEDIATRIC THERAPY earlystart_seo childcare_id"
    );
}

// ============================================================================
// file
// ============================================================================

#[test]
fn file_preset_rewrites_prefixes() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let routes = dir.path().join("class-geo-routes.php");
    write_file(
        &routes,
        "register_rest_route('chroma_agent_geo_feed_v2', '/feed');\n$x = get_post_meta($id, '_chroma_foo', true);\n",
    );

    swapx_cmd(&home)
        .arg("file")
        .arg(&routes)
        .args(["--preset", "earlystart-prefix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated successfully"));

    let content = fs::read_to_string(&routes).unwrap();
    assert!(content.contains("earlystart_agent_geo_feed_v2"));
    assert!(content.contains("'_earlystart_foo'"));
    assert!(!content.contains("chroma"));
}

#[test]
fn file_requires_rules() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("x.php");
    write_file(&path, "x");

    swapx_cmd(&home)
        .arg("file")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rules given"));
}

#[test]
fn file_rejects_undecodable_content() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("x.php");
    fs::write(&path, [0xc3, 0x28]).unwrap();

    swapx_cmd(&home)
        .arg("file")
        .arg(&path)
        .args(["--literal", "a=b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid UTF-8"));
}

// ============================================================================
// presets / config
// ============================================================================

#[test]
fn presets_lists_builtins() {
    let home = tempdir().unwrap();

    swapx_cmd(&home)
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("pediatric-therapy"))
        .stdout(predicate::str::contains("earlystart-prefix"))
        .stdout(predicate::str::contains("'childcare' -> 'pediatric therapy'"));
}

#[test]
fn config_show_creates_default_file() {
    let home = tempdir().unwrap();

    swapx_cmd(&home)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("context_lines = 2"));

    assert!(home.path().join(".swapx/config.toml").exists());
}

#[test]
fn malformed_config_warns_and_recovers() {
    let home = tempdir().unwrap();
    write_file(&home.path().join(".swapx/config.toml"), "[processing\nextension = ");

    swapx_cmd(&home)
        .arg("presets")
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed config file"));

    let restored = fs::read_to_string(home.path().join(".swapx/config.toml")).unwrap();
    assert!(restored.contains("context_lines = 2"));
}

#[test]
fn tree_undecodable_file_skipped_quietly() {
    let home = tempdir().unwrap();
    let site = tempdir().unwrap();
    fs::write(site.path().join("logo.php"), [0xff, 0xfe, 0x00]).unwrap();

    swapx_cmd(&home)
        .arg("tree")
        .arg(site.path())
        .args(["--preset", "pediatric-therapy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped logo.php (not valid UTF-8)"))
        .stderr(predicate::str::is_empty());
}
