//! End-to-end tests for `qmkjson c2json`.

use std::fs;

mod fixtures;

use fixtures::{keymap_source, xd75_info_json, MockQmk, TWO_KEY_INFO, XD75_KEYMAP};

/// Test: two-key keyboard, one layer, no preprocessing -> exact compact JSON on stdout
#[test]
fn test_c2json_two_key_scenario() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B"]).as_bytes());

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "kb", "-m", "km"])
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"keyboard":"kb","keymap":"km","layout":"LAYOUT","layers":[["KC_A","KC_B"]]}"#
    );
}

/// Test: `-o -` also means stdout
#[test]
fn test_c2json_dash_output_is_stdout() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B"]).as_bytes());

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "--kb", "kb", "--km", "km", "-o", "-"])
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["layers"][0][1], "KC_B");
    assert!(!qmk.root().join("-").exists());
}

/// Test: three keycodes against a two-key layout fails and writes nothing
#[test]
fn test_c2json_shape_mismatch_writes_nothing() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B, KC_C"]).as_bytes());
    let target = qmk.root().join("out/km.json");

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "kb", "-m", "km", "-o"])
        .arg(&target)
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3 keycodes"), "stderr: {stderr}");
    assert!(!target.exists());
}

/// Test: with a preprocessor that cannot start, the user is told to try --no-cpp
#[test]
fn test_c2json_preprocessor_failure_suggests_no_cpp() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B"]).as_bytes());

    let output = qmk
        .command()
        .args(["c2json", "-k", "kb", "-m", "km"])
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--no-cpp"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

/// Test: missing keymap.c is an I/O error
#[test]
fn test_c2json_missing_file() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "kb", "-m", "km"])
        .arg(qmk.root().join("nope/keymap.c"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("C file does not exist"), "stderr: {stderr}");
}

/// Test: a missing keymap.c wins over an unknown keyboard
#[test]
fn test_c2json_missing_file_unknown_keyboard() {
    let qmk = MockQmk::new();

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "planck", "-m", "km"])
        .arg(qmk.root().join("nope/keymap.c"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("C file does not exist"), "stderr: {stderr}");
}

/// Test: reading keymap.c from stdin is rejected explicitly
#[test]
fn test_c2json_stdin_unsupported() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "kb", "-m", "km", "-"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("standard input"), "stderr: {stderr}");
}

/// Test: unknown keyboard fails with a configuration error
#[test]
fn test_c2json_unknown_keyboard() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B"]).as_bytes());

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "other", "-m", "km"])
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no keyboard configuration"), "stderr: {stderr}");
}

/// Test: repeated writes to the same output keep exactly one .bak
#[test]
fn test_c2json_output_backup() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("kb", TWO_KEY_INFO);
    let keymap = qmk.add_keymap("kb", "km", keymap_source(&["KC_A, KC_B"]).as_bytes());
    let out_dir = qmk.root().join("converted");
    let target = out_dir.join("km.json");

    fs::create_dir_all(&out_dir).unwrap();
    fs::write(&target, "old").unwrap();

    for _ in 0..3 {
        let output = qmk
            .command()
            .args(["c2json", "--no-cpp", "-q", "-k", "kb", "-m", "km", "-o"])
            .arg(&target)
            .arg(&keymap)
            .output()
            .expect("Failed to execute command");
        assert_eq!(
            output.status.code(),
            Some(0),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(output.stdout.is_empty());
    }

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["keymap"], "km");

    let mut names: Vec<String> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["km.json", "km.json.bak"]);

    let backup = fs::read_to_string(out_dir.join("km.json.bak")).unwrap();
    assert_ne!(backup, "old");
}

/// Test: the xd75 keymap converts with its layout macro and layer designators
#[test]
fn test_c2json_xd75() {
    let qmk = MockQmk::new();
    qmk.add_keyboard("xd75", &xd75_info_json());
    let keymap = qmk.add_keymap("xd75", "boy_314", XD75_KEYMAP);

    let output = qmk
        .command()
        .args(["c2json", "--no-cpp", "-k", "xd75", "-m", "boy_314"])
        .arg(&keymap)
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["keyboard"], "xd75");
    assert_eq!(json["keymap"], "boy_314");
    assert_eq!(json["layout"], "LAYOUT_ortho_5x15");

    let layers = json["layers"].as_array().unwrap();
    assert_eq!(layers.len(), 5);
    for layer in layers {
        assert_eq!(layer.as_array().unwrap().len(), 75);
    }
    assert_eq!(layers[0][0], "KC_ESC");
    assert_eq!(layers[4][0], "KC_GRV");
    assert_eq!(layers[4][74], "KC_MPLY");
}
