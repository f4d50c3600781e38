//! Cassette replay integration tests — zero network I/O.
//!
//! All tests set `NEGAR_REPLAY` to a cassette file path so that the binary
//! never contacts a live API endpoint. Cassettes are built programmatically
//! so the embedded image payloads are real PNG bytes.

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn cmd() -> Command {
    Command::cargo_bin("negar").unwrap()
}

/// A real 1×1 PNG, base64-encoded.
fn tiny_png_base64() -> String {
    let img = image::DynamicImage::new_rgb8(1, 1);
    let mut buf = std::io::Cursor::new(Vec::<u8>::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
}

/// The engineering model's JSON reply, as the string the text port returns.
fn engineered_reply(grounding: Option<&str>) -> String {
    json!({
        "analysis_notes": "تحلیل درخواست",
        "grounding_search_query": grounding,
        "target_model": "image",
        "stylistic_notes": "Photorealistic, warm lighting",
        "professional_prompt": "A cozy bookstore facade at dusk.",
        "text_replication_instruction": "Replicate text_plate_1.png exactly on the sign.",
        "negative_prompt": "blurry, wrong text"
    })
    .to_string()
}

/// Write a cassette with the given interactions to `path`.
fn write_cassette(path: &Path, interactions: Vec<serde_json::Value>) {
    let cassette = json!({
        "name": "replay-test",
        "recorded_at": "2026-08-01T00:00:00Z",
        "commit": "test",
        "interactions": interactions,
    });
    let yaml = serde_yaml::to_string(&cassette).unwrap();
    std::fs::write(path, yaml).unwrap();
}

fn text_interaction(seq: u64, output: serde_json::Value) -> serde_json::Value {
    json!({
        "seq": seq,
        "port": "backend",
        "method": "generate_text",
        "input": {},
        "output": output,
    })
}

fn image_interaction(seq: u64) -> serde_json::Value {
    json!({
        "seq": seq,
        "port": "backend",
        "method": "generate_image",
        "input": {},
        "output": { "Ok": { "data": tiny_png_base64(), "mime_type": "image/png" } },
    })
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(name)
}

#[test]
fn image_happy_path_creates_png() {
    let cassette = temp_path("negar_replay_happy.cassette.yaml");
    write_cassette(
        &cassette,
        vec![
            // Quote pass wraps the sign text in quotes
            text_interaction(
                0,
                json!({ "Ok": { "text": "A bookstore with a sign that says \"کتابفروشی حافظ\"." } }),
            ),
            // Prompt engineering returns the structured JSON
            text_interaction(1, json!({ "Ok": { "text": engineered_reply(None) } })),
            image_interaction(2),
        ],
    );

    let out = temp_path("negar_replay_happy.png");
    let _ = std::fs::remove_file(&out);

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .args(["--output", out.to_str().unwrap(), "A bookstore with a sign"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[..8], &PNG_MAGIC, "Output should be a valid PNG file");

    let _ = std::fs::remove_file(&out);
    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn quote_pass_failure_falls_back_and_still_generates() {
    let cassette = temp_path("negar_replay_quotefail.cassette.yaml");
    write_cassette(
        &cassette,
        vec![
            text_interaction(0, json!({ "Err": "503 upstream unavailable" })),
            text_interaction(1, json!({ "Ok": { "text": engineered_reply(None) } })),
            image_interaction(2),
        ],
    );

    let out = temp_path("negar_replay_quotefail.png");
    let _ = std::fs::remove_file(&out);

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .args(["--output", out.to_str().unwrap(), "a plain prompt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("quote pass failed"))
        .stderr(predicate::str::contains("Saved:"));

    assert!(out.exists(), "Output file should have been created despite quote pass failure");

    let _ = std::fs::remove_file(&out);
    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn no_quote_pass_skips_first_text_call() {
    // With --no-quote-pass the first generate_text interaction is the
    // engineering call, so a two-entry cassette suffices.
    let cassette = temp_path("negar_replay_noquote.cassette.yaml");
    write_cassette(
        &cassette,
        vec![
            text_interaction(0, json!({ "Ok": { "text": engineered_reply(None) } })),
            image_interaction(1),
        ],
    );

    let out = temp_path("negar_replay_noquote.png");
    let _ = std::fs::remove_file(&out);

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .args(["--no-quote-pass", "--output", out.to_str().unwrap(), "a plain prompt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    assert!(out.exists());

    let _ = std::fs::remove_file(&out);
    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn grounding_query_triggers_extra_image_call() {
    // Engineering names a real-world entity → one extra generate_image
    // interaction is consumed for the grounding reference.
    let cassette = temp_path("negar_replay_grounding.cassette.yaml");
    write_cassette(
        &cassette,
        vec![
            text_interaction(0, json!({ "Ok": { "text": "A poster of \"برج میلاد\"." } })),
            text_interaction(1, json!({ "Ok": { "text": engineered_reply(Some("برج میلاد")) } })),
            image_interaction(2),
            image_interaction(3),
        ],
    );

    let out = temp_path("negar_replay_grounding.png");
    let _ = std::fs::remove_file(&out);

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .args(["-v", "--output", out.to_str().unwrap(), "A poster of برج میلاد"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Grounding query"))
        .stderr(predicate::str::contains("Saved:"));

    assert!(out.exists());

    let _ = std::fs::remove_file(&out);
    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn malformed_engineering_reply_exits_with_error() {
    let cassette = temp_path("negar_replay_malformed.cassette.yaml");
    write_cassette(
        &cassette,
        vec![
            text_interaction(0, json!({ "Ok": { "text": "a plain prompt" } })),
            text_interaction(1, json!({ "Ok": { "text": "Sorry, I cannot produce JSON." } })),
        ],
    );

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .arg("a plain prompt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed response"));

    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn unsupported_reference_extension_exits_with_error() {
    let cassette = temp_path("negar_replay_badref.cassette.yaml");
    write_cassette(&cassette, vec![]);

    cmd()
        .env("NEGAR_REPLAY", cassette.to_str().unwrap())
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .args(["-r", "reference.tiff", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported reference image"));

    let _ = std::fs::remove_file(&cassette);
}
