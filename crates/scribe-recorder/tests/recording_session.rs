use anyhow::bail;
use scribe_core::{compile, ErrorCode, RawEvent, Rect, SessionState};
use scribe_recorder::prelude::*;
use scribe_recorder::{unbounded, Formatter};
use std::fs;
use std::thread;
use std::time::Duration;

struct FixedCapture(Vec<u8>);

impl ScreenCapture for FixedCapture {
    fn capture(&self, _locator: Option<&str>, _region: Option<Rect>) -> anyhow::Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct BrokenCapture;

impl ScreenCapture for BrokenCapture {
    fn capture(&self, _locator: Option<&str>, _region: Option<Rect>) -> anyhow::Result<Vec<u8>> {
        bail!("browser went away")
    }
}

fn recorder(dir: &std::path::Path, debounce_ms: u64) -> Recorder {
    let config = RecorderConfig {
        test_name: "checkout".to_string(),
        debounce_ms,
        ..Default::default()
    };
    Recorder::new(config, ScriptStorage::with_dir(dir).unwrap())
}

#[test]
fn host_calls_outside_a_session_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 10);

    let err = rec.record_step(Some("a")).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotRecording);
    assert_eq!(rec.end_step().unwrap_err().code, ErrorCode::NotRecording);
    assert_eq!(rec.record_comment("x").unwrap_err().code, ErrorCode::NotRecording);
    assert_eq!(
        rec.request_screenshot(ScreenshotOptions::default()).unwrap_err().code,
        ErrorCode::NotRecording
    );
    assert_eq!(rec.stop().unwrap_err().code, ErrorCode::NotRecording);

    // Transport events are dropped, not errors
    assert!(!rec.handle_event(RawEvent::comment("late")).is_accepted());
}

#[test]
fn start_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 10);
    rec.start().unwrap();
    assert_eq!(rec.start().unwrap_err().code, ErrorCode::AlreadyRecording);
    rec.stop().unwrap();
}

#[test]
fn script_exists_and_is_closed_from_the_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 10);
    let script = rec.start().unwrap();
    assert_eq!(
        fs::read_to_string(&script).unwrap(),
        "import { test, expect } from \"@playwright/test\";\n\ntest(\"checkout\", async ({ page }) => {\n});\n"
    );
    rec.stop().unwrap();
}

#[test]
fn live_script_tracks_events_while_recording() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 20);
    let script = rec.start().unwrap();

    rec.record_step(Some("cart")).unwrap();
    rec.handle_event(RawEvent::mouse_down(5.0, 5.0));
    rec.handle_event(RawEvent::mouse_up(5.0, 5.0));
    thread::sleep(Duration::from_millis(400));

    let live = fs::read_to_string(&script).unwrap();
    assert!(live.contains("  await test.step(\"cart\", async () => {\n    await page.mouse.click(5, 5);\n  });\n"));
    assert_eq!(Some(live), rec.render());
    rec.stop().unwrap();
}

#[test]
fn stop_writes_final_script_and_journal() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000);
    let script = rec.start().unwrap();

    rec.handle_event(RawEvent::navigation("https://shop.example"));
    rec.record_step(Some("a")).unwrap();
    rec.record_comment("x").unwrap();
    rec.end_step().unwrap();
    rec.end_step().unwrap();
    rec.record_step(None).unwrap();
    rec.handle_event(RawEvent::mouse_move(1.0, 1.0));

    let summary = rec.stop().unwrap();
    assert!(!rec.is_recording());
    assert_eq!(summary.script, script);
    assert_eq!(summary.closed_steps, 1);
    // Unmatched end and the button-less move are not journaled
    assert_eq!(summary.events, 5);
    assert_eq!(summary.entries, 5);

    let text = fs::read_to_string(&script).unwrap();
    assert_eq!(
        text,
        [
            "import { test, expect } from \"@playwright/test\";",
            "",
            "test(\"checkout\", async ({ page }) => {",
            "  await page.goto(\"https://shop.example\");",
            "  await test.step(\"a\", async () => {",
            "    // x",
            "  });",
            "  await test.step(\"step\", async () => {",
            "  });",
            "});",
            "",
        ]
        .join("\n")
    );

    // Replaying the journal reproduces the script
    let journal = scribe_recorder::read_journal(&summary.journal.unwrap()).unwrap();
    let mut state = SessionState::armed();
    for e in &journal.events {
        state.apply(e);
    }
    let template = rec.config().template();
    assert_eq!(compile(state.log(), state.open_steps(), &template), text);
}

#[test]
fn screenshots_are_saved_and_asserted() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000).with_capture(Box::new(FixedCapture(vec![0x89, b'P'])));
    rec.start().unwrap();

    let first = rec.request_screenshot(ScreenshotOptions::default()).unwrap();
    let named = rec
        .request_screenshot(ScreenshotOptions::named("hero card").of("#hero"))
        .unwrap();
    let second = rec
        .request_screenshot(ScreenshotOptions::default().clip(Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 20.0,
        }))
        .unwrap();
    assert_eq!(first.as_deref(), Some("snapshot-1"));
    assert_eq!(named.as_deref(), Some("hero_card"));
    assert_eq!(second.as_deref(), Some("snapshot-2"));

    let summary = rec.stop().unwrap();
    let snapshots = dir.path().join("checkout.spec.ts-snapshots");
    assert_eq!(fs::read(snapshots.join("hero_card.png")).unwrap(), vec![0x89, b'P']);
    assert!(snapshots.join("snapshot-1.png").exists());

    let text = fs::read_to_string(summary.script).unwrap();
    assert!(text.contains("  await expect(page).toHaveScreenshot(\"snapshot-1.png\");\n"));
    assert!(text.contains("  await expect(page.locator(\"#hero\")).toHaveScreenshot(\"hero_card.png\");\n"));
    assert!(text.contains(
        "  await expect(page).toHaveScreenshot(\"snapshot-2.png\", { clip: { x: 0, y: 0, width: 10, height: 20 } });\n"
    ));
}

#[test]
fn transport_screenshots_match_their_baselines() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000);
    rec.start().unwrap();

    for name in ["hero card", ""] {
        rec.handle_event(RawEvent::ScreenshotRequest {
            locator: String::new(),
            image_bytes: vec![0x89],
            name: name.to_string(),
            region: None,
        });
    }

    let summary = rec.stop().unwrap();
    let mut saved: Vec<String> = fs::read_dir(dir.path().join("checkout.spec.ts-snapshots"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();
    assert_eq!(saved, vec!["hero_card.png", "snapshot-1.png"]);

    let text = fs::read_to_string(summary.script).unwrap();
    assert!(text.contains("  await expect(page).toHaveScreenshot(\"hero_card.png\");\n"));
    assert!(text.contains("  await expect(page).toHaveScreenshot(\"snapshot-1.png\");\n"));
    assert!(!text.contains("\".png\""));

    // The journal keeps the resolved names
    let journal = scribe_recorder::read_journal(&summary.journal.unwrap()).unwrap();
    let names: Vec<_> = journal
        .events
        .iter()
        .filter_map(|e| match e {
            RawEvent::ScreenshotRequest { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["hero_card", "snapshot-1"]);
}

#[test]
fn counter_skips_names_already_taken() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000).with_capture(Box::new(FixedCapture(vec![1])));
    rec.start().unwrap();

    let explicit = rec.request_screenshot(ScreenshotOptions::named("snapshot-1")).unwrap();
    let auto = rec.request_screenshot(ScreenshotOptions::default()).unwrap();
    assert_eq!(explicit.as_deref(), Some("snapshot-1"));
    assert_eq!(auto.as_deref(), Some("snapshot-2"));
    rec.stop().unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn configured_formatter_rewrites_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let config = RecorderConfig {
        test_name: "checkout".to_string(),
        debounce_ms: 60_000,
        formatter: Formatter::parse("sed -i s/checkout/formatted/"),
        ..Default::default()
    };
    let mut rec = Recorder::new(config, ScriptStorage::with_dir(dir.path()).unwrap());
    rec.start().unwrap();
    rec.record_comment("x").unwrap();

    let summary = rec.stop().unwrap();
    let text = fs::read_to_string(summary.script).unwrap();
    assert!(text.contains("test(\"formatted\", async ({ page }) => {"));
    assert!(text.contains("  // x\n"));
}

#[test]
fn failed_capture_skips_the_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000).with_capture(Box::new(BrokenCapture));
    rec.start().unwrap();

    assert_eq!(rec.request_screenshot(ScreenshotOptions::named("x")).unwrap(), None);
    rec.record_comment("still recording").unwrap();

    let summary = rec.stop().unwrap();
    assert_eq!(summary.entries, 1);
    assert!(!fs::read_to_string(summary.script).unwrap().contains("toHaveScreenshot"));
}

#[test]
fn pump_applies_transport_events_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder(dir.path(), 60_000);
    rec.start().unwrap();

    let (tx, rx) = unbounded();
    let producer = thread::spawn(move || {
        tx.send(RawEvent::mouse_down(1.0, 1.0)).unwrap();
        tx.send(RawEvent::mouse_move(2.0, 2.0)).unwrap();
        tx.send(RawEvent::mouse_move(3.0, 3.0)).unwrap();
        tx.send(RawEvent::mouse_up(3.0, 3.0)).unwrap();
        tx.send(RawEvent::mouse_move(9.0, 9.0)).unwrap();
    });
    let accepted = rec.pump(&rx);
    producer.join().unwrap();
    assert_eq!(accepted, 4);

    let summary = rec.stop().unwrap();
    let text = fs::read_to_string(summary.script).unwrap();
    assert!(text.contains(
        "  await page.mouse.move(1, 1);\n  await page.mouse.down();\n  await page.mouse.move(3, 3, { steps: 1 });\n  await page.mouse.up();\n"
    ));
}
