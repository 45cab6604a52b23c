//! Recorder - the surface a test runner drives during a recording
//!
//! Host calls (`record_step`, `end_step`, `record_comment`,
//! `request_screenshot`) fail with `NOT_RECORDING` outside a session. Events
//! from the browser transport go through `handle_event` and are silently
//! dropped outside a session.

use crate::formatter::Formatter;
use crate::session::{DriverConfig, FileSink, SessionDriver};
use crate::storage::{sanitize, ScriptStorage};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use scribe_core::{
    DiscardReason, Disposition, Error, RawEvent, Rect, Result, ScriptTemplate, SessionState,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Image capture capability supplied by the browser side
pub trait ScreenCapture: Send + Sync {
    /// PNG bytes of the element matched by `locator`, or of the page
    fn capture(&self, locator: Option<&str>, region: Option<Rect>) -> anyhow::Result<Vec<u8>>;
}

/// Recorder configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Test name; also names the script, snapshot dir and journal
    pub test_name: String,
    /// Quiet period before the script is rewritten
    pub debounce_ms: u64,
    /// Spaces per indent level in the script
    pub indent: usize,
    /// External formatter, run with the script path appended
    pub formatter: Option<Formatter>,
    /// Extra attempts after a failed script write
    pub write_retries: u32,
    /// Keep the raw events and save them next to the script on stop
    pub journal: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            test_name: "recorded".to_string(),
            debounce_ms: 250,
            indent: 2,
            formatter: None,
            write_retries: 1,
            journal: true,
        }
    }
}

impl RecorderConfig {
    pub fn template(&self) -> ScriptTemplate {
        ScriptTemplate::playwright(&self.test_name).indent_width(self.indent)
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            delay: Duration::from_millis(self.debounce_ms),
            template: self.template(),
            retries: self.write_retries,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    pub name: Option<String>,
    /// Element to capture; the page when absent
    pub locator: Option<String>,
    pub region: Option<Rect>,
}

impl ScreenshotOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn of(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn clip(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self
    }
}

/// What a finished recording left on disk
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub script: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,
    /// Raw events accepted during the session
    pub events: usize,
    /// Action log length after merging
    pub entries: usize,
    /// Steps still open at stop, closed in the final script
    pub closed_steps: usize,
}

/// Snapshot names handed out in one session
#[derive(Debug, Default)]
struct SnapshotNames {
    counter: u32,
    used: HashSet<String>,
}

impl SnapshotNames {
    /// File-safe name for a requested snapshot; blank requests take the next
    /// free `snapshot-<n>`
    fn resolve(&mut self, requested: &str) -> String {
        let name = if requested.trim().is_empty() {
            loop {
                self.counter += 1;
                let candidate = format!("snapshot-{}", self.counter);
                if !self.used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            sanitize(requested.strip_suffix(".png").unwrap_or(requested))
        };
        self.used.insert(name.clone());
        name
    }
}

struct ActiveSession {
    driver: SessionDriver,
    script: PathBuf,
    journal: Mutex<Vec<RawEvent>>,
    accepted: AtomicUsize,
    snapshots: Mutex<SnapshotNames>,
}

impl ActiveSession {
    fn apply(&self, event: &RawEvent, keep_journal: bool) -> Disposition {
        // Held across apply so the journal keeps delivery order
        let mut journal = self.journal.lock();
        let disposition = self.driver.apply(event);
        if disposition.is_accepted() {
            self.accepted.fetch_add(1, Ordering::Relaxed);
            if keep_journal {
                journal.push(event.without_payload());
            }
        }
        disposition
    }
}

pub struct Recorder {
    config: RecorderConfig,
    storage: ScriptStorage,
    capture: Option<Box<dyn ScreenCapture>>,
    active: Option<ActiveSession>,
}

impl Recorder {
    pub fn new(config: RecorderConfig, storage: ScriptStorage) -> Self {
        Self {
            config,
            storage,
            capture: None,
            active: None,
        }
    }

    pub fn with_capture(mut self, capture: Box<dyn ScreenCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn script_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.script.as_path())
    }

    /// Current script text, open steps closed
    pub fn render(&self) -> Option<String> {
        self.active.as_ref().map(|a| a.driver.render())
    }

    /// Begin a session; the (empty) script is written immediately
    pub fn start(&mut self) -> Result<PathBuf> {
        if let Some(active) = &self.active {
            return Err(Error::already_recording(&active.script.display().to_string()));
        }

        let script = self.storage.script_path(&self.config.test_name);
        let sink = FileSink::new(
            self.storage.clone(),
            script.clone(),
            self.config.formatter.clone(),
        );
        let driver = SessionDriver::spawn(
            SessionState::armed(),
            Box::new(sink),
            self.config.driver_config(),
        );
        if !driver.flush_now() {
            warn!(script = %script.display(), "initial script write failed");
        }

        info!(script = %script.display(), "recording started");
        self.active = Some(ActiveSession {
            driver,
            script: script.clone(),
            journal: Mutex::new(Vec::new()),
            accepted: AtomicUsize::new(0),
            snapshots: Mutex::new(SnapshotNames::default()),
        });
        Ok(script)
    }

    /// End the session: close the gate, force the final write, save the journal
    pub fn stop(&mut self) -> Result<RecordingSummary> {
        let active = self.active.take().ok_or_else(|| Error::not_recording("stop"))?;
        active.driver.with_state(SessionState::stop);

        let events = active.journal.into_inner();
        let (state, written) = active.driver.finish();
        if !written {
            warn!(script = %active.script.display(), "final script write failed");
        }

        let journal = if self.config.journal {
            match self.storage.save_journal(&self.config.test_name, &events) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "saving event journal failed");
                    None
                }
            }
        } else {
            None
        };

        info!(
            script = %active.script.display(),
            entries = state.log().len(),
            "recording stopped"
        );
        Ok(RecordingSummary {
            script: active.script,
            journal,
            events: active.accepted.into_inner(),
            entries: state.log().len(),
            closed_steps: state.open_steps().len(),
        })
    }

    /// Transport callback for raw events; resolves screenshot names
    pub fn handle_event(&self, mut event: RawEvent) -> Disposition {
        let Some(active) = &self.active else {
            return Disposition::Discarded(DiscardReason::NotRecording);
        };

        if let RawEvent::ScreenshotRequest {
            name, image_bytes, ..
        } = &mut event
        {
            *name = active.snapshots.lock().resolve(name.as_str());
            if !image_bytes.is_empty() {
                let saved = self
                    .storage
                    .save_snapshot(&self.config.test_name, name, image_bytes);
                if let Err(e) = saved {
                    warn!(error = %e, snapshot = %name, "saving snapshot failed");
                }
            }
        }

        active.apply(&event, self.config.journal)
    }

    /// Apply events from the transport until every sender is gone.
    /// Returns the number of accepted events.
    pub fn pump(&self, rx: &Receiver<RawEvent>) -> usize {
        rx.iter()
            .map(|event| self.handle_event(event))
            .filter(Disposition::is_accepted)
            .count()
    }

    pub fn record_step(&self, name: Option<&str>) -> Result<Disposition> {
        self.require("record_step")?;
        Ok(self.handle_event(RawEvent::step_start(name)))
    }

    /// Close the innermost step; without an open step this is a no-op
    pub fn end_step(&self) -> Result<Disposition> {
        self.require("end_step")?;
        Ok(self.handle_event(RawEvent::StepEnd))
    }

    pub fn record_comment(&self, text: &str) -> Result<Disposition> {
        self.require("record_comment")?;
        Ok(self.handle_event(RawEvent::comment(text)))
    }

    /// Capture and record a screenshot assertion. Returns the snapshot name,
    /// or `None` when capture failed and the screenshot was skipped.
    pub fn request_screenshot(&self, options: ScreenshotOptions) -> Result<Option<String>> {
        let active = self.require("request_screenshot")?;

        let name = active
            .snapshots
            .lock()
            .resolve(options.name.as_deref().unwrap_or_default());
        let locator = options.locator.unwrap_or_default();

        // Bytes are obtained before the state is touched
        let image_bytes = match &self.capture {
            Some(capture) => {
                let target = (!locator.is_empty()).then_some(locator.as_str());
                match capture.capture(target, options.region) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let err = Error::capture_failed(
                            target.unwrap_or("page"),
                            &format!("{:#}", e),
                        );
                        warn!(error = %err, "skipping screenshot");
                        return Ok(None);
                    }
                }
            }
            None => Vec::new(),
        };

        self.handle_event(RawEvent::ScreenshotRequest {
            locator,
            image_bytes,
            name: name.clone(),
            region: options.region,
        });
        Ok(Some(name))
    }

    fn require(&self, call: &str) -> Result<&ActiveSession> {
        self.active.as_ref().ok_or_else(|| Error::not_recording(call))
    }
}
