//! Session driver - applies events to the shared state and keeps the
//! persisted script current through a debounced background writer
//!
//! Lock order is writer, then state. Event application only takes the state
//! lock and never blocks inside it, so the writer always renders a log left
//! by a completed `apply`.

use crate::debounce::Debounce;
use crate::formatter::Formatter;
use crate::storage::ScriptStorage;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use scribe_core::{compile, Disposition, RawEvent, ScriptTemplate, SessionState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Destination of rendered scripts
pub trait ScriptSink: Send {
    fn write(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Writes the script file in place, then runs the optional formatter
pub struct FileSink {
    storage: ScriptStorage,
    path: PathBuf,
    formatter: Option<Formatter>,
}

impl FileSink {
    pub fn new(storage: ScriptStorage, path: PathBuf, formatter: Option<Formatter>) -> Self {
        Self {
            storage,
            path,
            formatter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScriptSink for FileSink {
    fn write(&mut self, text: &str) -> anyhow::Result<()> {
        self.storage.write_script(&self.path, text)?;
        if let Some(formatter) = &self.formatter {
            // Formatting is cosmetic; the unformatted script stays in place
            if let Err(e) = formatter.run(&self.path) {
                warn!(error = %e, "formatter failed, keeping unformatted script");
            }
        }
        Ok(())
    }
}

enum Signal {
    Touch,
    Stop,
}

struct Writer {
    sink: Box<dyn ScriptSink>,
    retries: u32,
    last: Option<String>,
    writes: u64,
}

impl Writer {
    fn write(&mut self, text: String) -> bool {
        if self.last.as_deref() == Some(text.as_str()) {
            return true;
        }
        for attempt in 0..=self.retries {
            match self.sink.write(&text) {
                Ok(()) => {
                    self.writes += 1;
                    debug!(bytes = text.len(), writes = self.writes, "script written");
                    self.last = Some(text);
                    return true;
                }
                Err(e) => warn!(error = %e, attempt, "script write failed"),
            }
        }
        false
    }
}

struct Shared {
    state: Mutex<SessionState>,
    writer: Mutex<Writer>,
    template: ScriptTemplate,
}

impl Shared {
    fn flush(&self) -> bool {
        let mut writer = self.writer.lock();
        let text = {
            let state = self.state.lock();
            compile(state.log(), state.open_steps(), &self.template)
        };
        writer.write(text)
    }
}

/// Driver knobs
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub delay: Duration,
    pub template: ScriptTemplate,
    /// Extra attempts after a failed write
    pub retries: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            delay: crate::debounce::DEFAULT_DELAY,
            template: ScriptTemplate::default(),
            retries: 1,
        }
    }
}

pub struct SessionDriver {
    shared: Arc<Shared>,
    tx: Sender<Signal>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SessionDriver {
    pub fn spawn(state: SessionState, sink: Box<dyn ScriptSink>, config: DriverConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            writer: Mutex::new(Writer {
                sink,
                retries: config.retries,
                last: None,
                writes: 0,
            }),
            template: config.template,
        });
        let (tx, rx) = unbounded();

        let worker_shared = shared.clone();
        let debounce = Debounce::new(config.delay);
        let worker = thread::spawn(move || run_worker(worker_shared, rx, debounce));

        Self {
            shared,
            tx,
            worker: Some(worker),
        }
    }

    /// Apply one event; accepted events schedule a write
    pub fn apply(&self, event: &RawEvent) -> Disposition {
        let disposition = self.shared.state.lock().apply(event);
        if disposition.is_accepted() {
            self.touch();
        }
        disposition
    }

    /// Run `f` against the state under its lock
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut *self.shared.state.lock())
    }

    /// Schedule a debounced write
    pub fn touch(&self) {
        let _ = self.tx.send(Signal::Touch);
    }

    /// Render and write right now, bypassing the debounce
    pub fn flush_now(&self) -> bool {
        self.shared.flush()
    }

    /// The script text as it would be written now
    pub fn render(&self) -> String {
        let state = self.shared.state.lock();
        compile(state.log(), state.open_steps(), &self.shared.template)
    }

    /// Stop the timer and force the terminal write
    pub fn finish(mut self) -> (SessionState, bool) {
        let written = self.shutdown();
        let state = self.shared.state.lock().clone();
        (state, written)
    }

    fn shutdown(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return true;
        };
        let _ = self.tx.send(Signal::Stop);
        if worker.join().is_err() {
            warn!("script writer thread panicked");
        }
        self.shared.flush()
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: Arc<Shared>, rx: Receiver<Signal>, mut debounce: Debounce) {
    loop {
        let signal = match debounce.remaining(Instant::now()) {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(signal) => Some(signal),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Signal::Stop),
            },
            None => Some(rx.recv().unwrap_or(Signal::Stop)),
        };

        match signal {
            Some(Signal::Touch) => debounce.schedule(Instant::now()),
            // The terminal write happens on the stopping thread
            Some(Signal::Stop) => break,
            None => {}
        }

        if debounce.fire(Instant::now()) {
            shared.flush();
        }
    }
}
