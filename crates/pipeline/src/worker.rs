//! Analysis execution in a background thread.
//!
//! The run happens on a dedicated `std::thread` and its messages come back
//! through a `crossbeam_channel`. Dropping the [`AnalysisHandle`] abandons
//! the run: the worker keeps going but its sends are discarded.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use nitrogis_core::{Progress, Result};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::orchestrator::execute;
use crate::protocol::{AnalysisMessage, AnalysisRequest};

/// Receiving end of a background analysis run
#[derive(Debug)]
pub struct AnalysisHandle {
    receiver: Receiver<AnalysisMessage>,
    thread: Option<JoinHandle<()>>,
}

/// Start an analysis on a new thread.
///
/// Fails only if the thread cannot be spawned; every analysis failure
/// arrives as an `Error` message instead.
pub fn spawn_analysis(request: AnalysisRequest, config: AnalysisConfig) -> Result<AnalysisHandle> {
    let (tx, rx) = crossbeam_channel::unbounded();

    let thread = thread::Builder::new()
        .name("nitrogis-analysis".into())
        .spawn(move || run_worker(&request, &config, tx))?;

    Ok(AnalysisHandle {
        receiver: rx,
        thread: Some(thread),
    })
}

fn run_worker(request: &AnalysisRequest, config: &AnalysisConfig, tx: Sender<AnalysisMessage>) {
    let start = Instant::now();
    debug!("Analysis worker started");
    execute(request, config, |msg| {
        let _ = tx.send(msg);
    });
    debug!(
        "Analysis worker finished in {:.2}s",
        start.elapsed().as_secs_f64()
    );
}

impl AnalysisHandle {
    pub fn receiver(&self) -> &Receiver<AnalysisMessage> {
        &self.receiver
    }

    /// Block for the next message. `None` once the worker has finished and
    /// every message was received.
    pub fn recv(&self) -> Option<AnalysisMessage> {
        self.receiver.recv().ok()
    }

    /// Next message if one is ready
    pub fn try_recv(&self) -> Option<AnalysisMessage> {
        self.receiver.try_recv().ok()
    }

    /// Blocking iterator over the remaining messages
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, AnalysisMessage> {
        self.receiver.iter()
    }

    /// Block until the run ends, passing progress to `on_progress`, and
    /// return the terminal message.
    ///
    /// A worker that stops without a terminal message yields an `Error`.
    pub fn wait(mut self, mut on_progress: impl FnMut(Progress)) -> AnalysisMessage {
        let mut terminal = None;
        for msg in self.receiver.iter() {
            match msg {
                AnalysisMessage::Progress(p) => on_progress(p),
                other => {
                    terminal = Some(other);
                    break;
                }
            }
        }

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        terminal.unwrap_or_else(|| {
            AnalysisMessage::error("Analysis worker stopped without sending a result")
        })
    }
}
