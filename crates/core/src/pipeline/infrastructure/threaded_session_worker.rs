use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::detection::domain::detection_provider::FrameDetections;
use crate::pipeline::process_frame_use_case::{EngineError, FrameOutcome, ProcessFrameUseCase};
use crate::recognition::domain::gallery::Gallery;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

pub type OutcomeResult = Result<FrameOutcome, EngineError>;

#[derive(Error, Debug, PartialEq)]
pub enum WorkerError {
    #[error("session worker has stopped")]
    Disconnected,
    #[error("session worker thread panicked")]
    Panicked,
}

enum SessionCommand {
    Frame {
        frame: FrameDetections,
        excluded: HashSet<String>,
    },
    ReplaceGallery(Arc<Gallery>),
    Reset,
}

/// Runs one session on a dedicated owner thread.
///
/// Layout: `caller → [bounded commands] → owner (use case) → [outcomes] → caller`
///
/// The aggregation window never leaves the owner thread, so callers on any
/// thread can feed frames and swap galleries without locking. Commands are
/// applied strictly in submission order.
pub struct ThreadedSessionWorker {
    commands: Option<Sender<SessionCommand>>,
    outcomes: Receiver<OutcomeResult>,
    handle: Option<JoinHandle<ProcessFrameUseCase>>,
}

impl ThreadedSessionWorker {
    pub fn spawn(use_case: ProcessFrameUseCase) -> Self {
        Self::with_capacity(use_case, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(use_case: ProcessFrameUseCase, capacity: usize) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::bounded(capacity.max(1));
        // Unbounded so a caller that submits before draining cannot deadlock
        // against a full command queue.
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        let handle = spawn_owner(use_case, command_rx, outcome_tx);
        Self {
            commands: Some(command_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, frame: FrameDetections) -> Result<(), WorkerError> {
        self.submit_excluding(frame, HashSet::new())
    }

    pub fn submit_excluding(
        &self,
        frame: FrameDetections,
        excluded: HashSet<String>,
    ) -> Result<(), WorkerError> {
        self.send(SessionCommand::Frame { frame, excluded })
    }

    /// Frames submitted after this call are matched against `gallery`.
    pub fn replace_gallery(&self, gallery: Arc<Gallery>) -> Result<(), WorkerError> {
        self.send(SessionCommand::ReplaceGallery(gallery))
    }

    pub fn reset(&self) -> Result<(), WorkerError> {
        self.send(SessionCommand::Reset)
    }

    /// One outcome per submitted frame, in submission order.
    pub fn outcomes(&self) -> &Receiver<OutcomeResult> {
        &self.outcomes
    }

    /// Stops accepting work, waits for queued frames to finish, and hands
    /// back the use case with any outcomes not yet received.
    pub fn shutdown(mut self) -> Result<(ProcessFrameUseCase, Vec<OutcomeResult>), WorkerError> {
        drop(self.commands.take());
        let handle = self.handle.take().ok_or(WorkerError::Disconnected)?;
        let use_case = handle.join().map_err(|_| WorkerError::Panicked)?;
        let pending = self.outcomes.try_iter().collect();
        Ok((use_case, pending))
    }

    fn send(&self, command: SessionCommand) -> Result<(), WorkerError> {
        self.commands
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(command)
            .map_err(|_| WorkerError::Disconnected)
    }
}

impl Drop for ThreadedSessionWorker {
    fn drop(&mut self) {
        drop(self.commands.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Session worker thread panicked");
            }
        }
    }
}

fn spawn_owner(
    mut use_case: ProcessFrameUseCase,
    command_rx: Receiver<SessionCommand>,
    outcome_tx: Sender<OutcomeResult>,
) -> JoinHandle<ProcessFrameUseCase> {
    std::thread::spawn(move || {
        for command in command_rx {
            match command {
                SessionCommand::Frame { frame, excluded } => {
                    let result = use_case.execute_excluding(&frame, &excluded);
                    if let Err(e) = &result {
                        log::warn!("Frame {} failed: {e}", frame.index);
                    }
                    if outcome_tx.send(result).is_err() {
                        break;
                    }
                }
                SessionCommand::ReplaceGallery(gallery) => use_case.replace_gallery(gallery),
                SessionCommand::Reset => use_case.reset(),
            }
        }
        use_case.finish();
        use_case
    })
}
