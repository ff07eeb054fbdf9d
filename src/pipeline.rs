//! Single-writer frame pipeline
//!
//! One worker thread owns the session controller and the composed text;
//! frames and text commands arrive over a bounded channel and status
//! snapshots leave through the [`SharedStatus`] slot. Capture and the
//! classifier calls may block, which only ever stalls this thread, never a
//! rendering or interactive path. Shutdown is a hard stop: queued frames
//! are abandoned, nothing in flight is awaited.

use crate::classify::{ShapeClassifier, ToneClassifier};
use crate::config::PipelineConfig;
use crate::hand::FrameInput;
use crate::session::GestureSessionController;
use crate::status::{SharedStatus, StatusSnapshot};
use crate::{Result, SignflowError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Commands processed by the pipeline worker
#[derive(Debug)]
pub enum PipelineCommand {
    /// Process one frame of tracker output
    Frame(FrameInput),
    /// Finalize the open word into the sentence
    FinalizeWord,
    /// Delete the last composed character
    DeleteLast,
    /// Clear all composed text
    ClearText,
    /// Stop the worker immediately, discarding queued work
    Shutdown,
}

/// Entry point wiring a controller to a worker thread
pub struct FramePipeline;

impl FramePipeline {
    /// Create a pipeline over the given classifiers
    ///
    /// Returns the handle for feeding frames and commands, and the worker to
    /// be started with [`PipelineWorker::start`].
    pub fn new(
        config: PipelineConfig,
        shape: Box<dyn ShapeClassifier>,
        tone: Box<dyn ToneClassifier>,
    ) -> Result<(PipelineHandle, PipelineWorker)> {
        let controller = GestureSessionController::new(config.session.clone(), shape, tone)?;
        let (command_tx, command_rx) = bounded(config.channel_capacity);
        let status = SharedStatus::new();

        let handle = PipelineHandle {
            command_tx,
            status: status.clone(),
        };
        let worker = PipelineWorker {
            controller,
            command_rx,
            status,
        };
        Ok((handle, worker))
    }
}

/// Handle for controlling the pipeline from the capture loop and UI
#[derive(Clone)]
pub struct PipelineHandle {
    command_tx: Sender<PipelineCommand>,
    status: SharedStatus,
}

impl PipelineHandle {
    /// Feed one frame; drops it (returning false) when the worker is busy
    ///
    /// Dropping is deliberate: the capture loop must never block on
    /// inference, and the session only cares about the freshest observation.
    pub fn send_frame(&self, frame: FrameInput) -> bool {
        match self.command_tx.try_send(PipelineCommand::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("frame dropped: pipeline busy");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("frame dropped: pipeline stopped");
                false
            }
        }
    }

    /// Finalize the open word
    pub fn finalize_word(&self) -> Result<()> {
        self.send(PipelineCommand::FinalizeWord)
    }

    /// Delete the last composed character
    pub fn delete_last(&self) -> Result<()> {
        self.send(PipelineCommand::DeleteLast)
    }

    /// Clear all composed text
    pub fn clear_text(&self) -> Result<()> {
        self.send(PipelineCommand::ClearText)
    }

    /// Request an immediate stop
    pub fn shutdown(&self) -> Result<()> {
        self.send(PipelineCommand::Shutdown)
    }

    fn send(&self, command: PipelineCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SignflowError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Latest published status snapshot
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// The shared status slot, for handing to an observer
    pub fn shared_status(&self) -> SharedStatus {
        self.status.clone()
    }
}

/// Worker owning the controller; runs until shutdown or disconnect
pub struct PipelineWorker {
    controller: GestureSessionController,
    command_rx: Receiver<PipelineCommand>,
    status: SharedStatus,
}

impl PipelineWorker {
    /// Start the worker thread
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) {
        info!("frame pipeline started");
        let mut last_frame_at: Option<Instant> = None;
        let mut fps = 0.0f32;

        loop {
            match self.command_rx.recv() {
                Ok(PipelineCommand::Frame(frame)) => {
                    if let Some(prev) = last_frame_at {
                        let dt = frame.at.duration_since(prev).as_secs_f32();
                        if dt > 0.0 {
                            fps = 1.0 / dt;
                        }
                    }
                    last_frame_at = Some(frame.at);
                    self.controller.process_frame(&frame);
                    self.status.publish(self.controller.snapshot(fps));
                }
                Ok(PipelineCommand::FinalizeWord) => {
                    self.controller.finalize_word();
                    self.status.publish(self.controller.snapshot(fps));
                }
                Ok(PipelineCommand::DeleteLast) => {
                    self.controller.delete_last();
                    self.status.publish(self.controller.snapshot(fps));
                }
                Ok(PipelineCommand::ClearText) => {
                    self.controller.clear_text();
                    self.status.publish(self.controller.snapshot(fps));
                }
                Ok(PipelineCommand::Shutdown) => {
                    info!("pipeline shutdown requested");
                    break;
                }
                Err(_) => {
                    warn!("pipeline command channel disconnected");
                    break;
                }
            }
        }
        info!("frame pipeline stopped");
    }
}
