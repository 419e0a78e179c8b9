// ABOUTME: Consumer contract for delivered readings and the contexts deliveries run on
// ABOUTME: Inline execution or a dedicated named thread draining a job channel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Delivery
//!
//! A [`FollowerConsumer`] receives the finished sequence of each successful
//! cycle. It declares the [`ExecutionContext`] it must be called on; the
//! orchestrator hands the call to that context instead of invoking it directly.

use chrono::{DateTime, Utc};
use follower_core::errors::{AppError, AppResult};
use follower_core::models::ChronoSequence;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Unit of work handed to an execution context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where consumer callbacks run
pub trait ExecutionContext: Send + Sync {
    /// Name for logs
    fn name(&self) -> &str;

    /// Run `job` on this context
    ///
    /// # Errors
    ///
    /// Returns an internal error when the context no longer accepts work
    fn dispatch(&self, job: Job) -> AppResult<()>;
}

/// Runs jobs immediately on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn dispatch(&self, job: Job) -> AppResult<()> {
        job();
        Ok(())
    }
}

/// Runs jobs in order on one named OS thread
#[derive(Debug)]
pub struct DedicatedThreadContext {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DedicatedThreadContext {
    /// Start the thread
    ///
    /// # Errors
    ///
    /// Returns an internal error if the thread cannot be spawned
    pub fn spawn(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
            })
            .map_err(|e| {
                AppError::internal(format!("Failed to start delivery thread '{name}'")).with_source(e)
            })?;

        debug!(thread = %name, "Delivery thread started");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop accepting jobs, run the queued ones and wait for the thread to end
    pub fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let handle = self.handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(thread = %self.name, "Delivery thread panicked");
            }
        }
    }
}

impl ExecutionContext for DedicatedThreadContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch(&self, job: Job) -> AppResult<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| AppError::internal("Delivery queue lock poisoned"))?;

        sender
            .as_ref()
            .ok_or_else(|| AppError::internal(format!("Delivery thread '{}' is shut down", self.name)))?
            .send(job)
            .map_err(|_| AppError::internal(format!("Delivery thread '{}' has stopped", self.name)))
    }
}

impl Drop for DedicatedThreadContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Receiver of the normalized readings of each successful cycle
pub trait FollowerConsumer: Send + Sync + 'static {
    /// Readings newest first, with the active sensor's serial number and start time
    fn on_follower_info_received(
        &self,
        readings: ChronoSequence,
        serial_number: Option<String>,
        sensor_start: Option<DateTime<Utc>>,
    );

    /// Context this consumer must be called on; the calling task by default
    fn execution_context(&self) -> Arc<dyn ExecutionContext> {
        Arc::new(InlineContext)
    }
}
