//! Background save queue.
//!
//! A single worker thread owns the [`Writer`] and the adapter. Saves are
//! submitted as owned [`Database`] snapshots and run strictly one at a time
//! in submission order, so two saves never write the same output root
//! concurrently. Editing continues while a save is in flight because the
//! worker only ever sees the snapshot it was handed.

use std::{
    io,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{debug, error, warn};

use sextant_core::model::Database;

use crate::{
    SextantError,
    codegen::Adapter,
    persist::{SaveReport, Writer},
};

type SaveResult = Result<SaveReport, SextantError>;

struct SaveJob {
    database: Database,
    reply: Sender<SaveResult>,
}

/// Handle to a submitted save.
#[derive(Debug)]
pub struct SaveTicket {
    receiver: Receiver<SaveResult>,
}

impl SaveTicket {
    /// Block until the save has finished and return its result.
    ///
    /// # Errors
    ///
    /// Returns the save's own error, or [`SextantError::QueueClosed`] if the
    /// worker went away before running it.
    pub fn wait(self) -> SaveResult {
        self.receiver
            .recv()
            .map_err(|_| SextantError::QueueClosed)?
    }
}

/// Serializes saves onto one background thread.
///
/// Dropping the queue stops accepting work, lets the worker finish every
/// save already submitted, and joins it.
#[derive(Debug)]
pub struct SaveQueue {
    sender: Option<Sender<SaveJob>>,
    worker: Option<JoinHandle<()>>,
}

impl SaveQueue {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn new(writer: Writer, adapter: Box<dyn Adapter + Send + Sync>) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<SaveJob>();
        let worker = thread::Builder::new()
            .name("sextant-save".to_string())
            .spawn(move || run_worker(&writer, adapter.as_ref(), receiver))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a save of `database`.
    pub fn submit(&self, database: Database) -> SaveTicket {
        let (reply, receiver) = mpsc::channel();
        let job = SaveJob { database, reply };

        let sent = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(job).is_ok());
        if !sent {
            warn!("Save submitted to a stopped queue");
        }
        SaveTicket { receiver }
    }
}

impl Drop for SaveQueue {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Save worker panicked");
            }
        }
    }
}

fn run_worker(writer: &Writer, adapter: &dyn Adapter, receiver: Receiver<SaveJob>) {
    while let Ok(SaveJob { database, reply }) = receiver.recv() {
        let result = writer.save(&database, adapter);
        if let Err(err) = &result {
            warn!(err:%; "Save failed");
        }
        // The submitter may have dropped its ticket.
        let _ = reply.send(result);
    }
    debug!("Save worker stopped");
}
