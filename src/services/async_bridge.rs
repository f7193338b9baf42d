//! Async Bridge: communication between the Tokio runtime and the sync editor loop
//!
//! - Tokio runs Resolution Service calls
//! - The editor loop stays synchronous (input, document edits, rendering)
//! - A std::sync::mpsc channel carries results back to the loop, which drains
//!   it once per frame

use crate::query::RequestId;
use crate::services::resolution::ResolutionError;
use std::sync::mpsc;

/// Messages sent from async tasks to the editor loop
#[derive(Debug)]
pub enum AsyncMessage {
    /// A Resolution Service call finished
    ResolutionSettled {
        request_id: RequestId,
        result: Result<String, ResolutionError>,
    },
}

/// Channel pair shared by the editor loop and its async tasks
#[derive(Clone)]
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    receiver: std::sync::Arc<std::sync::Mutex<mpsc::Receiver<AsyncMessage>>>,
}

impl AsyncBridge {
    /// Create a new async bridge with an unbounded channel
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: std::sync::Arc::new(std::sync::Mutex::new(receiver)),
        }
    }

    /// Get a cloneable sender for async tasks
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// Drain all pending messages without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        let mut messages = Vec::new();
        if let Ok(receiver) = self.receiver.lock() {
            while let Ok(msg) = receiver.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
