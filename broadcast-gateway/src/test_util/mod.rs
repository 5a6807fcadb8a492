//! Test doubles for the radio layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::radio::{MeshRadio, RadioError};

/// A text message recorded by `MockRadio`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub text: String,
    pub destination: String,
}

/// In-memory radio that records sends and can be told to fail.
#[derive(Debug, Default)]
pub struct MockRadio {
    sent: Mutex<Vec<SentText>>,
    send_error: Option<String>,
    close_error: Option<String>,
    closed: AtomicBool,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send_text` fails with an I/O error carrying `message`.
    pub fn failing_send(message: &str) -> Self {
        Self {
            send_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// `close` fails with an I/O error carrying `message`.
    pub fn failing_close(message: &str) -> Self {
        Self {
            close_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentText> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn io_error(message: &str) -> RadioError {
    RadioError::Io(std::io::Error::new(std::io::ErrorKind::Other, message.to_string()))
}

#[async_trait]
impl MeshRadio for MockRadio {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn send_text(&self, text: &str, destination: &str) -> Result<(), RadioError> {
        if self.is_closed() {
            return Err(RadioError::Closed);
        }
        if let Some(message) = &self.send_error {
            return Err(io_error(message));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentText {
                text: text.to_string(),
                destination: destination.to_string(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), RadioError> {
        self.closed.store(true, Ordering::SeqCst);
        match &self.close_error {
            Some(message) => Err(io_error(message)),
            None => Ok(()),
        }
    }
}
