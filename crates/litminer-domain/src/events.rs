//! Progress/log channel from the pipeline to its consumer
//!
//! Many producers (orchestrator, workers, LLM clients), one consumer (the CLI
//! or any other front end). The channel is unbounded so a slow consumer never
//! stalls the workers; the consumer drains it on its own schedule.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verbose diagnostics
    Debug,
    /// Normal status
    Info,
    /// Degraded but continuing
    Warn,
    /// A failure the operator should look at
    Error,
}

impl LogLevel {
    /// Lowercase level name
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// A message on the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Human-readable status line
    Log {
        /// Severity
        level: LogLevel,
        /// Message text
        message: String,
    },
    /// Structured progress: `done` of `total` records finished
    Progress {
        /// Records finished so far in this run
        done: usize,
        /// Records selected for this run
        total: usize,
    },
}

/// Create a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer handle; cheap to clone and hand to every component
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<PipelineEvent>,
}

impl EventSender {
    /// A sender whose receiver is already gone; events are only traced
    pub fn detached() -> Self {
        let (sender, _) = event_channel();
        sender
    }

    /// Emit a log line and mirror it to `tracing`
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        // Consumer gone is not an error for the pipeline
        let _ = self.tx.send(PipelineEvent::Log { level, message });
    }

    /// Emit an info line
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Emit a warning line
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Emit an error line
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Emit a debug line
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    /// Emit a progress event
    pub fn progress(&self, done: usize, total: usize) {
        let _ = self.tx.send(PipelineEvent::Progress { done, total });
    }

    /// Whether the consumer has hung up
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle
#[derive(Debug)]
pub struct EventReceiver {
    rx: UnboundedReceiver<PipelineEvent>,
}

impl EventReceiver {
    /// Take every event currently queued without waiting
    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Wait for the next event; `None` once every sender is dropped
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_fifo_order() {
        let (tx, mut rx) = event_channel();
        tx.info("loading");
        tx.progress(1, 3);
        tx.warn("slow");

        let events = rx.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            PipelineEvent::Log { level: LogLevel::Info, message: "loading".into() }
        );
        assert_eq!(events[1], PipelineEvent::Progress { done: 1, total: 3 });
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = event_channel();
        drop(rx);
        assert!(tx.is_closed());
        tx.error("nobody listening");
        tx.progress(1, 1);
    }

    #[test]
    fn test_detached_sender() {
        let tx = EventSender::detached();
        assert!(tx.is_closed());
        tx.info("traced only");
    }

    #[tokio::test]
    async fn test_multiple_producers() {
        let (tx, mut rx) = event_channel();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tx = tx.clone();
                tokio::spawn(async move { tx.progress(i, 4) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        drop(tx);

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 4);
    }
}
