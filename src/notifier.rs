//! Notification sinks for human-readable progress and error messages.
//!
//! The engine receives its notifier at construction and never formats output for a specific
//! display surface.

/// Receives messages emitted by the engine.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

impl<F: FnMut(&str)> Notifier for F {
    fn notify(&mut self, message: &str) {
        self(message)
    }
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&mut self, _message: &str) {}
}

/// Collects messages in order.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns the most recent message.
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Notifier for MessageLog {
    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, message: &str) {
        tracing::info!(target: "rtm::notify", "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_notifier() {
        let mut seen = Vec::new();
        {
            let mut notifier = |message: &str| seen.push(message.to_string());
            notifier.notify("hello");
            notifier.notify("world");
        }
        assert_eq!(seen, vec!["hello", "world"]);
    }

    #[test]
    fn test_message_log() {
        let mut log = MessageLog::new();
        log.notify("first");
        log.notify("second");

        assert_eq!(log.messages(), &["first", "second"]);
        assert_eq!(log.last(), Some("second"));

        log.clear();
        assert!(log.messages().is_empty());
        assert_eq!(log.last(), None);
    }

    #[test]
    fn test_tracing_notifier_forwards_to_subscriber() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut notifier = TracingNotifier;
            notifier.notify("Stage 1 finished.");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("rtm::notify"));
        assert!(output.contains("Stage 1 finished."));
    }
}
