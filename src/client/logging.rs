//! Leveled logging capability injected into the client.

use std::fmt;
use tracing::Level;

/// Sink for client log messages.
///
/// Only [`log`](Logger::log) is required; the leveled helpers forward to it with
/// an empty context. `tracing` has five levels, so `notice` logs at INFO and
/// `critical`, `alert` and `emergency` log at ERROR with a `severity` entry.
pub trait Logger: Send + Sync {
    /// Record `message` at `level` with key/value `context`
    fn log(&self, level: Level, message: &str, context: &[(&str, String)]);

    /// Debug-level message
    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message, &[]);
    }

    /// Info-level message
    fn info(&self, message: &str) {
        self.log(Level::INFO, message, &[]);
    }

    /// Normal but significant event
    fn notice(&self, message: &str) {
        self.log(Level::INFO, message, &[("severity", "notice".to_string())]);
    }

    /// Warning
    fn warn(&self, message: &str) {
        self.log(Level::WARN, message, &[]);
    }

    /// Error
    fn error(&self, message: &str) {
        self.log(Level::ERROR, message, &[]);
    }

    fn critical(&self, message: &str) {
        self.log(Level::ERROR, message, &[("severity", "critical".to_string())]);
    }

    fn alert(&self, message: &str) {
        self.log(Level::ERROR, message, &[("severity", "alert".to_string())]);
    }

    fn emergency(&self, message: &str) {
        self.log(Level::ERROR, message, &[("severity", "emergency".to_string())]);
    }
}

/// `key=value` pairs, space separated.
struct Context<'a>(&'a [(&'a str, String)]);

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Forwards to `tracing` under the `http_rpc` target, with the context in a
/// `context` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, context: &[(&str, String)]) {
        let context = Context(context);
        if level == Level::ERROR {
            tracing::error!(target: "http_rpc", context = %context, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: "http_rpc", context = %context, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: "http_rpc", context = %context, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: "http_rpc", context = %context, "{}", message);
        } else {
            tracing::trace!(target: "http_rpc", context = %context, "{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Captured(Mutex<Vec<(Level, String, String)>>);

    impl Logger for Captured {
        fn log(&self, level: Level, message: &str, context: &[(&str, String)]) {
            self.0
                .lock()
                .push((level, message.to_string(), Context(context).to_string()));
        }
    }

    #[test]
    fn test_leveled_helpers_forward() {
        let logger = Captured::default();
        logger.debug("a");
        logger.warn("b");
        logger.error("c");

        let lines = logger.0.lock();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], (Level::DEBUG, "a".to_string(), String::new()));
        assert_eq!(lines[1].0, Level::WARN);
        assert_eq!(lines[2].0, Level::ERROR);
    }

    #[test]
    fn test_extra_severities_keep_their_name() {
        let logger = Captured::default();
        logger.notice("n");
        logger.critical("c");
        logger.emergency("e");

        let lines = logger.0.lock();
        assert_eq!(lines[0], (Level::INFO, "n".to_string(), "severity=notice".to_string()));
        assert_eq!(lines[1].0, Level::ERROR);
        assert_eq!(lines[1].2, "severity=critical");
        assert_eq!(lines[2].2, "severity=emergency");
    }

    #[test]
    fn test_context_rendering() {
        let context = [("method", "echo".to_string()), ("code", "8".to_string())];
        assert_eq!(Context(&context).to_string(), "method=echo code=8");
        assert_eq!(Context(&[]).to_string(), "");
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        TracingLogger.info("no subscriber installed");
        TracingLogger.log(Level::TRACE, "dropped", &[("method", "ping".to_string())]);
    }
}
