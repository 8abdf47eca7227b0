use crate::library::logger::interface::{Level, Logger};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LoggerConsole {
    namespace: Option<String>,
    timezone: chrono::FixedOffset,
}

impl LoggerConsole {
    pub fn new(timezone: chrono::FixedOffset) -> Self {
        Self {
            namespace: None,
            timezone,
        }
    }

    fn namespaced(&self, namespace: &str) -> Self {
        let namespace = match &self.namespace {
            Some(current) => format!("{}:{}", current, namespace),
            None => namespace.to_string(),
        };
        Self {
            namespace: Some(namespace),
            timezone: self.timezone,
        }
    }

    fn format_line(&self, level: Level, message: &str) -> String {
        let local_time = Utc::now().with_timezone(&self.timezone);
        let formatted = local_time.format("%Y-%m-%d %H:%M:%S%.3f");
        match &self.namespace {
            Some(namespace) => format!("[{}] {} {}: {}", formatted, level, namespace, message),
            None => format!("[{}] {} {}", formatted, level, message),
        }
    }
}

impl Logger for LoggerConsole {
    fn log(&self, level: Level, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let line = self.format_line(level, message);
        match level {
            Level::Info => println!("{}", line),
            Level::Warn | Level::Error => eprintln!("{}", line),
        }
        Ok(())
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        Arc::new(self.namespaced(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_namespaces_are_joined_with_colons() {
        let line = LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap())
            .namespaced("capture_flow")
            .namespaced("effect")
            .format_line(Level::Warn, "model not loaded");

        assert!(line.ends_with("WARN capture_flow:effect: model not loaded"));
    }

    #[test]
    fn line_without_namespace_has_level_and_message() {
        let logger = LoggerConsole::new(chrono::FixedOffset::east_opt(3600).unwrap());
        let line = logger.format_line(Level::Info, "hello");

        assert!(line.starts_with('['));
        assert!(line.ends_with("] INFO hello"));
    }
}
