use tokio::sync::mpsc;
use crate::loggers::worker::LogWorker;
use crate::loggers::core::{LogLevel, LogRecord, LogSink};
use crate::configs::VistaConfig;
use crate::core::error::VistaError;
use std::sync::Arc;
use arc_swap::ArcSwap;

pub struct LoggerConfig {
    pub level: LogLevel,
    pub component: String,
}

#[derive(Clone)]
pub struct Logger {
    pub sender: mpsc::Sender<LogRecord>,
    pub config: Arc<ArcSwap<LoggerConfig>>,
}

impl Logger {
    /// Swaps the minimum level without rebuilding the worker.
    pub fn set_level(&self, level: LogLevel) {
        let component = self.config.load().component.clone();
        self.config.store(Arc::new(LoggerConfig { level, component }));
    }
}

pub struct LoggerBuilder {
    component: String,
    level: LogLevel,
    sink: LogSink,
    buffer_size: usize,
}

impl LoggerBuilder {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            level: LogLevel::Info,
            sink: LogSink::Stdout,
            buffer_size: 1024,
        }
    }

    /// Starts from the site's configured `log_level`.
    pub fn from_config(component: &str, config: &VistaConfig) -> Self {
        Self::new(component).with_level(config.log_level)
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// Spawns the writer task; must be called inside a tokio runtime.
    pub fn build(self) -> Result<Logger, VistaError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| VistaError::Internal(format!("Logger needs a tokio runtime: {}", e)))?;

        let (tx, rx) = mpsc::channel(self.buffer_size);
        let config = Arc::new(ArcSwap::from_pointee(LoggerConfig {
            level: self.level,
            component: self.component,
        }));

        let worker = LogWorker::new(rx, self.sink);
        handle.spawn(async move {
            worker.run().await;
        });

        Ok(Logger { sender: tx, config })
    }
}
