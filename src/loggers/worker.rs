use std::io::Write;
use tokio::sync::mpsc;
use crate::loggers::core::{LogRecord, LogSink};

pub struct LogWorker {
    receiver: mpsc::Receiver<LogRecord>,
    sink: LogSink,
}

impl LogWorker {
    pub fn new(receiver: mpsc::Receiver<LogRecord>, sink: LogSink) -> Self {
        Self { receiver, sink }
    }

    pub async fn run(mut self) {
        while let Some(record) = self.receiver.recv().await {
            let Ok(line) = serde_json::to_string(&record) else {
                continue;
            };
            // write errors are dropped
            let _ = match self.sink {
                LogSink::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
                LogSink::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
            };
        }
    }
}
