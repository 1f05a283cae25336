use std::io::{self, Stderr, Write};
use std::sync::Mutex;

use colored::Colorize;
use gel_core::{Rule, Subscriber, TraceEvent};

/// Human-readable trace: `<namespace>:<line>: <rule> <text>` in yellow.
pub struct ConsoleSubscriber<W: Write + Send = Stderr> {
    writer: Mutex<W>,
}

impl ConsoleSubscriber<Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ConsoleSubscriber<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn format(event: &TraceEvent) -> String {
        let position = match event.rule {
            Rule::EndOfStream => "-999".to_string(),
            _ => format!("{}:{}", event.namespace, event.position),
        };
        let text = event.emitted.trim_end().replace('\n', "\\n");
        if text.is_empty() {
            format!("{position}: {}", event.rule)
        } else {
            format!("{position}: {} {text}", event.rule)
        }
    }
}

impl<W: Write + Send> Subscriber for ConsoleSubscriber<W> {
    fn on_trace(&self, event: TraceEvent) {
        let line = Self::format(&event);
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line.as_str().yellow());
        }
    }

    fn on_complete(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
