//! Event handling and progress display

use console::{Style, Term};
use graft_events::{AppEvent, DownloadEvent, GeneralEvent, ResolverEvent};
use graft_types::Severity;

/// Renders library events on stderr while a command runs
pub struct EventHandler {
    term: Term,
    /// JSON mode keeps stderr quiet apart from errors
    quiet: bool,
    debug: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(quiet: bool, debug: bool) -> Self {
        Self {
            term: Term::stderr(),
            quiet,
            debug,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        tracing::trace!(target: "graft::events", level = %event.log_level(), origin = event.log_target(), "event");
        match event {
            AppEvent::General(event) => self.handle_general(event),
            AppEvent::Download(event) => self.handle_download(event),
            AppEvent::Resolver(event) => self.handle_resolver(event),
        }
    }

    fn handle_general(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("{message} ({context})")),
                None => self.show_warning(&message),
            },
            GeneralEvent::Error { message } => self.show_error(&message),
            GeneralEvent::DebugLog { message } => self.show_debug(&message),
            GeneralEvent::OperationStarted { operation } => self.show_status(&operation),
            GeneralEvent::OperationCompleted { operation, success } => {
                if success {
                    self.show_status(&format!("{operation} done"));
                } else {
                    self.show_warning(&format!("{operation} failed"));
                }
            }
        }
    }

    fn handle_download(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { url, .. } => self.show_debug(&format!("GET {url}")),
            DownloadEvent::Completed { file, size, .. } => {
                self.show_status(&format!("Downloaded {file} ({size} bytes)"));
            }
            // Another repository may still serve the file
            DownloadEvent::Failed { url, failure, .. } => {
                self.show_debug(&format!("{url}: {}", failure.message));
            }
            DownloadEvent::Retrying {
                url,
                attempt,
                max_attempts,
                backoff_delay,
            } => self.show_debug(&format!(
                "retrying {url} ({attempt}/{max_attempts}) in {}ms",
                backoff_delay.as_millis()
            )),
            DownloadEvent::ChecksumMismatch {
                url,
                expected,
                actual,
            } => self.show_warning(&format!(
                "checksum mismatch for {url}: expected {expected}, got {actual}"
            )),
            DownloadEvent::ChecksumComputed { file, algorithm } => {
                self.show_debug(&format!("no published checksum for {file}, computed {algorithm}"));
            }
        }
    }

    fn handle_resolver(&self, event: ResolverEvent) {
        match event {
            ResolverEvent::ResolutionStarted {
                roots,
                level,
                parallelism,
            } => self.show_status(&format!(
                "Resolving {} ({level}, {parallelism} at a time)",
                roots.join(", ")
            )),
            ResolverEvent::UnitResolved {
                coordinate,
                level,
                source,
                children,
            } => self.show_debug(&format!(
                "{coordinate}: {source:?} at {level}, {children} dependencies"
            )),
            ResolverEvent::MessageRecorded {
                coordinate,
                severity,
                message,
            } => match severity {
                Severity::Error => self.show_error(&format!("{coordinate}: {message}")),
                Severity::Warning => self.show_warning(&format!("{coordinate}: {message}")),
            },
            ResolverEvent::ResolutionCompleted {
                units, duration_ms, ..
            } => self.show_status(&format!("Resolved {units} units in {duration_ms}ms")),
            ResolverEvent::Cancelled { units_resolved } => self.show_warning(&format!(
                "cancelled after resolving {units_resolved} units"
            )),
        }
    }

    fn show_status(&self, message: &str) {
        if !self.quiet {
            self.write(&Style::new().dim().apply_to(message).to_string());
        }
    }

    fn show_debug(&self, message: &str) {
        if self.debug && !self.quiet {
            self.write(&Style::new().dim().italic().apply_to(message).to_string());
        }
    }

    fn show_warning(&self, message: &str) {
        if !self.quiet {
            let label = Style::new().yellow().bold().apply_to("warning:");
            self.write(&format!("{label} {message}"));
        }
    }

    fn show_error(&self, message: &str) {
        let label = Style::new().red().bold().apply_to("error:");
        self.write(&format!("{label} {message}"));
    }

    fn write(&self, line: &str) {
        // stderr going away is not worth failing the command over
        let _ = self.term.write_line(line);
    }
}
