#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in graft
//!
//! Library crates never print. Everything a user might want to see during a
//! resolution (downloads, recorded diagnostics, progress of the traversal)
//! is sent as an [`AppEvent`] over an unbounded channel and rendered by the
//! CLI. Sending is fire-and-forget: a dropped receiver is not an error.

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, FailureContext, GeneralEvent, MetadataSourceKind, ResolverEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout graft
///
/// Implemented by the raw [`EventSender`] and by any struct that optionally
/// carries one, so call sites never have to care whether anyone listens.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message, None)));
    }

    /// Warning with a short explanation of what happens instead
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(
            message,
            Some(context.into()),
        )));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit a download started event
    fn emit_download_started(&self, url: impl Into<String>, file: impl Into<String>) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.into(),
            file: file.into(),
        }));
    }

    /// Emit a download completed event
    fn emit_download_completed(&self, url: impl Into<String>, file: impl Into<String>, size: u64) {
        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.into(),
            file: file.into(),
            size,
        }));
    }

    /// Emit a download failed event built from a user-facing error
    fn emit_download_failed<E: graft_errors::UserFacingError + ?Sized>(
        &self,
        url: impl Into<String>,
        file: impl Into<String>,
        error: &E,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Failed {
            url: url.into(),
            file: file.into(),
            failure: FailureContext::from_error(error),
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
