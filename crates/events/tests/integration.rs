//! Integration tests for events

#[cfg(test)]
mod tests {
    use graft_errors::{CacheError, NetworkError};
    use graft_events::*;
    use graft_types::Severity;

    #[tokio::test]
    async fn test_event_emitter() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, AppEvent::General(GeneralEvent::Error { .. })));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[tokio::test]
    async fn test_download_failure_context() {
        let (tx, mut rx) = channel();
        let error = NetworkError::Timeout {
            url: "https://repo.example/a.jar".into(),
        };
        tx.emit_download_failed("https://repo.example/a.jar", "a.jar", &error);

        match rx.recv().await.unwrap() {
            AppEvent::Download(DownloadEvent::Failed { failure, .. }) => {
                assert!(failure.retryable);
                assert_eq!(failure.code.as_deref(), Some("network.timeout"));
                assert!(failure.hint.is_some());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_log_levels() {
        let error = AppEvent::Resolver(ResolverEvent::MessageRecorded {
            coordinate: "g:m:1".into(),
            severity: Severity::Error,
            message: "descriptor missing".into(),
        });
        assert_eq!(error.log_level(), tracing::Level::ERROR);

        let warning = AppEvent::Resolver(ResolverEvent::MessageRecorded {
            coordinate: "g:m:1".into(),
            severity: Severity::Warning,
            message: "ambiguous".into(),
        });
        assert_eq!(warning.log_level(), tracing::Level::WARN);
        assert_eq!(warning.log_target(), "graft::events::resolver");
    }

    #[test]
    fn test_failure_context_serialization() {
        let failure = FailureContext::from_error(&CacheError::NotCached {
            path: "/tmp/a.jar".into(),
        });
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["code"], "cache.not_cached");
        assert_eq!(json["retryable"], false);
    }
}
