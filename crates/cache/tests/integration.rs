//! Integration tests for the artifact file cache

#[cfg(test)]
mod tests {
    use graft_cache::*;
    use graft_errors::{CacheError, Error};
    use graft_hash::Checksum;
    use graft_net::{MemoryFetcher, Repository};
    use graft_types::{ChecksumAlgorithm, Coordinate, ResolutionLevel};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const JAR: &str = "lib-1.0.jar";

    fn coord() -> Coordinate {
        Coordinate::new("org.example", "lib", "1.0")
    }

    fn sha256(data: &[u8]) -> String {
        Checksum::from_data(ChecksumAlgorithm::Sha256, data).to_hex()
    }

    fn setup(fetcher: MemoryFetcher) -> (TempDir, Arc<MemoryFetcher>, FileCache) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(fetcher);
        let cache = FileCache::new(
            dir.path(),
            vec![fetcher.repository().unwrap()],
            fetcher.clone(),
        );
        (dir, fetcher, cache)
    }

    fn serve_with_sidecar(fetcher: &MemoryFetcher, data: &'static [u8]) {
        fetcher.insert(&coord(), JAR, data);
        fetcher.insert(&coord(), &format!("{JAR}.sha256"), sha256(data));
    }

    #[tokio::test]
    async fn test_download_then_reuse() {
        let (dir, fetcher, cache) = setup(MemoryFetcher::new());
        serve_with_sidecar(&fetcher, b"jar v1");

        let file = cache.artifact(&coord(), JAR).unwrap();
        let path = cache.ensure(&file, ResolutionLevel::Network).await.unwrap();

        assert_eq!(path, dir.path().join("org.example/lib/1.0").join(JAR));
        assert_eq!(std::fs::read(&path).unwrap(), b"jar v1");
        assert_eq!(
            std::fs::read_to_string(sidecar_path(&path, ChecksumAlgorithm::Sha256)).unwrap(),
            sha256(b"jar v1")
        );
        assert_eq!(file.state(), DownloadState::Satisfied(ResolutionLevel::Network));

        // A fresh handle for the same file is satisfied from disk
        let again = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&again, ResolutionLevel::Network).await.unwrap();
        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);

        let stats = cache.stats();
        assert_eq!(stats.downloads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.bytes_downloaded, 6);
    }

    #[tokio::test]
    async fn test_local_level_never_downloads() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        serve_with_sidecar(&fetcher, b"jar v1");

        let file = cache.artifact(&coord(), JAR).unwrap();
        let err = cache.ensure(&file, ResolutionLevel::Local).await.unwrap_err();

        assert!(matches!(err, Error::Cache(CacheError::NotCached { .. })));
        assert!(err.is_not_found());
        assert!(file.failed_at(ResolutionLevel::Local));
        assert!(!file.failed_at(ResolutionLevel::Network));
        assert_eq!(fetcher.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_policy_by_level() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        serve_with_sidecar(&fetcher, b"jar v1");

        let file = cache.artifact(&coord(), JAR).unwrap();
        let path = cache.ensure(&file, ResolutionLevel::Network).await.unwrap();

        // Corrupt the cached copy; the sidecar still names the original digest
        std::fs::write(&path, b"tampered").unwrap();

        let local = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&local, ResolutionLevel::Local).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"tampered");
        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);

        let network = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&network, ResolutionLevel::Network).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"jar v1");
        assert_eq!(fetcher.requests_for(&coord(), JAR), 2);
    }

    #[tokio::test]
    async fn test_missing_local_sidecar_forces_network_download() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        serve_with_sidecar(&fetcher, b"jar v1");

        let path = cache.path_for(&coord(), JAR).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jar v1").unwrap();

        let local = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&local, ResolutionLevel::Local).await.unwrap();
        assert_eq!(fetcher.total_requests(), 0);

        let network = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&network, ResolutionLevel::Network).await.unwrap();
        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);
        assert!(sidecar_path(&path, ChecksumAlgorithm::Sha256).exists());
    }

    #[tokio::test]
    async fn test_embedded_checksum_skips_sidecar() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        fetcher.insert(&coord(), JAR, &b"jar v1"[..]);

        let expected = Checksum::from_data(ChecksumAlgorithm::Sha512, b"jar v1");
        let file = cache.artifact_at(&coord(), JAR, JAR, Some(expected)).unwrap();
        cache.ensure(&file, ResolutionLevel::Network).await.unwrap();

        assert_eq!(fetcher.total_requests(), 1);
        assert!(sidecar_path(file.path(), ChecksumAlgorithm::Sha512).exists());
    }

    #[tokio::test]
    async fn test_mismatch_falls_through_to_next_repository() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new());
        let broken = Repository::new("broken", "memory://broken/").unwrap();
        let good = fetcher.repository().unwrap();

        let broken_url = broken.artifact_url(&coord(), JAR).unwrap();
        fetcher.insert_url(broken_url.as_str(), &b"garbage"[..]);
        fetcher.insert_url(format!("{broken_url}.sha256"), sha256(b"jar v1"));
        serve_with_sidecar(&fetcher, b"jar v1");

        let cache = FileCache::new(dir.path(), vec![broken, good], fetcher.clone());
        let file = cache.artifact(&coord(), JAR).unwrap();
        let path = cache.ensure(&file, ResolutionLevel::Network).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"jar v1");
        assert_eq!(fetcher.requests_for_url(broken_url.as_str()), 1);
        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);
    }

    #[tokio::test]
    async fn test_all_repositories_failed() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        fetcher.insert_failure(&coord(), JAR, 503);

        let file = cache.artifact(&coord(), JAR).unwrap();
        let err = cache.ensure(&file, ResolutionLevel::Network).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Cache(CacheError::AllRepositoriesFailed { .. })
        ));
        assert!(!file.path().exists());
        assert!(file.failed_at(ResolutionLevel::Network));
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_ensure_all_skips_files_that_already_failed() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        fetcher.insert_failure(&coord(), JAR, 503);
        let file = Arc::new(cache.artifact(&coord(), JAR).unwrap());

        // A local miss does not stop a network attempt
        let files = [Arc::clone(&file)];
        assert!(cache.ensure_all(&files, ResolutionLevel::Local).await[0].is_err());
        assert!(cache.ensure_all(&files, ResolutionLevel::Network).await[0].is_err());
        let requests = fetcher.requests_for(&coord(), JAR);
        assert!(requests >= 1);

        let results = cache.ensure_all(&files, ResolutionLevel::Network).await;
        assert!(matches!(
            results[0],
            Err(Error::Cache(CacheError::PreviouslyFailed { .. }))
        ));
        assert_eq!(fetcher.requests_for(&coord(), JAR), requests);
    }

    #[test]
    fn test_paths_stay_under_cache_root() {
        let (dir, _fetcher, cache) = setup(MemoryFetcher::new());

        for name in ["../../../../escaped.jar", "..", "", "nested/lib.jar", "/tmp/abs.jar"] {
            assert!(
                matches!(
                    cache.artifact(&coord(), name),
                    Err(Error::Cache(CacheError::UnsafePath { .. }))
                ),
                "{name:?} accepted"
            );
        }
        for coordinate in [
            Coordinate::new("..", "lib", "1.0"),
            Coordinate::new("org.example", "lib", ".."),
            Coordinate::new("org/example", "lib", "1.0"),
        ] {
            assert!(cache.path_for(&coordinate, JAR).is_err(), "{coordinate} accepted");
        }

        let path = cache.path_for(&coord(), JAR).unwrap();
        assert!(path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_no_published_checksum_is_computed() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        fetcher.insert(&coord(), JAR, &b"jar v1"[..]);

        let file = cache.artifact(&coord(), JAR).unwrap();
        let path = cache.ensure(&file, ResolutionLevel::Network).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(sidecar_path(&path, ChecksumAlgorithm::Sha256)).unwrap(),
            sha256(b"jar v1")
        );
        // The computed sidecar satisfies later network checks
        let again = cache.artifact(&coord(), JAR).unwrap();
        cache.ensure(&again, ResolutionLevel::Network).await.unwrap();
        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ensure_downloads_once() {
        let (_dir, fetcher, cache) =
            setup(MemoryFetcher::new().with_latency(Duration::from_millis(20)));
        serve_with_sidecar(&fetcher, b"shared jar");
        let cache = Arc::new(cache);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    let file = cache.artifact(&coord(), JAR).unwrap();
                    cache.ensure(&file, ResolutionLevel::Network).await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(fetcher.requests_for(&coord(), JAR), 1);
        assert_eq!(cache.stats().downloads, 1);
        assert_eq!(cache.stats().hits, 7);
    }

    #[tokio::test]
    async fn test_read_returns_contents() {
        let (_dir, fetcher, cache) = setup(MemoryFetcher::new());
        fetcher.insert(&coord(), "lib-1.0.pom", "<project/>");

        let pom = cache.artifact(&coord(), "lib-1.0.pom").unwrap();
        let data = cache.read(&pom, ResolutionLevel::Network).await.unwrap();
        assert_eq!(&data[..], b"<project/>");
        assert_eq!(pom.extension(), "pom");
    }
}
