//! Integration tests for config

#[cfg(test)]
mod tests {
    use graft_config::*;
    use graft_types::{ChecksumAlgorithm, Platform, ResolutionLevel, Scope};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "GRAFT_CACHE_DIR",
            "GRAFT_OFFLINE",
            "GRAFT_PARALLELISM",
            "GRAFT_CHECKSUM",
        ] {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[resolution]
scope = "runtime"
platform = "androidJvm"
parallelism = 8

[cache]
root = "/tmp/graft-cache"
checksum = "sha512"

[[repositories]]
name = "google"
url = "https://maven.google.com/"

[[repositories]]
name = "central"
url = "https://repo.maven.apache.org/maven2/"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.resolution.scope, Scope::Runtime);
        assert_eq!(config.resolution.platform, Platform::AndroidJvm);
        assert_eq!(config.parallelism(), 8);
        assert_eq!(config.cache.checksum, ChecksumAlgorithm::Sha512);
        assert_eq!(config.cache_root(), std::path::PathBuf::from("/tmp/graft-cache"));
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[0].name, "google");
        assert_eq!(config.network.retries, 3);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.repositories, vec![RepositoryConfig::maven_central()]);
        assert_eq!(config.resolution_level(), ResolutionLevel::Network);
        assert!(config.parallelism() >= 4);
    }

    #[tokio::test]
    async fn test_empty_repository_url_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[[repositories]]
name = "broken"
url = ""
        "#
        )
        .unwrap();

        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_repository_list_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "repositories = []").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            graft_errors::Error::Config(graft_errors::ConfigError::NoRepositories)
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("GRAFT_OFFLINE", "yes");
        std::env::set_var("GRAFT_CHECKSUM", "sha1");
        std::env::set_var("GRAFT_CACHE_DIR", "/var/tmp/graft");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.resolution_level(), ResolutionLevel::Local);
        assert_eq!(config.cache.checksum, ChecksumAlgorithm::Sha1);
        assert_eq!(config.cache_root(), std::path::PathBuf::from("/var/tmp/graft"));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("GRAFT_PARALLELISM", "many");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
