//! Integration tests for types

#[cfg(test)]
mod tests {
    use graft_types::*;

    #[test]
    fn test_level_ordering() {
        assert!(ResolutionLevel::Network > ResolutionLevel::Local);
        assert_eq!(
            ResolutionLevel::Local.max(ResolutionLevel::Network),
            ResolutionLevel::Network
        );
    }

    #[test]
    fn test_descriptor_scope_filter() {
        assert!(Scope::Compile.includes_descriptor_scope(None));
        assert!(Scope::Compile.includes_descriptor_scope(Some("compile")));
        assert!(!Scope::Compile.includes_descriptor_scope(Some("runtime")));
        assert!(Scope::Runtime.includes_descriptor_scope(Some("runtime")));
        assert!(Scope::Test.includes_descriptor_scope(Some("runtime")));
        assert!(!Scope::Test.includes_descriptor_scope(Some("test")));
        assert!(!Scope::Runtime.includes_descriptor_scope(Some("provided")));
    }

    #[test]
    fn test_platform_serialization() {
        let json = serde_json::to_string(&Platform::AndroidJvm).unwrap();
        assert_eq!(json, r#""androidJvm""#);
        assert_eq!(Platform::from_attribute("native"), Some(Platform::Native));
        assert_eq!(Platform::from_attribute("linuxX64"), None);
        assert_eq!(Platform::Jvm.jvm_environment(), Some("standard-jvm"));
        assert_eq!(Platform::Js.jvm_environment(), None);
    }

    #[test]
    fn test_checksum_algorithm_names() {
        assert_eq!(ChecksumAlgorithm::default(), ChecksumAlgorithm::Sha256);
        assert_eq!(ChecksumAlgorithm::from_name("SHA-512"), Some(ChecksumAlgorithm::Sha512));
        assert_eq!(ChecksumAlgorithm::Sha1.extension(), "sha1");
        assert_eq!(ChecksumAlgorithm::from_name("md5"), None);
    }

    #[test]
    fn test_message_display() {
        let message = Message::warning("ambiguous variants").with_detail("a, b");
        assert_eq!(message.to_string(), "warning: ambiguous variants (a, b)");
        assert!(!message.is_error());
        assert!(Message::error("boom").is_error());
    }
}
