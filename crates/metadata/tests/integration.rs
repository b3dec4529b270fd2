//! Integration tests for metadata parsers

#[cfg(test)]
mod tests {
    use graft_metadata::*;

    const GUAVA_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <!-- do_not_remove: published-with-gradle-metadata -->
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>com.google.guava</groupId>
    <artifactId>guava-parent</artifactId>
    <version>33.0.0-jre</version>
  </parent>
  <artifactId>guava</artifactId>
  <packaging>bundle</packaging>
  <description>Guava &copy; Google&nbsp;LLC</description>
  <properties>
    <jsr305.version>3.0.2</jsr305.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>com.google.code.findbugs</groupId>
      <artifactId>jsr305</artifactId>
      <version>${jsr305.version}</version>
    </dependency>
    <dependency>
      <groupId>org.checkerframework</groupId>
      <artifactId>checker-qual</artifactId>
      <optional>true</optional>
      <exclusions>
        <exclusion>
          <groupId>org.example</groupId>
          <artifactId>unwanted</artifactId>
        </exclusion>
      </exclusions>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <scope>test</scope>
      <classifier>tests</classifier>
      <type>test-jar</type>
    </dependency>
  </dependencies>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.example</groupId>
        <artifactId>bom</artifactId>
        <version>1.0</version>
        <type>pom</type>
        <scope>import</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#;

    #[test]
    fn test_parse_descriptor() {
        let project = Project::parse(GUAVA_POM).unwrap();

        assert_eq!(project.group, None);
        assert_eq!(project.artifact.as_deref(), Some("guava"));
        assert_eq!(project.version, None);
        assert_eq!(project.packaging.as_deref(), Some("bundle"));
        assert!(project.published_with_module_metadata);

        let parent = project.parent.as_ref().unwrap();
        assert_eq!(parent.group, "com.google.guava");
        assert_eq!(parent.artifact, "guava-parent");
        assert_eq!(parent.version, "33.0.0-jre");

        assert_eq!(project.properties["jsr305.version"], "3.0.2");
        assert_eq!(project.dependencies.len(), 3);
        assert_eq!(project.dependencies[0].version.as_deref(), Some("${jsr305.version}"));

        let checker = &project.dependencies[1];
        assert!(checker.optional);
        assert_eq!(checker.version, None);
        assert_eq!(
            checker.exclusions,
            vec![Exclusion {
                group: "org.example".into(),
                artifact: "unwanted".into()
            }]
        );

        let junit = &project.dependencies[2];
        assert_eq!(junit.scope.as_deref(), Some("test"));
        assert_eq!(junit.classifier.as_deref(), Some("tests"));
        assert_eq!(junit.kind.as_deref(), Some("test-jar"));

        assert_eq!(project.dependency_management.len(), 1);
        assert!(project.dependency_management[0].is_import());
    }

    #[test]
    fn test_plain_descriptor_is_not_flagged() {
        let project = Project::parse_bytes(
            b"<project><groupId>g</groupId><artifactId>a</artifactId><version>1</version></project>",
        )
        .unwrap();
        assert!(!project.published_with_module_metadata);
        assert!(project.parent.is_none());
        assert!(project.dependencies.is_empty());
        assert!(project.dependency_management.is_empty());
    }

    const KOTLIN_MODULE: &str = r#"{
  "formatVersion": "1.1",
  "component": {
    "group": "org.jetbrains.kotlinx",
    "module": "kotlinx-coroutines-core",
    "version": "1.8.0",
    "attributes": { "org.gradle.status": "release" }
  },
  "createdBy": { "gradle": { "version": "8.5" } },
  "variants": [
    {
      "name": "jvmApiElements-published",
      "attributes": {
        "org.gradle.category": "library",
        "org.gradle.jvm.environment": "standard-jvm",
        "org.gradle.jvm.version": 8,
        "org.gradle.usage": "java-api",
        "org.jetbrains.kotlin.platform.type": "jvm"
      },
      "available-at": {
        "url": "../../kotlinx-coroutines-core-jvm/1.8.0/kotlinx-coroutines-core-jvm-1.8.0.module",
        "group": "org.jetbrains.kotlinx",
        "module": "kotlinx-coroutines-core-jvm",
        "version": "1.8.0"
      }
    },
    {
      "name": "jvmRuntimeElements",
      "attributes": {
        "org.gradle.usage": "java-runtime",
        "org.gradle.libraryelements": "jar",
        "org.jetbrains.kotlin.platform.type": "jvm"
      },
      "capabilities": [
        { "group": "org.jetbrains.kotlinx", "name": "kotlinx-coroutines-core", "version": "1.8.0" }
      ],
      "dependencies": [
        {
          "group": "org.jetbrains.kotlin",
          "module": "kotlin-stdlib",
          "version": { "requires": "1.9.21" },
          "excludes": [ { "group": "org.example", "module": "legacy" } ]
        },
        { "group": "org.example", "module": "unversioned" }
      ],
      "files": [
        {
          "name": "kotlinx-coroutines-core-jvm-1.8.0.jar",
          "url": "kotlinx-coroutines-core-jvm-1.8.0.jar",
          "size": 1234,
          "sha512": "00",
          "sha256": "ab",
          "sha1": "cd",
          "md5": "ef"
        }
      ]
    }
  ]
}"#;

    #[test]
    fn test_parse_module_metadata() {
        let metadata = ModuleMetadata::parse(KOTLIN_MODULE.as_bytes()).unwrap();
        assert_eq!(metadata.format_version, "1.1");
        assert_eq!(
            metadata.component.as_ref().unwrap().module,
            "kotlinx-coroutines-core"
        );
        assert_eq!(metadata.variants.len(), 2);

        let api = &metadata.variants[0];
        assert_eq!(api.attribute("org.gradle.jvm.version"), Some("8"));
        assert_eq!(api.attribute("org.jetbrains.kotlin.platform.type"), Some("jvm"));
        let redirect = api.available_at.as_ref().unwrap().coordinate();
        assert_eq!(
            redirect.to_string(),
            "org.jetbrains.kotlinx:kotlinx-coroutines-core-jvm:1.8.0"
        );
        assert!(api.files.is_empty());

        let runtime = &metadata.variants[1];
        assert_eq!(runtime.capabilities.len(), 1);
        assert_eq!(runtime.dependencies.len(), 2);
        assert_eq!(
            runtime.dependencies[0].coordinate().unwrap().to_string(),
            "org.jetbrains.kotlin:kotlin-stdlib:1.9.21"
        );
        assert_eq!(runtime.dependencies[0].excludes.len(), 1);
        assert!(runtime.dependencies[1].coordinate().is_none());

        let jar = &runtime.files[0];
        assert_eq!(jar.extension(), "jar");
        assert_eq!(jar.size, Some(1234));
        assert_eq!(jar.sha256.as_deref(), Some("ab"));
    }

    #[test]
    fn test_malformed_module_metadata() {
        assert!(ModuleMetadata::parse(b"{ not json").is_err());
        assert!(ModuleMetadata::parse(br#"{"variants": []}"#).is_err());
    }
}
