//! Well-known locations and names

pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";
pub const MAVEN_CENTRAL_NAME: &str = "central";

/// Directory under the user cache dir holding downloaded artifacts
pub const CACHE_DIR_NAME: &str = "graft";

/// Directory under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "graft";
pub const CONFIG_FILE_NAME: &str = "config.toml";
