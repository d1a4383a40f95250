use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{InstanceIdPolicy, TagRegistry, TagResolution};

/// Configuration for a conversion run.
///
/// Controls how separators are rewritten and which custom tags the composer
/// accepts on top of the built-in object categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// What happens to the `&<instance-id>` suffix of a rewritten separator.
    pub instance_ids: InstanceIdPolicy,

    /// Additional tags resolved to empty placeholders.
    placeholder_tags: Vec<String>,

    /// Additional tags whose nodes are kept with the tag removed.
    transparent_tags: Vec<String>,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Adds a tag resolved to an empty placeholder.
    pub fn add_placeholder_tag(&mut self, tag: impl Into<String>) {
        self.placeholder_tags.push(tag.into());
    }

    /// Adds a tag whose node is kept untagged.
    pub fn add_transparent_tag(&mut self, tag: impl Into<String>) {
        self.transparent_tags.push(tag.into());
    }

    /// Builds the tag registry for this configuration.
    ///
    /// Starts from [`TagRegistry::default`]. Configured tags override the
    /// defaults, transparent tags last.
    #[must_use]
    pub fn registry(&self) -> TagRegistry {
        let mut registry = TagRegistry::default();
        for tag in &self.placeholder_tags {
            registry.register(tag, TagResolution::Placeholder);
        }
        for tag in &self.transparent_tags {
            registry.register(tag, TagResolution::Transparent);
        }
        registry
    }
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        instance_ids: InstanceIdPolicy,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        placeholder_tags: Vec<String>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        transparent_tags: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                instance_ids,
                placeholder_tags,
                transparent_tags,
            } => Self {
                instance_ids,
                placeholder_tags,
                transparent_tags,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            instance_ids: config.instance_ids,
            placeholder_tags: config.placeholder_tags,
            transparent_tags: config.transparent_tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ninstance_ids = \"anchor\"\nplaceholder_tags = [\"!u!1\"]\ntransparent_tags = [\"4\"]\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let registry = config.registry();

        assert_eq!(config.instance_ids, InstanceIdPolicy::Anchor);
        assert!(registry.is_placeholder("1"));
        assert!(registry.is_placeholder("29"));
        assert_eq!(registry.resolve("!u!4"), Some(TagResolution::Transparent));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn invalid_policy_returns_error() {
        let error = Config::from_toml_str("_version = \"1\"\ninstance_ids = \"keep\"\n").unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn version_only_returns_default() {
        let actual = Config::from_toml_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, Config::default());
        assert_eq!(actual.registry(), TagRegistry::default());
    }

    #[test]
    fn transparent_overrides_default_placeholder() {
        let mut config = Config::default();
        config.add_transparent_tag("29");

        assert_eq!(
            config.registry().resolve("29"),
            Some(TagResolution::Transparent)
        );
    }
}
