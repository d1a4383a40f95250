use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// URI prefix the engine's `%TAG !u!` directive expands to.
pub const ENGINE_TAG_PREFIX: &str = "tag:unity3d.com,2011:";

/// Shorthand handle for [`ENGINE_TAG_PREFIX`].
pub const ENGINE_TAG_HANDLE: &str = "!u!";

/// Object category identifiers registered by [`TagRegistry::default`].
pub const DEFAULT_PLACEHOLDER_TAGS: [&str; 2] = ["29", "104"];

/// How the composer treats a node carrying a registered tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagResolution {
    /// Replace the node with an empty placeholder.
    Placeholder,
    /// Keep the node's value and drop the tag.
    Transparent,
}

/// Maps custom tag identifiers to their resolution behaviour.
///
/// Identifiers are stored in canonical form (see [`canonical_tag`]), so a
/// registration for `29` also covers `!u!29` and `tag:unity3d.com,2011:29`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRegistry {
    entries: BTreeMap<String, TagResolution>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for tag in DEFAULT_PLACEHOLDER_TAGS {
            registry.register(tag, TagResolution::Placeholder);
        }
        registry
    }
}

impl TagRegistry {
    /// A registry with no tags. Every custom tag is unresolved.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registers a tag, replacing any previous resolution.
    ///
    /// Returns the previous resolution, if there was one.
    pub fn register(&mut self, tag: &str, resolution: TagResolution) -> Option<TagResolution> {
        self.entries
            .insert(canonical_tag(tag).to_string(), resolution)
    }

    /// Looks up the resolution for a raw tag or identifier.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<TagResolution> {
        self.entries.get(canonical_tag(tag)).copied()
    }

    /// Returns `true` if the identifier resolves to a placeholder.
    #[must_use]
    pub fn is_placeholder(&self, tag: &str) -> bool {
        self.resolve(tag) == Some(TagResolution::Placeholder)
    }

    /// Iterates over the registered identifiers in canonical form.
    pub fn tags(&self) -> impl Iterator<Item = (&str, TagResolution)> {
        self.entries
            .iter()
            .map(|(tag, resolution)| (tag.as_str(), *resolution))
    }
}

/// Reduces a raw tag to its canonical identifier.
///
/// Strips the `!u!` handle, or else a single leading `!` followed by the
/// engine tag URI prefix.
#[must_use]
pub fn canonical_tag(tag: &str) -> &str {
    if let Some(id) = tag.strip_prefix(ENGINE_TAG_HANDLE) {
        return id;
    }
    let tag = tag.strip_prefix('!').unwrap_or(tag);
    tag.strip_prefix(ENGINE_TAG_PREFIX).unwrap_or(tag)
}
