//! Scene dialect conversion
//!
//! Engine scene files are written in a YAML-like dialect whose document
//! separators carry custom tag aliases and instance IDs. This crate rewrites
//! those separators into standard YAML, then composes and groups the
//! resulting documents.

use std::{collections::BTreeMap, path::Path};

pub mod domain;
pub use domain::{Config, InstanceIdPolicy, Separator, TagRegistry, TagResolution};

pub mod normalize;
pub use normalize::{NormalizedStream, Normalizer, normalize};

pub mod compose;
pub use compose::{Content, DocumentNode, Documents, compose};

pub mod classify;
pub use classify::{ByInstanceId, Classifier, ObjectId, ObjectRecord, classify_and_accumulate};

/// A scene file normalized and ready to compose.
#[derive(Debug, Clone)]
pub struct Scene {
    stream: NormalizedStream,
    registry: TagRegistry,
}

impl Scene {
    /// Reads and normalizes the scene file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains a malformed
    /// separator.
    pub fn open(path: &Path, config: &Config) -> Result<Self, Error> {
        let stream = Normalizer::new(config.instance_ids).normalize_path(path)?;
        Ok(Self {
            stream,
            registry: config.registry(),
        })
    }

    /// The normalized stream.
    #[must_use]
    pub const fn stream(&self) -> &NormalizedStream {
        &self.stream
    }

    /// The documents of the scene, composed lazily.
    #[must_use]
    pub fn documents(&self) -> Documents<'_> {
        compose(self.stream.as_str(), &self.registry)
    }

    /// Groups the scene's documents with the given classifier.
    ///
    /// # Errors
    ///
    /// Returns the first composition error.
    pub fn objects<C>(
        &self,
        classifier: &C,
    ) -> Result<BTreeMap<ObjectId, ObjectRecord>, Error>
    where
        C: Classifier + ?Sized,
    {
        Ok(classify_and_accumulate(self.documents(), classifier)?)
    }
}

/// Errors from a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be read or normalized.
    #[error(transparent)]
    Normalize(#[from] normalize::Error),

    /// The normalized stream could not be composed.
    #[error(transparent)]
    Compose(#[from] compose::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SCENE: &str = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n\
                         --- !u!29 29 &1\nOcclusionCullingSettings:\n  m_ObjectHideFlags: 0\n\
                         --- !u!1 GameObject &100\nGameObject:\n  m_Name: Player\n  m_Component:\n  - component: {fileID: 400}\n\
                         --- !u!4 Transform &400\nTransform:\n  m_GameObject: {fileID: 100}\n  m_LocalPosition: {x: 0, y: 1, z: 0}\n";

    fn scene_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn converts_scene_file() {
        let file = scene_file(SCENE);

        let scene = Scene::open(file.path(), &Config::default()).unwrap();
        let documents = scene.documents().collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(scene.stream().separators().len(), 3);
        assert_eq!(
            scene.stream().as_str().lines().count(),
            SCENE.lines().count()
        );
        assert_eq!(documents.len(), 3);
        assert!(documents[0].is_placeholder());
        assert_eq!(documents[1].root_key(), Some("GameObject"));
        assert_eq!(documents[2].class(), Some("Transform"));
        assert_eq!(documents[2].instance_id(), None);
    }

    #[test]
    fn anchor_policy_groups_by_instance_id() {
        let file = scene_file(SCENE);
        let mut config = Config::default();
        config.instance_ids = InstanceIdPolicy::Anchor;

        let scene = Scene::open(file.path(), &config).unwrap();
        let objects = scene.objects(&ByInstanceId).unwrap();

        assert_eq!(objects.len(), 3);
        let transform = &objects[&ObjectId::Instance("400".into())];
        assert_eq!(transform.class(), Some("Transform"));
    }

    #[test]
    fn empty_file_has_no_documents() {
        let file = scene_file("");

        let scene = Scene::open(file.path(), &Config::default()).unwrap();

        assert!(scene.stream().is_empty());
        assert_eq!(scene.documents().count(), 0);
    }

    #[test]
    fn errors_are_distinguished() {
        let malformed = scene_file("--- !u!1 &12345\n");
        let error = Scene::open(malformed.path(), &Config::default()).unwrap_err();
        assert!(matches!(
            error,
            Error::Normalize(normalize::Error::MalformedSeparator { .. })
        ));

        let unregistered = scene_file("--- !u!1 GameObject &1\nGameObject: !Mystery {}\n");
        let scene = Scene::open(unregistered.path(), &Config::default()).unwrap();
        let error = scene.objects(&ByInstanceId).unwrap_err();
        assert!(matches!(
            error,
            Error::Compose(compose::Error::UnregisteredTag { .. })
        ));

        let invalid = scene_file("--- !u!1 GameObject &1\nGameObject: [\n");
        let scene = Scene::open(invalid.path(), &Config::default()).unwrap();
        let error = scene.objects(&ByInstanceId).unwrap_err();
        assert!(matches!(error, Error::Compose(compose::Error::Yaml { .. })));
    }
}
