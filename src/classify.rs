//! Grouping composed documents into scene objects.
//!
//! The grouping key is chosen by a [`Classifier`]. [`ByInstanceId`] keys
//! documents by the instance ID from their header.

use std::{collections::BTreeMap, fmt};

use crate::compose::{self, DocumentNode};

/// The key a document is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectId {
    /// An engine instance ID.
    Instance(String),
    /// The position of a document that has no instance ID.
    Ordinal(usize),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Instance(id) => write!(f, "&{id}"),
            Self::Ordinal(index) => write!(f, "#{index}"),
        }
    }
}

/// The documents grouped under one [`ObjectId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRecord {
    class: Option<String>,
    documents: Vec<DocumentNode>,
}

impl ObjectRecord {
    /// The first class identifier seen for this object.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// The documents of this object, in stream order.
    #[must_use]
    pub fn documents(&self) -> &[DocumentNode] {
        &self.documents
    }

    /// The root keys of this object's documents, e.g. `GameObject`.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().filter_map(DocumentNode::root_key)
    }

    fn push(&mut self, document: DocumentNode) {
        if self.class.is_none() {
            self.class = document.class().map(str::to_string);
        }
        self.documents.push(document);
    }
}

/// Chooses the object a document belongs to.
///
/// Returning `None` leaves the document out of the result.
pub trait Classifier {
    /// The grouping key for the document.
    fn classify(&self, document: &DocumentNode) -> Option<ObjectId>;
}

impl<F> Classifier for F
where
    F: Fn(&DocumentNode) -> Option<ObjectId>,
{
    fn classify(&self, document: &DocumentNode) -> Option<ObjectId> {
        self(document)
    }
}

/// Keys documents by instance ID, or by position when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByInstanceId;

impl Classifier for ByInstanceId {
    fn classify(&self, document: &DocumentNode) -> Option<ObjectId> {
        Some(document.instance_id().map_or_else(
            || ObjectId::Ordinal(document.index()),
            |id| ObjectId::Instance(id.to_string()),
        ))
    }
}

/// Groups a sequence of documents into object records.
///
/// # Errors
///
/// Returns the first composition error in the sequence.
pub fn classify_and_accumulate<I, C>(
    documents: I,
    classifier: &C,
) -> Result<BTreeMap<ObjectId, ObjectRecord>, compose::Error>
where
    I: IntoIterator<Item = Result<DocumentNode, compose::Error>>,
    C: Classifier + ?Sized,
{
    let mut objects: BTreeMap<ObjectId, ObjectRecord> = BTreeMap::new();

    for document in documents {
        let document = document?;
        let Some(id) = classifier.classify(&document) else {
            tracing::trace!(index = document.index(), "document not classified");
            continue;
        };
        objects.entry(id).or_default().push(document);
    }

    tracing::debug!(objects = objects.len(), "classified documents");
    Ok(objects)
}
