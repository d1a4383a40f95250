//! Scene composition.
//!
//! Splits a normalized stream into documents at `---` markers and parses
//! each document body with `serde_yaml`. Custom tags are resolved against a
//! [`TagRegistry`]; an unregistered custom tag is an error.
//!
//! A dialect header line has the form `--- [&<instance-id>] [<class>]`. The
//! class and instance ID are captured on the [`DocumentNode`] rather than
//! handed to the YAML parser. Any other header content is standard YAML and
//! is parsed as part of the document.

use std::str::SplitInclusive;

use serde_yaml::{Mapping, Value, value::TaggedValue};

use crate::domain::{TagRegistry, TagResolution};

/// One parsed document of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    index: usize,
    line: usize,
    class: Option<String>,
    instance_id: Option<String>,
    content: Content,
}

/// The parsed body of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// The document names a registered placeholder class and was not parsed.
    Placeholder,
    /// The parsed YAML, with registered tags resolved.
    Yaml(Value),
}

impl DocumentNode {
    /// The 0-based position of this document in the stream.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The 1-based line on which the document starts.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// The class identifier from the document header, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// The instance ID from the document header, if any.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// The document body.
    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    /// Returns `true` if the document is a placeholder.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.content, Content::Placeholder)
    }

    /// The key of a root mapping with exactly one string key.
    ///
    /// Engine scene documents wrap each object in a single key naming its
    /// type, e.g. `GameObject:` or `Transform:`.
    #[must_use]
    pub fn root_key(&self) -> Option<&str> {
        let Content::Yaml(Value::Mapping(mapping)) = &self.content else {
            return None;
        };
        if mapping.len() != 1 {
            return None;
        }
        mapping.keys().next().and_then(Value::as_str)
    }
}

/// Composes the documents of a normalized stream.
///
/// The returned sequence is lazy and single-pass: each document is framed,
/// parsed and resolved only when requested.
#[must_use]
pub fn compose<'a>(stream: &'a str, registry: &'a TagRegistry) -> Documents<'a> {
    Documents::new(stream, registry)
}

/// A lazy, single-pass sequence of documents.
///
/// Yields `None` forever after the first error.
#[derive(Debug)]
pub struct Documents<'a> {
    lines: SplitInclusive<'a, char>,
    registry: &'a TagRegistry,
    line_number: usize,
    directives: String,
    /// Set once a document has been framed; the next directive starts a new set.
    directives_stale: bool,
    pending: Option<Header>,
    index: usize,
    done: bool,
}

/// A document being framed.
#[derive(Debug, Default)]
struct Draft {
    line: usize,
    class: Option<String>,
    instance_id: Option<String>,
    text: String,
    has_content: bool,
    marker: bool,
}

impl Draft {
    fn from_header(header: Header) -> Self {
        match header.kind {
            HeaderKind::Dialect { instance_id, class } => Self {
                line: header.line,
                class,
                instance_id,
                ..Self::default()
            },
            HeaderKind::Standard(text) => Self {
                line: header.line,
                text,
                has_content: true,
                marker: true,
                ..Self::default()
            },
        }
    }
}

#[derive(Debug)]
struct Header {
    line: usize,
    kind: HeaderKind,
}

#[derive(Debug)]
enum HeaderKind {
    /// `--- [&<instance-id>] [<class>]`
    Dialect {
        instance_id: Option<String>,
        class: Option<String>,
    },
    /// A marker followed by standard YAML content, kept verbatim.
    Standard(String),
}

impl<'a> Documents<'a> {
    fn new(stream: &'a str, registry: &'a TagRegistry) -> Self {
        Self {
            lines: stream.split_inclusive('\n'),
            registry,
            line_number: 0,
            directives: String::new(),
            directives_stale: false,
            pending: None,
            index: 0,
            done: false,
        }
    }

    /// Frames the next document, or `None` at the end of the stream.
    fn frame(&mut self) -> Option<Draft> {
        let draft = self.frame_lines();
        if draft.is_some() {
            self.directives_stale = true;
        }
        draft
    }

    fn frame_lines(&mut self) -> Option<Draft> {
        let mut draft = self.pending.take().map(Draft::from_header);
        let mut seen_document = draft.is_some();

        while let Some(line) = self.lines.next() {
            self.line_number += 1;
            let content = line.trim_end_matches(['\r', '\n']);

            if let Some(kind) = parse_header(content) {
                let header = Header {
                    line: self.line_number,
                    kind,
                };
                if seen_document {
                    self.pending = Some(header);
                    return draft;
                }
                draft = Some(Draft::from_header(header));
                seen_document = true;
                continue;
            }

            if content == "..." {
                if seen_document {
                    return draft;
                }
                continue;
            }

            if !seen_document && content.starts_with('%') {
                if self.directives_stale {
                    self.directives.clear();
                    self.directives_stale = false;
                }
                self.directives.push_str(&local_directive(content));
                self.directives.push('\n');
                continue;
            }

            let is_content = !is_blank(content);
            let current = draft.get_or_insert_with(|| Draft {
                line: self.line_number,
                ..Draft::default()
            });
            current.text.push_str(line);
            current.has_content |= is_content;
            if is_content {
                seen_document = true;
            }
        }

        draft.filter(|_| seen_document)
    }

    fn build(&self, draft: Draft) -> Result<DocumentNode, Error> {
        let Draft {
            line,
            class,
            instance_id,
            text,
            has_content,
            marker,
        } = draft;

        let placeholder = class
            .as_deref()
            .is_some_and(|class| self.registry.is_placeholder(class));

        let content = if placeholder {
            Content::Placeholder
        } else if !has_content {
            Content::Yaml(Value::Null)
        } else {
            let source = if self.directives.is_empty() {
                text
            } else if marker {
                format!("{}{text}", self.directives)
            } else {
                format!("{}---\n{text}", self.directives)
            };
            let value: Value =
                serde_yaml::from_str(&source).map_err(|source| Error::Yaml { line, source })?;
            Content::Yaml(resolve(value, self.registry, line)?)
        };

        tracing::trace!(
            index = self.index,
            line,
            class = class.as_deref(),
            placeholder,
            "composed document"
        );

        Ok(DocumentNode {
            index: self.index,
            line,
            class,
            instance_id,
            content,
        })
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<DocumentNode, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(draft) = self.frame() else {
            self.done = true;
            return None;
        };

        let result = self.build(draft);
        match result {
            Ok(_) => self.index += 1,
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Documents<'_> {}

/// Parses a document start marker line.
fn parse_header(line: &str) -> Option<HeaderKind> {
    let rest = match line.strip_prefix("---") {
        Some("") => "",
        Some(rest) if rest.starts_with([' ', '\t']) => rest,
        _ => return None,
    };

    let tokens: Vec<&str> = strip_comment(rest).split_whitespace().collect();
    let dialect = match tokens.as_slice() {
        [] => Some((None, None)),
        [token] => match anchor_id(token) {
            Some(id) => Some((Some(id), None)),
            None => is_identifier(token).then_some((None, Some(*token))),
        },
        [anchor, class] if is_identifier(class) => {
            anchor_id(anchor).map(|id| (Some(id), Some(*class)))
        }
        _ => None,
    };

    Some(match dialect {
        Some((instance_id, class)) => HeaderKind::Dialect {
            instance_id: instance_id.map(str::to_string),
            class: class.map(str::to_string),
        },
        None => HeaderKind::Standard(format!("{line}\n")),
    })
}

/// Cuts a trailing `#` comment. A comment starts at a `#` preceded by
/// whitespace.
fn strip_comment(rest: &str) -> &str {
    let mut previous = ' ';
    for (index, c) in rest.char_indices() {
        if c == '#' && previous.is_whitespace() {
            return &rest[..index];
        }
        previous = c;
    }
    rest
}

fn anchor_id(token: &str) -> Option<&str> {
    token.strip_prefix('&').filter(|id| !id.is_empty())
}

/// Rewrites a `%TAG` directive with a URI prefix to use a local `!` prefix.
///
/// `serde_yaml` only reports local tags, so `%TAG !u! tag:unity3d.com,2011:`
/// becomes `%TAG !u! !tag:unity3d.com,2011:`. Other directives are unchanged.
fn local_directive(line: &str) -> String {
    match line.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["%TAG", handle, prefix] if !prefix.starts_with('!') => {
            format!("%TAG {handle} !{prefix}")
        }
        _ => line.to_string(),
    }
}

/// A bare class identifier token, as opposed to inline YAML.
fn is_identifier(token: &str) -> bool {
    const INDICATORS: [char; 16] = [
        '!', '&', '*', '{', '[', '"', '\'', '|', '>', '#', '-', '?', ':', '%', '@', '`',
    ];
    !token.starts_with(INDICATORS) && !token.ends_with(':')
}

/// Returns `true` if the line carries no YAML content.
fn is_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Resolves custom tags in a parsed value against the registry.
fn resolve(value: Value, registry: &TagRegistry, line: usize) -> Result<Value, Error> {
    match value {
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let raw = tag.to_string();
            match registry.resolve(&raw) {
                Some(TagResolution::Placeholder) => Ok(Value::Null),
                Some(TagResolution::Transparent) => resolve(value, registry, line),
                None => Err(Error::UnregisteredTag { line, tag: raw }),
            }
        }
        Value::Sequence(sequence) => sequence
            .into_iter()
            .map(|item| resolve(item, registry, line))
            .collect::<Result<_, _>>()
            .map(Value::Sequence),
        Value::Mapping(mapping) => {
            let mut resolved = Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = resolve(key, registry, line)?;
                if resolved.contains_key(&key) {
                    return Err(Error::DuplicateKey {
                        line,
                        key: format!("{key:?}"),
                    });
                }
                let value = resolve(value, registry, line)?;
                resolved.insert(key, value);
            }
            Ok(Value::Mapping(resolved))
        }
        other => Ok(other),
    }
}

/// Errors that can occur while composing documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document is not valid YAML.
    #[error("invalid YAML in document starting on line {line}")]
    Yaml {
        /// The 1-based line on which the document starts.
        line: usize,
        /// The parser error.
        source: serde_yaml::Error,
    },

    /// Resolving tagged keys left two entries of a mapping with the same key.
    #[error("duplicate key {key} after tag resolution in document starting on line {line}")]
    DuplicateKey {
        /// The 1-based line on which the document starts.
        line: usize,
        /// The colliding key.
        key: String,
    },

    /// The document uses a custom tag with no registered resolution.
    #[error("unregistered tag '{tag}' in document starting on line {line}")]
    UnregisteredTag {
        /// The 1-based line on which the document starts.
        line: usize,
        /// The tag as reported by the parser.
        tag: String,
    },
}
