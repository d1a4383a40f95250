use std::{fmt, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The literal prefix of a dialect document separator line.
///
/// Three dashes, a space, and the engine's custom tag handle.
pub const SEPARATOR_PREFIX: &str = "--- !u!";

/// A parsed dialect document separator.
///
/// The source shape is `--- !u!<tag> <class> &<instance-id>`. The engine
/// also writes `--- !u!<tag> &<instance-id>` with no class; that shape only
/// renders under [`InstanceIdPolicy::Anchor`]. The custom tag token has no
/// standard YAML meaning and is kept only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    tag: NonEmptyString,
    class: Option<NonEmptyString>,
    instance_id: Option<NonEmptyString>,
}

/// What to do with the instance ID when a separator is rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceIdPolicy {
    /// Emit `--- <class>`, discarding the instance ID.
    #[default]
    Drop,
    /// Emit `--- &<instance-id> <class>`, keeping the ID as a YAML anchor.
    Anchor,
}

impl Separator {
    /// Returns `true` if the line has the dialect separator prefix.
    ///
    /// Classification is purely line-local; a line that passes this check
    /// must still be parsed with [`Separator::parse`].
    #[must_use]
    pub fn is_separator(line: &str) -> bool {
        line.starts_with(SEPARATOR_PREFIX)
    }

    /// Parses a separator line.
    ///
    /// The line is split on single space characters. Any line terminator is
    /// ignored. Fields beyond the instance ID are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the line lacks the separator prefix, has fewer
    /// than three fields, or has an empty third field.
    pub fn parse(line: &str) -> Result<Self, SeparatorError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if !Self::is_separator(line) {
            return Err(SeparatorError::NotASeparator);
        }

        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() < 3 {
            return Err(SeparatorError::MissingField(fields.len()));
        }

        // `!u!` prefix is guaranteed by `is_separator`
        let tag = NonEmptyString::new(fields[1].to_string())
            .map_err(|_| SeparatorError::MissingField(1))?;

        if fields[2].is_empty() {
            return Err(SeparatorError::MissingField(2));
        }

        // `--- !u!<tag> &<id>` carries no class
        let (class, id_field) = if fields[2].starts_with('&') {
            (None, Some(fields[2]))
        } else {
            (NonEmptyString::new(fields[2].to_string()).ok(), fields.get(3).copied())
        };

        let instance_id = id_field
            .and_then(|field| field.strip_prefix('&'))
            .and_then(|id| NonEmptyString::new(id.to_string()).ok());

        Ok(Self {
            tag,
            class,
            instance_id,
        })
    }

    /// The custom tag token, e.g. `!u!1`.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.tag.as_str()
    }

    /// The class identifier retained in the rewritten line, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_ref().map(NonEmptyString::as_str)
    }

    /// The instance ID, without the `&` marker.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_ref().map(NonEmptyString::as_str)
    }

    /// Renders the standard YAML separator line, without a terminator.
    ///
    /// # Errors
    ///
    /// A separator without a class cannot be rendered under
    /// [`InstanceIdPolicy::Drop`], since nothing would remain of it.
    pub fn render(&self, policy: InstanceIdPolicy) -> Result<String, SeparatorError> {
        match (policy, &self.class, &self.instance_id) {
            (InstanceIdPolicy::Anchor, Some(class), Some(id)) => Ok(format!("--- &{id} {class}")),
            (InstanceIdPolicy::Anchor, None, Some(id)) => Ok(format!("--- &{id}")),
            (_, Some(class), _) => Ok(format!("--- {class}")),
            (_, None, id) => Err(SeparatorError::MissingClass(
                id.as_ref().map_or_else(String::new, |id| format!("&{id}")),
            )),
        }
    }
}

impl FromStr for Separator {
    type Err = SeparatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "--- {}", self.tag)?;
        if let Some(class) = &self.class {
            write!(f, " {class}")?;
        }
        if let Some(id) = &self.instance_id {
            write!(f, " &{id}")?;
        }
        Ok(())
    }
}

/// Errors from parsing a dialect separator line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeparatorError {
    /// The line does not start with the separator prefix.
    #[error("line does not start with '{SEPARATOR_PREFIX}'")]
    NotASeparator,

    /// A required field is absent or empty.
    #[error("expected at least 3 space-separated fields, found {0}")]
    MissingField(usize),

    /// The separator has no class and the policy drops the instance ID.
    #[error("missing class identifier before instance ID '{0}'")]
    MissingClass(String),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn parses_well_formed_separator() {
        let separator = Separator::parse("--- !u!1 Tag &12345\n").unwrap();

        assert_eq!(separator.tag(), "!u!1");
        assert_eq!(separator.class(), Some("Tag"));
        assert_eq!(separator.instance_id(), Some("12345"));
    }

    #[test]
    fn ignores_trailing_fields() {
        let separator = Separator::parse("--- !u!4 Transform &400 stripped").unwrap();

        assert_eq!(separator.class(), Some("Transform"));
        assert_eq!(separator.instance_id(), Some("400"));
    }

    #[test]
    fn instance_id_is_optional() {
        let separator = Separator::parse("--- !u!1 GameObject").unwrap();

        assert_eq!(separator.instance_id(), None);
        assert_eq!(separator.render(InstanceIdPolicy::Anchor).unwrap(), "--- GameObject");
    }

    #[test_case("--- !u!1 Tag &12345", InstanceIdPolicy::Drop, "--- Tag"; "drop")]
    #[test_case("--- !u!1 Tag &12345", InstanceIdPolicy::Anchor, "--- &12345 Tag"; "anchor")]
    #[test_case("--- !u!1 Tag &12345\r\n", InstanceIdPolicy::Drop, "--- Tag"; "crlf")]
    #[test_case("--- !u!1 &12345", InstanceIdPolicy::Anchor, "--- &12345"; "anchor without class")]
    fn renders(line: &str, policy: InstanceIdPolicy, expected: &str) {
        let separator = Separator::parse(line).unwrap();
        assert_eq!(separator.render(policy).unwrap(), expected);
    }

    #[test]
    fn parses_engine_shape_without_class() {
        let separator = Separator::parse("--- !u!1 &12345 stripped").unwrap();

        assert_eq!(separator.class(), None);
        assert_eq!(separator.instance_id(), Some("12345"));
        assert_eq!(separator.to_string(), "--- !u!1 &12345");
    }

    #[test]
    fn dropping_the_only_field_is_an_error() {
        let separator = Separator::parse("--- !u!1 &12345").unwrap();

        let error = separator.render(InstanceIdPolicy::Drop).unwrap_err();
        assert_eq!(error, SeparatorError::MissingClass("&12345".to_string()));
    }

    #[test_case("--- !u!1"; "two fields")]
    #[test_case("--- !u!1 "; "empty class")]
    fn rejects_missing_fields(line: &str) {
        let error = Separator::parse(line).unwrap_err();
        assert!(matches!(error, SeparatorError::MissingField(_)));
    }

    #[test]
    fn rejects_ordinary_lines() {
        assert!(!Separator::is_separator("--- Tag"));
        assert!(!Separator::is_separator("  --- !u!1 Tag &1"));
        assert_eq!(
            Separator::parse("GameObject:").unwrap_err(),
            SeparatorError::NotASeparator
        );
    }

    #[test]
    fn display_reproduces_source_shape() {
        let separator: Separator = "--- !u!29 Settings &1".parse().unwrap();
        assert_eq!(separator.to_string(), "--- !u!29 Settings &1");
    }
}
