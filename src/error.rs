pub type MinibarsResult<T> = std::result::Result<T, MinibarsError>;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A `{{` that does not begin any recognised tag.
    InvalidTag {
        found: String,
    },
    /// An `{{else}}` or closing tag with no matching open block.
    UnexpectedTag {
        tag: String,
    },
    /// A block opener whose closing tag never appears.
    UnclosedBlock {
        keyword: String,
    },
    NestingTooDeep {
        limit: usize,
    },
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTag { found } => {
                write!(f, "Invalid tag '{}'", found)
            }
            Self::UnexpectedTag { tag } => {
                write!(f, "Unexpected '{}' outside of a matching block", tag)
            }
            Self::UnclosedBlock { keyword } => {
                write!(f, "Unexpected EOF (expected '{{{{/{}}}}}')", keyword)
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "Blocks nested deeper than the limit of {}", limit)
            }
        }
    }
}

impl std::error::Error for ParseErrorKind {}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.kind
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MinibarsError {
    TemplateExists {
        template_name: String,
    },
    MissingTemplate {
        template_name: String,
    },
    /// The template source could not produce the named template.
    TemplateLoad {
        template_name: String,
        reason: String,
    },
    Parse(ParseError),
}

impl std::fmt::Display for MinibarsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemplateExists { template_name } => {
                write!(f, "Template already exists: {}", template_name)
            }
            Self::MissingTemplate { template_name } => {
                write!(f, "Template not found: {}", template_name)
            }
            Self::TemplateLoad {
                template_name,
                reason,
            } => {
                write!(f, "Failed to load template {}: {}", template_name, reason)
            }
            Self::Parse(parse_error) => {
                write!(f, "{}", parse_error)
            }
        }
    }
}

impl std::error::Error for MinibarsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(parse_error) => Some(parse_error),
            Self::TemplateExists { .. }
            | Self::MissingTemplate { .. }
            | Self::TemplateLoad { .. } => None,
        }
    }
}

impl From<ParseError> for MinibarsError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}
