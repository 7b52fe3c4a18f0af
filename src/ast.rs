/// The three block directives. `{{else}}` only exists inside `If`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum BlockKind {
    If,
    Unless,
    Each,
}

impl BlockKind {
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(Self::If),
            "unless" => Some(Self::Unless),
            "each" => Some(Self::Each),
            _ => None,
        }
    }

    pub(crate) const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Unless => "unless",
            Self::Each => "each",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AstNode<'a> {
    /// Literal template text, including any syntax that failed to parse.
    Text(&'a str),
    /// `{{path}}` when escaped, `{{{path}}}` otherwise.
    Placeholder { path: &'a str, escaped: bool },
    /// `{{#if path}}..{{else}}..{{/if}}`.
    Conditional {
        path: &'a str,
        then_body: Vec<AstNode<'a>>,
        else_body: Option<Vec<AstNode<'a>>>,
    },
    /// `{{#unless path}}..{{/unless}}`.
    NegatedConditional {
        path: &'a str,
        body: Vec<AstNode<'a>>,
    },
    /// `{{#each path}}..{{/each}}`.
    Loop {
        path: &'a str,
        body: Vec<AstNode<'a>>,
    },
}
