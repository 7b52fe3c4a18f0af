#![allow(
    clippy::arithmetic_side_effects,
    reason = "cursor offsets are always within the input length"
)]

use std::collections::{HashMap, HashSet};

use crate::{
    ast::{AstNode, BlockKind},
    error::{ParseError, ParseErrorKind},
    options::Options,
};

type ParseResult<T> = Result<T, ParseError>;

/// A well-formed `{{ ... }}` tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Tag<'a> {
    Placeholder { path: &'a str, escaped: bool },
    Open { kind: BlockKind, path: &'a str },
    Else,
    Close(BlockKind),
}

/// Part of a body that is still being parsed.
#[derive(Debug)]
enum Piece<'a> {
    /// Byte range of literal text.
    Text(usize, usize),
    Node(AstNode<'a>),
}

#[derive(Debug)]
struct Body<'a> {
    pieces: Vec<Piece<'a>>,
    /// Start of the literal text run not yet pushed to `pieces`.
    text_start: usize,
}

impl<'a> Body<'a> {
    const fn new(text_start: usize) -> Self {
        Self {
            pieces: Vec::new(),
            text_start,
        }
    }

    /// Adjacent text ranges are merged into one piece.
    fn push_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(Piece::Text(_, last_end)) = self.pieces.last_mut() {
            if *last_end == start {
                *last_end = end;
                return;
            }
        }
        self.pieces.push(Piece::Text(start, end));
    }

    /// Ends the pending text run at `end`.
    fn flush(&mut self, end: usize) {
        self.push_text(self.text_start, end);
    }

    fn append(&mut self, pieces: Vec<Piece<'a>>) {
        for piece in pieces {
            match piece {
                Piece::Text(start, end) => self.push_text(start, end),
                node @ Piece::Node(_) => self.pieces.push(node),
            }
        }
    }
}

/// A block opener waiting for its closing tag.
#[derive(Debug)]
struct OpenBlock<'a> {
    kind: BlockKind,
    path: &'a str,
    tag_start: usize,
    tag_end: usize,
    body: Body<'a>,
    /// The finished `then` branch of an `if`, with the span of its `{{else}}`.
    then_branch: Option<(Vec<Piece<'a>>, usize, usize)>,
}

/// Parses with an explicit stack of open blocks, so input nesting never
/// deepens the call stack.
///
/// A block that reaches the end of input unclosed is abandoned: its opener
/// becomes text and scanning resumes right after it, one level up. Abandoned
/// positions are remembered, which keeps every opener from being retried.
/// Whether an opener can close does not depend on how deeply it sits, so the
/// memo holds at any depth. The nesting limit is applied when a block closes,
/// once its real depth is known.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    options: Options,
    root: Body<'a>,
    open: Vec<OpenBlock<'a>>,
    unclosed: HashSet<usize>,
    /// Start of the last closing tag of each kind anywhere in the input.
    last_closer: HashMap<BlockKind, usize>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: Options) -> Self {
        let mut parser = Parser {
            input,
            pos: 0,
            options,
            root: Body::new(0),
            open: Vec::new(),
            unclosed: HashSet::new(),
            last_closer: HashMap::new(),
        };
        parser.last_closer = parser.find_last_closers();
        parser
    }

    #[inline]
    fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// Builds an error located at byte offset `at`, with 1-indexed line and
    /// character column.
    fn make_error(&self, at: usize, kind: ParseErrorKind) -> ParseError {
        let before = self.input.get(..at).unwrap_or(self.input);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |current_line| current_line.chars().count())
            + 1;
        ParseError { line, column, kind }
    }

    /// Recognises the tag starting at byte offset `at`, which must sit on `{{`.
    ///
    /// Returns the tag and its length in bytes, or `None` if the text there
    /// is not a well-formed tag.
    fn scan_tag_at(&self, at: usize) -> Option<(Tag<'a>, usize)> {
        let rest = self.input.get(at..)?;
        let padded = self.options.allow_padding;

        if let Some(inner) = rest.strip_prefix("{{{") {
            let end = inner.find("}}}")?;
            let path = inner.get(..end)?;
            let path = if padded { path.trim_ascii() } else { path };
            return is_valid_path(path)
                .then_some((Tag::Placeholder { path, escaped: false }, end + 6));
        }

        let inner = rest.strip_prefix("{{")?;
        let end = inner.find("}}")?;
        let tag = classify(inner.get(..end)?, padded)?;
        Some((tag, end + 4))
    }

    fn find_last_closers(&self) -> HashMap<BlockKind, usize> {
        let mut last = HashMap::new();
        let mut from = 0;
        while let Some(offset) = self.input.get(from..).and_then(|rest| rest.find("{{")) {
            let at = from + offset;
            if let Some((Tag::Close(kind), _)) = self.scan_tag_at(at) {
                last.insert(kind, at);
            }
            from = at + 1;
        }
        last
    }

    fn body_mut(&mut self) -> &mut Body<'a> {
        match self.open.last_mut() {
            Some(block) => &mut block.body,
            None => &mut self.root,
        }
    }

    fn run(&mut self) -> ParseResult<Vec<AstNode<'a>>> {
        loop {
            let Some(offset) = self.rest().find("{{") else {
                let Some(block) = self.open.pop() else {
                    self.root.flush(self.input.len());
                    let pieces = std::mem::take(&mut self.root.pieces);
                    return Ok(into_nodes(self.input, pieces));
                };
                if self.options.strict {
                    return Err(self.make_error(
                        self.input.len(),
                        ParseErrorKind::UnclosedBlock {
                            keyword: block.kind.keyword().to_string(),
                        },
                    ));
                }
                self.abandon(&block);
                continue;
            };

            let tag_start = self.pos + offset;
            self.pos = tag_start;

            let Some((tag, tag_len)) = self.scan_tag_at(tag_start) else {
                if self.options.strict {
                    return Err(self.make_error(
                        tag_start,
                        ParseErrorKind::InvalidTag {
                            found: self.rest().chars().take(24).collect(),
                        },
                    ));
                }
                // Keep one brace as text and rescan from the next one.
                self.pos += 1;
                continue;
            };
            let tag_end = tag_start + tag_len;

            match tag {
                Tag::Placeholder { path, escaped } => {
                    self.push_node(AstNode::Placeholder { path, escaped }, tag_start, tag_end);
                }
                Tag::Open { kind, path } => self.open_block(kind, path, tag_start, tag_end)?,
                Tag::Else => self.else_tag(tag_start, tag_end),
                Tag::Close(kind) if self.open.last().is_some_and(|block| block.kind == kind) => {
                    self.close_block(tag_start, tag_end);
                }
                Tag::Close(_) => {
                    let stray = self.input.get(tag_start..tag_end).unwrap_or_default();
                    if self.options.strict {
                        return Err(self.make_error(
                            tag_start,
                            ParseErrorKind::UnexpectedTag {
                                tag: stray.to_string(),
                            },
                        ));
                    }
                    tracing::debug!(tag = stray, offset = tag_start, "Stray tag left as text");
                    self.pos = tag_end;
                }
            }
        }
    }

    fn push_node(&mut self, node: AstNode<'a>, tag_start: usize, tag_end: usize) {
        let body = self.body_mut();
        body.flush(tag_start);
        body.pieces.push(Piece::Node(node));
        body.text_start = tag_end;
        self.pos = tag_end;
    }

    fn open_block(
        &mut self,
        kind: BlockKind,
        path: &'a str,
        tag_start: usize,
        tag_end: usize,
    ) -> ParseResult<()> {
        self.pos = tag_end;
        if self.unclosed.contains(&tag_start) {
            return Ok(());
        }

        if self.options.strict {
            if self.open.len() >= self.options.max_depth {
                return Err(self.make_error(
                    tag_start,
                    ParseErrorKind::NestingTooDeep {
                        limit: self.options.max_depth,
                    },
                ));
            }
        } else if self
            .last_closer
            .get(&kind)
            .is_none_or(|&closer| closer < tag_end)
        {
            tracing::debug!(
                keyword = kind.keyword(),
                offset = tag_start,
                "Block without any closing tag left as text"
            );
            self.unclosed.insert(tag_start);
            return Ok(());
        }

        self.open.push(OpenBlock {
            kind,
            path,
            tag_start,
            tag_end,
            body: Body::new(tag_end),
            then_branch: None,
        });
        Ok(())
    }

    /// `{{else}}` splits the innermost `if`; anywhere else `else` is an
    /// ordinary path.
    fn else_tag(&mut self, tag_start: usize, tag_end: usize) {
        let splits_if = self
            .open
            .last()
            .is_some_and(|block| block.kind == BlockKind::If && block.then_branch.is_none());
        if !splits_if {
            let node = AstNode::Placeholder {
                path: "else",
                escaped: true,
            };
            self.push_node(node, tag_start, tag_end);
            return;
        }

        if let Some(block) = self.open.last_mut() {
            block.body.flush(tag_start);
            let then_pieces = std::mem::take(&mut block.body.pieces);
            block.then_branch = Some((then_pieces, tag_start, tag_end));
            block.body.text_start = tag_end;
        }
        self.pos = tag_end;
    }

    fn close_block(&mut self, tag_start: usize, tag_end: usize) {
        let Some(mut block) = self.open.pop() else {
            return;
        };
        block.body.flush(tag_start);
        self.pos = tag_end;

        if self.open.len() >= self.options.max_depth {
            tracing::warn!(
                limit = self.options.max_depth,
                offset = block.tag_start,
                "Block nesting limit reached, block left as text"
            );
            let parent = self.body_mut();
            parent.flush(block.tag_end);
            if let Some((then_pieces, else_start, else_end)) = block.then_branch {
                parent.append(then_pieces);
                parent.push_text(else_start, else_end);
            }
            parent.append(block.body.pieces);
            parent.text_start = tag_start;
            return;
        }

        let input = self.input;
        let body = into_nodes(input, block.body.pieces);
        let node = match block.kind {
            BlockKind::If => match block.then_branch {
                Some((then_pieces, ..)) => AstNode::Conditional {
                    path: block.path,
                    then_body: into_nodes(input, then_pieces),
                    else_body: Some(body),
                },
                None => AstNode::Conditional {
                    path: block.path,
                    then_body: body,
                    else_body: None,
                },
            },
            BlockKind::Unless => AstNode::NegatedConditional {
                path: block.path,
                body,
            },
            BlockKind::Each => AstNode::Loop {
                path: block.path,
                body,
            },
        };
        self.push_node(node, block.tag_start, tag_end);
    }

    fn abandon(&mut self, block: &OpenBlock<'a>) {
        tracing::debug!(
            keyword = block.kind.keyword(),
            offset = block.tag_start,
            "Unclosed block left as text"
        );
        self.unclosed.insert(block.tag_start);
        self.pos = block.tag_end;
    }
}

fn into_nodes<'a>(input: &'a str, pieces: Vec<Piece<'a>>) -> Vec<AstNode<'a>> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(start, end) => AstNode::Text(input.get(start..end).unwrap_or_default()),
            Piece::Node(node) => node,
        })
        .collect()
}

/// Classifies the contents of a `{{ ... }}` tag. Without `padded`, only the
/// exact forms `path`, `else`, `#keyword path` and `/keyword` are tags.
fn classify(content: &str, padded: bool) -> Option<Tag<'_>> {
    let content = if padded { content.trim_ascii() } else { content };

    if content == "else" {
        return Some(Tag::Else);
    }

    if let Some(keyword) = content.strip_prefix('/') {
        let keyword = if padded { keyword.trim_ascii_start() } else { keyword };
        return BlockKind::from_keyword(keyword).map(Tag::Close);
    }

    if let Some(directive) = content.strip_prefix('#') {
        let (keyword, path) = if padded {
            let (keyword, path) = directive.split_once(|c: char| c.is_ascii_whitespace())?;
            (keyword, path.trim_ascii())
        } else {
            directive.split_once(' ')?
        };
        let kind = BlockKind::from_keyword(keyword)?;
        return is_valid_path(path).then_some(Tag::Open { kind, path });
    }

    is_valid_path(content).then_some(Tag::Placeholder {
        path: content,
        escaped: true,
    })
}

/// A path is one or more `[A-Za-z0-9_]+` segments joined by `.`; the first
/// segment may carry a leading `@`.
pub(crate) fn is_valid_path(path: &str) -> bool {
    path.split('.').enumerate().all(|(position, segment)| {
        let name = if position == 0 {
            segment.strip_prefix('@').unwrap_or(segment)
        } else {
            segment
        };
        !name.is_empty()
            && name
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
    })
}

pub(crate) fn parse<'a>(input: &'a str, options: &Options) -> ParseResult<Vec<AstNode<'a>>> {
    Parser::new(input, *options).run()
}
