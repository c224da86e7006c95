use serde::Serialize;

use crate::token::Position;

/// A `//` or `/* */` comment collected on the lexer's side channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Full comment text including the delimiters.
    pub text: String,
    pub position: Position,
    /// Byte offset of the first `/`.
    #[serde(skip)]
    pub offset: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub is_block: bool,
    /// A blank line separates this comment from the previous one.
    pub blank_line_before: bool,
}

impl Comment {
    /// The comment body without delimiters, trimmed.
    pub fn content(&self) -> &str {
        let body = if self.is_block {
            self.text
                .strip_prefix("/*")
                .and_then(|t| t.strip_suffix("*/"))
                .unwrap_or(&self.text)
        } else {
            self.text.strip_prefix("//").unwrap_or(&self.text)
        };
        body.trim()
    }
}

/// Adjacent comments with no blank line between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
}

impl CommentGroup {
    pub fn new(list: Vec<Comment>) -> Self {
        Self { list }
    }

    pub fn position(&self) -> Option<&Position> {
        self.list.first().map(|c| &c.position)
    }

    /// Comment bodies joined by newlines.
    pub fn text(&self) -> String {
        self.list
            .iter()
            .map(Comment::content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split `comments` into groups wherever a blank line separates neighbours.
pub fn group_comments(comments: Vec<Comment>) -> Vec<CommentGroup> {
    let mut groups = Vec::new();
    let mut current: Vec<Comment> = Vec::new();

    for comment in comments {
        let starts_new = current
            .last()
            .is_some_and(|prev| comment.position.line > prev.end_line + 1);
        if starts_new {
            groups.push(CommentGroup::new(std::mem::take(&mut current)));
        }
        current.push(comment);
    }

    if !current.is_empty() {
        groups.push(CommentGroup::new(current));
    }
    groups
}
