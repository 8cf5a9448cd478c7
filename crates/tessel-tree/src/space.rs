//! Whitespace and comments attached to nodes and padding wrappers.

/// Formatting that precedes a node or follows a padded element.
///
/// `whitespace` is the text before the first comment. Each comment keeps the
/// whitespace that follows it as its `suffix`, so [`Space::to_source`] always
/// reproduces the text the space was formatted from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Space {
    pub whitespace: String,
    pub comments: Vec<Comment>,
}

/// A comment inside a [`Space`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Comment {
    /// Text between the comment delimiters.
    pub text: String,
    /// `true` for `/* */` comments, `false` for `//` comments.
    pub multiline: bool,
    /// Whitespace following the comment.
    pub suffix: String,
}

impl Comment {
    pub fn line(text: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { text: text.into(), multiline: false, suffix: suffix.into() }
    }

    pub fn block(text: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { text: text.into(), multiline: true, suffix: suffix.into() }
    }

    fn write_source(&self, out: &mut String) {
        if self.multiline {
            out.push_str("/*");
            out.push_str(&self.text);
            out.push_str("*/");
        } else {
            out.push_str("//");
            out.push_str(&self.text);
        }
        out.push_str(&self.suffix);
    }
}

impl Space {
    pub const EMPTY: Self = Self { whitespace: String::new(), comments: Vec::new() };

    /// A space with no comments.
    pub fn whitespace(whitespace: impl Into<String>) -> Self {
        Self { whitespace: whitespace.into(), comments: Vec::new() }
    }

    /// Splits formatting text into leading whitespace and comments.
    ///
    /// An unterminated block comment is kept verbatim as trailing text so the
    /// input still reprints unchanged.
    pub fn format(text: &str) -> Self {
        let start = next_comment(text).unwrap_or(text.len());
        let mut space = Self::whitespace(&text[..start]);
        let mut rest = &text[start..];

        while !rest.is_empty() {
            let (comment, after) = if let Some(body) = rest.strip_prefix("//") {
                let end = body.find('\n').unwrap_or(body.len());
                (Comment::line(&body[..end], ""), &body[end..])
            } else if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(end) => (Comment::block(&body[..end], ""), &body[end + 2..]),
                    None => {
                        space.push_trailing(rest);
                        break;
                    }
                }
            } else {
                space.push_trailing(rest);
                break;
            };

            let suffix_end = next_comment(after).unwrap_or(after.len());
            space.comments.push(Comment { suffix: after[..suffix_end].to_owned(), ..comment });
            rest = &after[suffix_end..];
        }

        space
    }

    pub fn is_empty(&self) -> bool {
        self.whitespace.is_empty() && self.comments.is_empty()
    }

    /// The whitespace after the last line break, i.e. the indentation of
    /// whatever follows this space.
    pub fn indent(&self) -> &str {
        let last = self.comments.last().map_or(self.whitespace.as_str(), |c| c.suffix.as_str());
        match last.rfind('\n') {
            Some(newline) => &last[newline + 1..],
            None => last,
        }
    }

    pub fn with_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.whitespace = whitespace.into();
        self
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    /// Reprints the space exactly as it was formatted.
    pub fn to_source(&self) -> String {
        let mut out = self.whitespace.clone();
        for comment in &self.comments {
            comment.write_source(&mut out);
        }
        out
    }

    fn push_trailing(&mut self, text: &str) {
        match self.comments.last_mut() {
            Some(comment) => comment.suffix.push_str(text),
            None => self.whitespace.push_str(text),
        }
    }
}

fn next_comment(text: &str) -> Option<usize> {
    match (text.find("//"), text.find("/*")) {
        (Some(line), Some(block)) => Some(line.min(block)),
        (line, block) => line.or(block),
    }
}
