//! Doc-block tokenizer
//!
//! Splits a `/** ... */` comment into its free-text summary and the ordered
//! list of `@tag body` entries. Tag bodies are kept raw; interpreting them
//! is up to the [`signature`](crate::signature) parsers.

/// A single `@name body` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name without the `@`, e.g. `method` or `property-read`
    pub name: String,
    /// Everything after the tag name, continuation lines joined by a space
    pub body: String,
}

/// Parsed doc comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    /// Text before the first tag
    pub summary: String,
    /// Tags in declaration order
    pub tags: Vec<Tag>,
}

impl DocBlock {
    /// Tokenize a raw doc comment
    pub fn parse(comment: &str) -> Self {
        let mut block = DocBlock::default();
        let inner = strip_delimiters(comment);

        for raw_line in inner.lines() {
            let line = clean_line(raw_line);
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('@') {
                let (name, body) = match rest.find(char::is_whitespace) {
                    Some(end) => (&rest[..end], rest[end..].trim()),
                    None => (rest, ""),
                };
                if !name.is_empty() {
                    block.tags.push(Tag {
                        name: name.to_string(),
                        body: body.to_string(),
                    });
                    continue;
                }
            }

            let target = match block.tags.last_mut() {
                Some(tag) => &mut tag.body,
                None => &mut block.summary,
            };
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(line);
        }

        block
    }

    /// All tags with the given name, in order
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.name == name)
    }

    /// First tag with the given name
    pub fn first(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Check if the comment has neither summary nor tags
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.tags.is_empty()
    }
}

fn strip_delimiters(comment: &str) -> &str {
    let comment = comment.trim();
    let comment = comment
        .strip_prefix("/**")
        .or_else(|| comment.strip_prefix("/*"))
        .unwrap_or(comment);
    comment.strip_suffix("*/").unwrap_or(comment)
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    match line.strip_prefix('*') {
        Some(rest) => rest.trim(),
        None => line,
    }
}
