//! The context-stack tokenizer.

// third-party imports
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;
// my imports
use crate::error::{TomlError, TomlResult};
use crate::grammar::{Context, Grammar, GRAMMAR};
use crate::token::{Token, TokenKind};

/// Knobs for a tokenizer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    retain_comments: bool,
    max_depth: Option<usize>,
}

impl TokenizerOptions {
    /// Keep `Comment` tokens in the output.
    pub fn retain_comments(mut self, retain: bool) -> Self {
        self.retain_comments = retain;
        self
    }

    /// Fail once the context stack grows past `depth` entries.
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Scans TOML text into a flat token sequence.
///
/// The stack starts as `[Root]`. Each step tries the rules of the top context
/// in order and applies the stack effect of the first one that matches.
#[derive(Debug)]
pub struct Tokenizer<'src> {
    source: &'src str,
    offset: usize,
    stack: Vec<Context>,
    options: TokenizerOptions,
    grammar: &'static Grammar,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, TokenizerOptions::default())
    }

    pub fn with_options(source: &'src str, options: TokenizerOptions) -> Self {
        Self {
            source,
            offset: 0,
            stack: vec![Context::Root],
            options,
            grammar: &GRAMMAR,
        }
    }

    /// Run to the end of input.
    pub fn tokenize(mut self) -> TomlResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while self.offset < self.source.len() {
            let Some(token) = self.step()? else {
                continue;
            };
            if token.kind() == TokenKind::Comment && !self.options.retain_comments {
                continue;
            }
            tokens.push(token);
        }

        while self.stack.last().is_some_and(|c| c.closes_at_eof()) {
            self.stack.pop();
        }
        if self.stack != [Context::Root] {
            let top = self.stack.last().copied().unwrap_or(Context::Root);
            return Err(self.error_at(
                self.offset,
                format!("Unexpected end of input inside {top:?}"),
            ));
        }
        Ok(tokens)
    }

    /// Apply the first matching rule of the current context.
    fn step(&mut self) -> TomlResult<Option<Token>> {
        let context = *self
            .stack
            .last()
            .ok_or_else(|| {
                self.error_at(self.offset, "Unexpected input after the end of the document".to_string())
            })?;
        let (source, grammar) = (self.source, self.grammar);
        let rest = &source[self.offset..];
        let line = match rest.find('\n') {
            Some(i) => &rest[..=i],
            None => rest,
        };

        for rule in grammar.rules(context) {
            let haystack = if rule.multiline() { rest } else { line };
            let Some(matched) = rule.find(haystack) else {
                continue;
            };
            if matched.is_empty() && !rule.pop() && rule.push().is_empty() {
                // would loop forever
                continue;
            }

            let start = self.offset;
            self.offset += matched.len();
            let token = rule.produce(matched).map_err(|err| {
                let (line, column) = self.location(start);
                err.locate(line, column)
            })?;

            if rule.pop() {
                self.stack.pop();
            }
            self.stack.extend_from_slice(rule.push());
            trace!(?context, pattern = rule.pattern(), ?token, stack = ?self.stack, "matched");

            if let Some(max) = self.options.max_depth {
                if self.stack.len() > max {
                    return Err(self.error_at(
                        start,
                        format!("Nesting exceeds the maximum depth of {max}"),
                    ));
                }
            }
            return Ok(token);
        }

        let found = rest.chars().next().map(|c| c.escape_debug().to_string()).unwrap_or_default();
        Err(self.error_at(
            self.offset,
            format!("Unexpected `{found}` in {context:?} context"),
        ))
    }

    fn error_at(&self, offset: usize, message: String) -> TomlError {
        let (line, column) = self.location(offset);
        TomlError::Syntax {
            line,
            column,
            message,
        }
    }

    /// 1-based line and grapheme column of a byte offset.
    fn location(&self, offset: usize) -> (usize, usize) {
        let before = &self.source[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].graphemes(true).count() + 1;
        (line, column)
    }
}

#[cfg(test)]
mod tests;
