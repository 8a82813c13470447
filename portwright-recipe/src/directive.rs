//! Tolerant parser for the `vcpkg_from_github(...)` fetch directive.
//!
//! The recipe is lexed with CMake's argument rules (unquoted words, quoted
//! strings with backslash escapes, `[[bracket]]` arguments, `#` line comments
//! and `#[[bracket]]` comments) so that text inside comments or strings can
//! never be mistaken for the directive. Patching rewrites only the byte
//! ranges of the targeted argument values; everything else is copied
//! through unchanged.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::RecipeError;

pub const FETCH_DIRECTIVE: &str = "vcpkg_from_github";

pub const REPO_KEY: &str = "REPO";
pub const REF_KEY: &str = "REF";
pub const SHA512_KEY: &str = "SHA512";
pub const HEAD_REF_KEY: &str = "HEAD_REF";

/// Keywords understood by the fetch directive. Only single-valued keywords
/// are ever rewritten, but all of them delimit values.
const KEYWORDS: &[&str] = &[
    "OUT_SOURCE_PATH",
    REPO_KEY,
    REF_KEY,
    SHA512_KEY,
    HEAD_REF_KEY,
    "PATCHES",
    "GITHUB_HOST",
    "AUTHORIZATION_TOKEN",
    "FILE_DISAMBIGUATOR",
];

/// Upstream coordinates written into the fetch directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    /// `owner/name`
    pub repo: String,
    pub git_ref: String,
    pub sha512: String,
    pub head_ref: String,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Word,
    Quoted,
    Bracket,
    Comment,
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    span: Range<usize>,
}

fn malformed(reason: impl Into<String>) -> RecipeError {
    RecipeError::Malformed {
        reason: reason.into(),
    }
}

/// Length of a bracket opener (`[`, `=`*, `[`) at the start of `s`, and its
/// `=` count.
fn bracket_open(s: &str) -> Option<(usize, usize)> {
    let rest = s.strip_prefix('[')?;
    let level = rest.bytes().take_while(|b| *b == b'=').count();
    rest[level..].starts_with('[').then_some((level + 2, level))
}

fn lex(text: &str) -> Result<Vec<Token>, RecipeError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'(' => {
                i += 1;
                tokens.push(Token { kind: Kind::Open, span: start..i });
                continue;
            }
            b')' => {
                i += 1;
                tokens.push(Token { kind: Kind::Close, span: start..i });
                continue;
            }
            b'#' => {
                i = match bracket_open(&text[i + 1..]) {
                    Some((len, level)) => bracket_end(text, i + 1 + len, level)
                        .ok_or_else(|| malformed("unterminated bracket comment"))?,
                    None => text[i..].find('\n').map_or(bytes.len(), |n| i + n),
                };
                tokens.push(Token { kind: Kind::Comment, span: start..i });
                continue;
            }
            b'"' => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(malformed("unterminated quoted argument")),
                        Some(b'\\') => i = skip_escape(text, i),
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                tokens.push(Token { kind: Kind::Quoted, span: start..i.min(bytes.len()) });
                continue;
            }
            b'[' => {
                if let Some((len, level)) = bracket_open(&text[i..]) {
                    i = bracket_end(text, i + len, level)
                        .ok_or_else(|| malformed("unterminated bracket argument"))?;
                    tokens.push(Token { kind: Kind::Bracket, span: start..i });
                    continue;
                }
            }
            _ => {}
        }

        // Unquoted word.
        while i < bytes.len() {
            match bytes[i] {
                b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'"' | b'#' => break,
                b'\\' => i = skip_escape(text, i),
                _ => i += 1,
            }
        }
        tokens.push(Token { kind: Kind::Word, span: start..i });
    }
    Ok(tokens)
}

/// Index just past a backslash at `i` and the character it escapes.
fn skip_escape(text: &str, i: usize) -> usize {
    let next = i + 1;
    next + text[next..].chars().next().map_or(0, char::len_utf8)
}

/// Index just past the bracket closer (`]`, `level` × `=`, `]`) searched
/// from `from`.
fn bracket_end(text: &str, from: usize, level: usize) -> Option<usize> {
    let closer = format!("]{}]", "=".repeat(level));
    text.get(from..)?.find(&closer).map(|n| from + n + closer.len())
}

// ---------------------------------------------------------------------------
// Directive location
// ---------------------------------------------------------------------------

/// The argument tokens of the fetch directive and the span of its `)`.
struct Directive {
    args: Vec<Token>,
    close: Range<usize>,
}

fn locate(text: &str, tokens: &[Token]) -> Result<Directive, RecipeError> {
    let mut found: Option<Directive> = None;
    let mut i = 0;
    while i < tokens.len() {
        let is_call = tokens[i].kind == Kind::Word
            && text[tokens[i].span.clone()].eq_ignore_ascii_case(FETCH_DIRECTIVE)
            && tokens.get(i + 1).map(|t| t.kind) == Some(Kind::Open);
        if !is_call {
            i += 1;
            continue;
        }
        if found.is_some() {
            return Err(malformed(format!("more than one {FETCH_DIRECTIVE} call")));
        }

        let mut depth = 0usize;
        let mut args = Vec::new();
        let mut close = None;
        for (j, tok) in tokens.iter().enumerate().skip(i + 1) {
            match tok.kind {
                Kind::Open => depth += 1,
                Kind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some((j, tok.span.clone()));
                        break;
                    }
                }
                Kind::Comment => {}
                Kind::Word | Kind::Quoted | Kind::Bracket => args.push(tok.clone()),
            }
        }
        let Some((end, close)) = close else {
            return Err(malformed(format!("{FETCH_DIRECTIVE} call is never closed")));
        };
        found = Some(Directive { args, close });
        i = end + 1;
    }
    found.ok_or_else(|| malformed(format!("no {FETCH_DIRECTIVE} call found")))
}

fn is_keyword(text: &str, tok: &Token) -> bool {
    tok.kind == Kind::Word && KEYWORDS.contains(&&text[tok.span.clone()])
}

/// Positions of `key` and (if present) its value token within `args`.
fn find_key(text: &str, args: &[Token], key: &str) -> Option<(usize, Option<usize>)> {
    let k = args
        .iter()
        .position(|t| t.kind == Kind::Word && &text[t.span.clone()] == key)?;
    let value = args
        .get(k + 1)
        .filter(|t| !is_keyword(text, t))
        .map(|_| k + 1);
    Some((k, value))
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Render `value` as a CMake argument, quoting when required or requested.
pub fn format_value(value: &str, force_quote: bool) -> String {
    let needs_quote = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '#' | '\\' | ';' | '$'));
    if !(force_quote || needs_quote) {
        return value.to_owned();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn unquote(text: &str, tok: &Token) -> String {
    let raw = &text[tok.span.clone()];
    match tok.kind {
        Kind::Quoted => {
            let inner = &raw[1..raw.len() - 1];
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        Kind::Bracket => {
            let level = raw[1..].bytes().take_while(|b| *b == b'=').count();
            let inner = &raw[level + 2..raw.len() - level - 2];
            inner.strip_prefix('\n').unwrap_or(inner).to_owned()
        }
        _ => raw.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Keyword → value pairs of the fetch directive (single-valued keywords only;
/// quoting removed).
pub fn read_fetch_arguments(text: &str) -> Result<BTreeMap<String, String>, RecipeError> {
    let tokens = lex(text)?;
    let directive = locate(text, &tokens)?;
    let mut out = BTreeMap::new();
    for key in KEYWORDS {
        if let Some((_, Some(v))) = find_key(text, &directive.args, key) {
            out.insert((*key).to_owned(), unquote(text, &directive.args[v]));
        }
    }
    Ok(out)
}

/// Rewrite the `REF`, `SHA512`, and `HEAD_REF` values of the fetch directive.
///
/// Applying the same `spec` twice yields the same text as applying it once.
pub fn patch(text: &str, spec: &FetchSpec) -> Result<String, RecipeError> {
    let tokens = lex(text)?;
    let directive = locate(text, &tokens)?;
    let args = &directive.args;

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for (key, value) in [
        (REF_KEY, spec.git_ref.as_str()),
        (SHA512_KEY, spec.sha512.as_str()),
        (HEAD_REF_KEY, spec.head_ref.as_str()),
    ] {
        match find_key(text, args, key) {
            Some((_, Some(v))) => {
                let tok = &args[v];
                let quoted = tok.kind == Kind::Quoted;
                edits.push((tok.span.clone(), format_value(value, quoted)));
            }
            Some((k, None)) => {
                let at = args[k].span.end;
                edits.push((at..at, format!(" {}", format_value(value, false))));
            }
            None => missing.push(format!("{key} {}", format_value(value, false))),
        }
    }

    if !missing.is_empty() {
        let (at, block) = missing_insertion(text, args, directive.close.start, &missing);
        edits.push((at..at, block));
    }

    let mut out = text.to_owned();
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (range, replacement) in edits {
        out.replace_range(range, &replacement);
    }
    Ok(out)
}

/// Where and what to insert for keys the directive lacks.
///
/// When `)` sits on its own line the keys go on new lines just above it,
/// indented like the last argument. Otherwise they are appended inline
/// before `)`.
fn missing_insertion(text: &str, args: &[Token], close: usize, lines: &[String]) -> (usize, String) {
    let close_line_start = text[..close].rfind('\n').map_or(0, |n| n + 1);
    let own_line = text[close_line_start..close].trim().is_empty();
    match args.last() {
        Some(last) if own_line && last.span.end <= close_line_start => {
            let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
            let arg_line_start = text[..last.span.start].rfind('\n').map_or(0, |n| n + 1);
            let indent: String = text[arg_line_start..]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            let mut block = String::new();
            for line in lines {
                block.push_str(&indent);
                block.push_str(line);
                block.push_str(newline);
            }
            (close_line_start, block)
        }
        _ => (close, format!(" {}", lines.join(" "))),
    }
}
