//! Lexer for JavaScript source code
//!
//! Converts source text into a stream of tokens. Regular expression literals
//! and template continuations depend on parser context, so the parser asks
//! for them explicitly via [`Lexer::rescan_as_regexp`] and
//! [`Lexer::rescan_template_continuation`].

use std::iter::Peekable;
use std::str::CharIndices;

use crate::value::JsString;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(JsString),
    RegExp(String, String), // (pattern, flags)
    True,
    False,
    Null,

    Identifier(JsString),

    // Keywords
    Let,
    Const,
    Var,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    This,
    Typeof,
    Instanceof,
    In,
    Void,
    Delete,

    // Punctuators, spelled out in `punctuator`
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    Eq,
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LtLt,
    GtGt,
    GtGtGt,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Question,
    QuestionQuestion,
    QuestionDot,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
    GtGtGtEq,
    AmpAmpEq,
    PipePipeEq,
    QuestionQuestionEq,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    DotDotDot,
    Comma,
    Colon,
    Semicolon,
    Arrow,

    // Template literals
    TemplateHead(JsString),   // `...${
    TemplateMiddle(JsString), // }...${
    TemplateTail(JsString),   // }...`
    TemplateNoSub(JsString),  // `...`

    Eof,
    Invalid(char),
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state checkpoint for backtracking
#[derive(Clone)]
pub struct LexerCheckpoint {
    current_pos: usize,
    line: u32,
    column: u32,
    saw_newline: bool,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Offset of `chars` into `source` after a reset
    chars_base_offset: usize,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Set when a line terminator preceded the current token (ASI)
    saw_newline: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            chars_base_offset: 0,
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            current_pos: self.current_pos,
            line: self.line,
            column: self.column,
            saw_newline: self.saw_newline,
        }
    }

    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.saw_newline = checkpoint.saw_newline;
        self.reset_to(checkpoint.current_pos, checkpoint.line, checkpoint.column);
    }

    fn reset_to(&mut self, pos: usize, line: u32, column: u32) {
        self.current_pos = pos;
        self.line = line;
        self.column = column;
        self.start_pos = pos;
        self.start_line = line;
        self.start_column = column;
        self.chars_base_offset = pos;
        self.chars = self
            .source
            .get(pos..)
            .unwrap_or("")
            .char_indices()
            .peekable();
    }

    /// Reset to the start of `span` and scan a regular expression literal.
    /// Used when the parser finds `/` or `/=` in operand position.
    pub fn rescan_as_regexp(&mut self, span: Span) -> Token {
        self.reset_to(span.start, span.line, span.column);
        self.scan_regexp()
    }

    /// Reset to just after the `}` closing a template substitution and scan
    /// the next template chunk.
    pub fn rescan_template_continuation(&mut self, rbrace_span: Span) -> Token {
        self.reset_to(rbrace_span.end, rbrace_span.line, rbrace_span.column + 1);
        self.start_pos = rbrace_span.start;
        self.start_column = rbrace_span.column;
        let kind = self.scan_template(true);
        Token::new(kind, self.make_span())
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some((_pos, ch)) = self.advance() else {
            return Token::eof(self.current_pos, self.line, self.column);
        };

        let kind = match ch {
            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(false),
            '0'..='9' => self.scan_number(ch),
            '.' if matches!(self.peek(), Some('0'..='9')) => self.scan_number(ch),
            c if is_id_start(c) => self.scan_identifier(c),
            c => self.scan_punctuator(c),
        };

        Token::new(kind, self.make_span())
    }

    /// Check if there was a newline before the current position
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = self.chars_base_offset + pos + ch.len_utf8();
            if is_line_terminator(ch) {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn skip_whitespace_and_comments(&mut self) {
        self.saw_newline = false;
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                self.saw_newline = true;
            } else if ch == '/' && self.peek_next() == Some('/') {
                self.skip_line_comment();
                continue;
            } else if ch == '/' && self.peek_next() == Some('*') {
                self.skip_block_comment();
                continue;
            } else if !is_blank(ch) {
                return;
            }
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|ch| !is_line_terminator(ch)) {
            self.advance();
        }
    }

    /// A block comment spanning lines counts as a line break for ASI
    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();
        let mut prev = '\0';
        while let Some((_, ch)) = self.advance() {
            if prev == '*' && ch == '/' {
                return;
            }
            if is_line_terminator(ch) {
                self.saw_newline = true;
            }
            prev = ch;
        }
    }

    /// Longest punctuator starting with `first`, which is already consumed
    fn scan_punctuator(&mut self, first: char) -> TokenKind {
        let rest = self.source.get(self.start_pos..).unwrap_or("");
        for len in (2..=4).rev() {
            let Some(kind) = rest.get(..len).and_then(punctuator) else {
                continue;
            };
            // `a?.5:1` is a conditional, not optional chaining
            if kind == TokenKind::QuestionDot && matches!(self.peek_next(), Some('0'..='9')) {
                continue;
            }
            for _ in 1..len {
                self.advance();
            }
            return kind;
        }
        punctuator(first.encode_utf8(&mut [0; 4])).unwrap_or(TokenKind::Invalid(first))
    }

    /// Scan a regular expression literal starting at the current `/`
    fn scan_regexp(&mut self) -> Token {
        self.advance();

        let mut pattern = String::new();
        let mut in_class = false;

        loop {
            match self.advance() {
                Some((_, '/')) if !in_class => break,
                Some((_, '[')) => {
                    in_class = true;
                    pattern.push('[');
                }
                Some((_, ']')) => {
                    in_class = false;
                    pattern.push(']');
                }
                Some((_, '\\')) => {
                    pattern.push('\\');
                    if let Some((_, c)) = self.advance() {
                        pattern.push(c);
                    }
                }
                Some((_, c)) if is_line_terminator(c) => {
                    return Token::new(TokenKind::Invalid('/'), self.make_span());
                }
                Some((_, c)) => pattern.push(c),
                None => return Token::new(TokenKind::Invalid('/'), self.make_span()),
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphabetic() {
                flags.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::RegExp(pattern, flags), self.make_span())
    }

    /// Scan the escape following a backslash, pushing the decoded text
    fn scan_escape(&mut self, value: &mut String) -> bool {
        match self.advance() {
            Some((_, 'n')) => value.push('\n'),
            Some((_, 'r')) => value.push('\r'),
            Some((_, 't')) => value.push('\t'),
            Some((_, 'b')) => value.push('\x08'),
            Some((_, 'f')) => value.push('\x0C'),
            Some((_, 'v')) => value.push('\x0B'),
            Some((_, '0')) if !matches!(self.peek(), Some('0'..='9')) => value.push('\0'),
            Some((_, 'x')) => {
                if let Some(ch) = self.scan_hex_escape(2).and_then(char::from_u32) {
                    value.push(ch);
                }
            }
            Some((_, 'u')) => {
                if self.match_char('{') {
                    let mut hex_str = String::new();
                    while let Some(ch) = self.peek() {
                        self.advance();
                        if ch == '}' {
                            break;
                        }
                        hex_str.push(ch);
                    }
                    if let Some(ch) = u32::from_str_radix(&hex_str, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        value.push(ch);
                    }
                } else if let Some(code) = self.scan_hex_escape(4) {
                    // Lone surrogates cannot live in a Rust string
                    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
            }
            // Line continuation
            Some((_, '\r')) => {
                self.match_char('\n');
            }
            Some((_, c)) if is_line_terminator(c) => {}
            Some((_, c)) => value.push(c),
            None => return false,
        }
        true
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => {
                    if !self.scan_escape(&mut value) {
                        return TokenKind::Invalid(quote);
                    }
                }
                Some((_, '\n')) | None => return TokenKind::Invalid(quote),
                Some((_, c)) => value.push(c),
            }
        }

        TokenKind::String(JsString::from(value))
    }

    fn scan_hex_escape(&mut self, count: usize) -> Option<u32> {
        let mut hex_str = String::new();
        for _ in 0..count {
            match self.peek() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    hex_str.push(ch);
                    self.advance();
                }
                _ => return None,
            }
        }
        u32::from_str_radix(&hex_str, 16).ok()
    }

    /// Scan template text up to the closing backtick or the next `${`.
    /// `continuation` selects the Middle/Tail token kinds used after a substitution.
    fn scan_template(&mut self, continuation: bool) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, '`')) => {
                    let text = JsString::from(value);
                    return if continuation {
                        TokenKind::TemplateTail(text)
                    } else {
                        TokenKind::TemplateNoSub(text)
                    };
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    let text = JsString::from(value);
                    return if continuation {
                        TokenKind::TemplateMiddle(text)
                    } else {
                        TokenKind::TemplateHead(text)
                    };
                }
                Some((_, '\\')) => {
                    if !self.scan_escape(&mut value) {
                        break;
                    }
                }
                Some((_, c)) => value.push(c),
                None => break,
            }
        }

        TokenKind::Invalid('`')
    }

    fn scan_digits(&mut self, radix: u32, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                out.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut num_str = String::new();

        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.scan_digits(radix, &mut num_str);
                return match u64::from_str_radix(&num_str, radix) {
                    Ok(value) => TokenKind::Number(value as f64),
                    Err(_) => TokenKind::Invalid(first),
                };
            }
            if matches!(self.peek(), Some('0'..='7')) {
                // Legacy octal literal
                self.scan_digits(8, &mut num_str);
                return match u64::from_str_radix(&num_str, 8) {
                    Ok(value) => TokenKind::Number(value as f64),
                    Err(_) => TokenKind::Invalid(first),
                };
            }
        }

        if first == '.' {
            num_str.push_str("0.");
            self.scan_digits(10, &mut num_str);
        } else {
            num_str.push(first);
            self.scan_digits(10, &mut num_str);
            // A dot after integer digits always belongs to the literal (`1..toString()`)
            if self.peek() == Some('.') {
                self.advance();
                num_str.push('.');
                self.scan_digits(10, &mut num_str);
            }
        }

        if matches!(self.peek(), Some('e' | 'E'))
            && matches!(self.peek_next(), Some('0'..='9' | '+' | '-'))
        {
            self.advance();
            num_str.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.advance();
                num_str.push(sign);
            }
            self.scan_digits(10, &mut num_str);
        }

        // "1." is a complete literal, Rust's parser wants a digit after the dot
        if num_str.ends_with('.') {
            num_str.push('0');
        }

        TokenKind::Number(num_str.parse().unwrap_or(f64::NAN))
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        keyword(&name).unwrap_or_else(|| TokenKind::Identifier(JsString::from(name)))
    }
}

const KEYWORDS: [&str; 29] = [
    "true", "false", "null", "let", "const", "var", "function", "return", "if", "else", "for",
    "while", "do", "break", "continue", "switch", "case", "default", "try", "catch", "finally",
    "throw", "new", "this", "typeof", "instanceof", "in", "void", "delete",
];

fn keyword(name: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match name {
        "true" => True,
        "false" => False,
        "null" => Null,
        "let" => Let,
        "const" => Const,
        "var" => Var,
        "function" => Function,
        "return" => Return,
        "if" => If,
        "else" => Else,
        "for" => For,
        "while" => While,
        "do" => Do,
        "break" => Break,
        "continue" => Continue,
        "switch" => Switch,
        "case" => Case,
        "default" => Default,
        "try" => Try,
        "catch" => Catch,
        "finally" => Finally,
        "throw" => Throw,
        "new" => New,
        "this" => This,
        "typeof" => Typeof,
        "instanceof" => Instanceof,
        "in" => In,
        "void" => Void,
        "delete" => Delete,
        _ => return None,
    })
}

/// The source text of a keyword token, for keywords used as property names
pub fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .copied()
        .find(|name| keyword(name).as_ref() == Some(kind))
}

fn punctuator(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "(" => LParen,
        ")" => RParen,
        "{" => LBrace,
        "}" => RBrace,
        "[" => LBracket,
        "]" => RBracket,
        "," => Comma,
        ";" => Semicolon,
        ":" => Colon,
        "~" => Tilde,
        "." => Dot,
        "..." => DotDotDot,
        "=>" => Arrow,
        "?" => Question,
        "?." => QuestionDot,
        "??" => QuestionQuestion,
        "??=" => QuestionQuestionEq,
        "+" => Plus,
        "++" => PlusPlus,
        "+=" => PlusEq,
        "-" => Minus,
        "--" => MinusMinus,
        "-=" => MinusEq,
        "*" => Star,
        "*=" => StarEq,
        "**" => StarStar,
        "**=" => StarStarEq,
        "/" => Slash,
        "/=" => SlashEq,
        "%" => Percent,
        "%=" => PercentEq,
        "=" => Eq,
        "==" => EqEq,
        "===" => EqEqEq,
        "!" => Bang,
        "!=" => BangEq,
        "!==" => BangEqEq,
        "<" => Lt,
        "<=" => LtEq,
        "<<" => LtLt,
        "<<=" => LtLtEq,
        ">" => Gt,
        ">=" => GtEq,
        ">>" => GtGt,
        ">>=" => GtGtEq,
        ">>>" => GtGtGt,
        ">>>=" => GtGtGtEq,
        "&" => Amp,
        "&=" => AmpEq,
        "&&" => AmpAmp,
        "&&=" => AmpAmpEq,
        "|" => Pipe,
        "|=" => PipeEq,
        "||" => PipePipe,
        "||=" => PipePipeEq,
        "^" => Caret,
        "^=" => CaretEq,
        _ => return None,
    })
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}')
}

fn is_line_terminator(ch: char) -> bool {
    ch == '\n' || ch == '\u{2028}' || ch == '\u{2029}'
}

/// Check if a character can start an identifier
pub fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

/// Check if a character can continue an identifier
pub fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric() || ch == '\u{200C}' || ch == '\u{200D}'
}
