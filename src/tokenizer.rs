//! Tokenizer for the C dialect found in the reference interpreter sources.
//!
//! Only the subset of C that actually occurs in the reference header and
//! implementation files is supported: no exponent floats, no `L"..."`
//! strings, `#if` restricted to a bare integer or `defined(NAME)`, and
//! `#include` surfaced as a passthrough token without opening any file.
//!
//! The tokenizer has two layers. `RawTokenizer` produces atomic tokens with
//! no preprocessor awareness. `Tokenizer` sits on top, interprets
//! directives, tracks `#if` visibility, and expands macros recursively at
//! use time: the body of an applied macro is pushed back into the stream
//! and re-scanned, so macros used inside macro bodies expand on
//! application, not at definition time.

use std::collections::{HashMap, VecDeque};

use crate::errors::{GenError, Result, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ampersand,
    Arrow,
    AugAssign,
    Colon,
    Comma,
    Compare,
    Decrement,
    Define,
    Directive,
    DivOperator,
    Dot,
    Ellipsis,
    Equal,
    Identifier,
    Include,
    Increment,
    Keyword,
    LeftBrace,
    LeftBracket,
    LeftPar,
    Minus,
    Newline,
    Null,
    Number,
    Operator,
    Plus,
    QuestionMark,
    RightBrace,
    RightBracket,
    RightPar,
    Semicolon,
    ShiftOperator,
    Star,
    StringLit,
    Symbol,
    UnaryOp,
    VarArgs,
}

/// One token: kind, character offset in the source, and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, pos: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            text: text.into(),
        }
    }
}

pub const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "const", "continue", "do", "default", "else", "enum", "extern",
    "for", "if", "goto", "register", "return", "sizeof", "static", "struct", "switch", "typedef",
    "union", "volatile", "while",
];

fn single_char_kind(ch: char) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ch {
        '(' => LeftPar,
        ')' => RightPar,
        '[' => LeftBracket,
        ']' => RightBracket,
        '{' => LeftBrace,
        '}' => RightBrace,
        ';' => Semicolon,
        ',' => Comma,
        ':' => Colon,
        '.' => Dot,
        '?' => QuestionMark,
        '=' => Equal,
        '*' => Star,
        '+' => Plus,
        '-' => Minus,
        '~' | '!' => UnaryOp,
        '&' => Ampersand,
        '/' | '%' => DivOperator,
        '|' | '^' => Operator,
        '<' | '>' => Compare,
        _ => return None,
    })
}

fn double_char_kind(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "->" => Arrow,
        "==" | "!=" | "<=" | ">=" => Compare,
        "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" => AugAssign,
        "&&" | "||" => Operator,
        "<<" | ">>" => ShiftOperator,
        "++" => Increment,
        "--" => Decrement,
        _ => return None,
    })
}

fn triple_char_kind(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "..." => Ellipsis,
        ">>=" | "<<=" => AugAssign,
        _ => return None,
    })
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// A preprocessor macro: formal parameter names (`None` for an object-like
/// macro) and the unexpanded body tokens. A trailing `...` formal marks the
/// macro variadic; the `##__VA_ARGS__` splice token in the body is replaced
/// by the captured remainder arguments.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub has_params: bool,
    pub variadic: bool,
    pub body: Vec<Token>,
}

impl Macro {
    pub fn new(name: impl Into<String>, params: Option<Vec<String>>, body: Vec<Token>) -> Self {
        let has_params = params.is_some();
        let mut params = params.unwrap_or_default();
        let variadic = params.last().map(|p| p == "...").unwrap_or(false);
        if variadic {
            params.pop();
        }
        Self {
            name: name.into(),
            params,
            has_params,
            variadic,
            body,
        }
    }
}

pub type MacroTable = HashMap<String, Macro>;

/// Defines a macro by running a one-line `#define` through a scratch
/// tokenizer over the given table.
pub fn define_macro(macros: &mut MacroTable, name: &str, body: &str) -> Result<()> {
    let text = format!("#define {} {}\n", name, body);
    let mut tokenizer = Tokenizer::new(&text, macros);
    tokenizer.read_all()
}

/// The raw lexer. Emits atomic tokens without any preprocessor semantics;
/// whitespace, comments and backslash-newline continuations are skipped.
/// The one wrinkle: after a `#directive` at the start of a line, the next
/// newline is emitted as a token so the directive line can be delimited.
pub struct RawTokenizer {
    source: Vec<char>,
    index: usize,
    want_line_break: bool,
}

impl RawTokenizer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            index: 0,
            want_line_break: false,
        }
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn starts_with(&self, i: usize, pat: &str) -> bool {
        let chars: Vec<char> = pat.chars().collect();
        i + chars.len() <= self.source.len() && self.source[i..i + chars.len()] == chars[..]
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let src_len = self.source.len();
        let mut i = self.index;

        // Skip whitespace and comments, including newlines masked with a
        // backslash. A pending directive line turns the next newline into
        // a token instead.
        loop {
            while i < src_len && self.source[i] <= ' ' {
                if self.source[i] == '\n' && self.want_line_break {
                    self.want_line_break = false;
                    self.index = i + 1;
                    return Some(Token::new(TokenKind::Newline, i, "\n"));
                }
                i += 1;
            }
            if self.starts_with(i, "//") {
                while i < src_len && self.source[i] != '\n' {
                    i += 1;
                }
                if i < src_len {
                    i += 1;
                }
            } else if self.starts_with(i, "/*") {
                i += 4;
                while i <= src_len && !(i >= 2 && self.starts_with(i - 2, "*/")) {
                    i += 1;
                }
            } else if self.starts_with(i, "\\\n") {
                i += 2;
            } else {
                break;
            }
        }

        if i >= src_len {
            self.index = src_len;
            return None;
        }

        let ch = self.source[i];

        if ch == '#' {
            let mut j = i;
            while j < src_len && self.source[j] == '#' {
                j += 1;
            }
            let single_hash = j == i + 1;
            let at_line_start = i == 0 || self.source[i - 1] == '\n';
            self.want_line_break = self.want_line_break || (single_hash && at_line_start);
            while j < src_len && is_ident_continue(self.source[j]) {
                j += 1;
            }
            let text = self.text(i, j);
            self.index = j;
            if text == "##__VA_ARGS__" {
                return Some(Token::new(TokenKind::VarArgs, i, text));
            }
            return Some(Token::new(TokenKind::Directive, i, text));
        }

        if is_ident_start(ch) {
            let mut j = i;
            while j < src_len && is_ident_continue(self.source[j]) {
                j += 1;
            }
            let text = self.text(i, j);
            self.index = j;
            return Some(Token::new(TokenKind::Identifier, i, text));
        }

        if ch == '0'
            && i + 2 < src_len
            && (self.source[i + 1] == 'x' || self.source[i + 1] == 'X')
            && self.source[i + 2].is_ascii_hexdigit()
        {
            let start = i;
            let mut j = i + 2;
            while j < src_len && self.source[j].is_ascii_hexdigit() {
                j += 1;
            }
            let text = self.text(start, j);
            self.index = j;
            return Some(Token::new(TokenKind::Number, start, text));
        }

        if ch.is_ascii_digit() || (ch == '.' && i + 1 < src_len && self.source[i + 1].is_ascii_digit())
        {
            // Integer values and simple fractions only; no exponent form.
            let start = i;
            let mut j = i;
            if ch == '.' {
                j += 1;
            }
            while j < src_len && self.source[j].is_ascii_digit() {
                j += 1;
            }
            if ch != '.' && j + 1 < src_len && self.source[j] == '.' {
                j += 1;
                while j < src_len && self.source[j].is_ascii_digit() {
                    j += 1;
                }
            }
            let text = self.text(start, j);
            self.index = j;
            return Some(Token::new(TokenKind::Number, start, text));
        }

        if ch == '"' || ch == '\'' {
            let start = i;
            let mut j = i + 1;
            while j < src_len && self.source[j] != ch {
                if self.source[j] == '\\' && j + 1 < src_len {
                    j += 2;
                } else {
                    j += 1;
                }
            }
            if j < src_len {
                j += 1;
            }
            let text = self.text(start, j);
            self.index = j;
            return Some(Token::new(TokenKind::StringLit, start, text));
        }

        if i + 3 <= src_len {
            let three = self.text(i, i + 3);
            if let Some(kind) = triple_char_kind(&three) {
                self.index = i + 3;
                return Some(Token::new(kind, i, three));
            }
        }
        if i + 2 <= src_len {
            let two = self.text(i, i + 2);
            if let Some(kind) = double_char_kind(&two) {
                self.index = i + 2;
                return Some(Token::new(kind, i, two));
            }
        }
        if let Some(kind) = single_char_kind(ch) {
            self.index = i + 1;
            return Some(Token::new(kind, i, ch.to_string()));
        }

        // Anything unrecognised becomes an opaque symbol token; the parser
        // has its own statement-level recovery.
        self.index = i + 1;
        Some(Token::new(TokenKind::Symbol, i, ch.to_string()))
    }
}

/// The preprocessing tokenizer. Handles directives, tracks the conditional
/// stack, and expands every known macro. The macro table is borrowed from
/// the caller so that definitions learned in one file remain visible when
/// later files are tokenized.
pub struct Tokenizer<'m> {
    raw: RawTokenizer,
    cache: VecDeque<Token>,
    if_stack: Vec<bool>,
    macros: &'m mut MacroTable,
}

impl<'m> Tokenizer<'m> {
    pub fn new(source: &str, macros: &'m mut MacroTable) -> Self {
        let mut text = source.to_string();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Self {
            raw: RawTokenizer::new(&text),
            cache: VecDeque::new(),
            if_stack: Vec::new(),
            macros,
        }
    }

    // A token is visible only when every enclosing conditional holds; a
    // true inner `#if` cannot reopen a region hidden by an outer one.
    fn visible(&self) -> bool {
        self.if_stack.iter().all(|&v| v)
    }

    /// Returns the next fully preprocessed token.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let token = match self.cache.pop_front() {
                Some(t) => t,
                None => match self.raw.next_token() {
                    Some(t) => t,
                    None => return Ok(None),
                },
            };

            if token.kind == TokenKind::Directive {
                if let Some(passthrough) = self.handle_directive(&token)? {
                    return Ok(Some(passthrough));
                }
                continue;
            }

            if !self.visible() {
                continue;
            }

            if token.kind == TokenKind::Identifier {
                if self.macros.contains_key(&token.text) {
                    let mac = self.macros[&token.text].clone();
                    let expansion = self.apply_macro(&mac, token.pos)?;
                    for (n, t) in expansion.into_iter().enumerate() {
                        self.cache.insert(n, t);
                    }
                    continue;
                }
                if KEYWORDS.contains(&token.text.as_str()) {
                    return Ok(Some(Token::new(TokenKind::Keyword, token.pos, token.text)));
                }
                if token.text == "NULL" {
                    return Ok(Some(Token::new(TokenKind::Null, token.pos, token.text)));
                }
            }
            return Ok(Some(token));
        }
    }

    /// Processes one directive line. Directives are interpreted even inside
    /// invisible regions so that conditional nesting stays balanced and
    /// macro registration is independent of visibility. Returns a
    /// passthrough token for visible `#define`/`#include` lines.
    fn handle_directive(&mut self, directive: &Token) -> Result<Option<Token>> {
        let mut line: Vec<String> = Vec::new();
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            let token = self.raw.next_token().ok_or_else(|| {
                GenError::lex(
                    format!("unterminated directive '{}'", directive.text),
                    SourceLocation::at(directive.pos),
                )
            })?;
            if token.kind == TokenKind::Newline {
                break;
            }
            line.push(token.text.clone());
            tokens.push(token);
        }
        let text: String = line.concat();

        match directive.text.as_str() {
            "#if" => {
                if line.len() == 4 && line[0] == "defined" && line[1] == "(" && line[3] == ")" {
                    self.if_stack.push(self.macros.contains_key(&line[2]));
                } else if line.len() == 1 {
                    let value: i64 = line[0].parse().map_err(|_| {
                        GenError::lex(
                            format!("cannot evaluate: '{}'", text),
                            SourceLocation::at(directive.pos),
                        )
                    })?;
                    self.if_stack.push(value != 0);
                } else {
                    return Err(GenError::lex(
                        format!("cannot evaluate: '{}'", text),
                        SourceLocation::at(directive.pos),
                    ));
                }
            }
            "#ifdef" => {
                self.if_stack.push(self.macros.contains_key(&text));
            }
            "#ifndef" => {
                self.if_stack.push(!self.macros.contains_key(&text));
            }
            "#endif" => {
                self.if_stack.pop().ok_or_else(|| {
                    GenError::lex("unbalanced #endif", SourceLocation::at(directive.pos))
                })?;
            }
            "#else" => {
                let top = self.if_stack.last_mut().ok_or_else(|| {
                    GenError::lex("unbalanced #else", SourceLocation::at(directive.pos))
                })?;
                *top = !*top;
            }
            "#define" => {
                let summary;
                if line.len() == 1 {
                    summary = text.clone();
                    self.macros
                        .insert(text.clone(), Macro::new(text, None, Vec::new()));
                } else {
                    let name = line[0].clone();
                    let close = line[..line.len() - 1].iter().position(|t| t == ")");
                    if line[1] == "(" && close.is_some() {
                        let i = close.unwrap() + 1;
                        summary = format!("{} := {}", line[..i].concat(), line[i..].concat());
                        // Formals sit at every other position between the parens.
                        let params: Vec<String> =
                            line[2..i].iter().step_by(2).cloned().collect();
                        self.macros.insert(
                            name.clone(),
                            Macro::new(name, Some(params), tokens[i..].to_vec()),
                        );
                    } else {
                        summary = format!("{} := {}", line[0], line[1..].concat());
                        self.macros.insert(
                            name.clone(),
                            Macro::new(name, Some(Vec::new()), tokens[1..].to_vec()),
                        );
                    }
                }
                if self.visible() {
                    return Ok(Some(Token::new(TokenKind::Define, directive.pos, summary)));
                }
            }
            "#include" => {
                if self.visible() {
                    return Ok(Some(Token::new(TokenKind::Include, directive.pos, text)));
                }
            }
            other => {
                return Err(GenError::lex(
                    format!("unsupported directive '{}'", other),
                    SourceLocation::at(directive.pos),
                ));
            }
        }
        Ok(None)
    }

    /// Captures the actual arguments for a macro invocation and returns the
    /// body with formals substituted. Each argument is a raw token span
    /// delimited by balanced parens/brackets and top-level commas; a
    /// trailing variadic formal absorbs the remainder.
    fn apply_macro(&mut self, mac: &Macro, pos: usize) -> Result<Vec<Token>> {
        let mut bound: HashMap<&str, Vec<Token>> = HashMap::new();
        let mut var_args: Vec<Token> = Vec::new();

        if !mac.params.is_empty() {
            let open = self.expect_raw(pos, mac)?;
            if open.kind != TokenKind::LeftPar {
                return Err(GenError::lex(
                    format!("expected '(' after macro '{}'", mac.name),
                    SourceLocation::at(pos),
                ));
            }
            let mut next = Token::new(TokenKind::Comma, pos, ",");
            for param in &mac.params {
                if next.kind != TokenKind::Comma {
                    return Err(GenError::lex(
                        format!("too few arguments for macro '{}'", mac.name),
                        SourceLocation::at(pos),
                    ));
                }
                let (arg, terminator) = self.read_macro_arg(pos, mac)?;
                bound.insert(param.as_str(), arg);
                next = terminator;
            }
            if mac.variadic && next.kind == TokenKind::Comma {
                let mut level: i32 = 0;
                while level >= 0 {
                    let token = self.expect_raw(pos, mac)?;
                    match token.kind {
                        TokenKind::LeftPar | TokenKind::LeftBracket => level += 1,
                        TokenKind::RightPar | TokenKind::RightBracket => level -= 1,
                        _ => {}
                    }
                    var_args.push(token);
                }
                next = var_args.pop().expect("closing paren just pushed");
            }
            if next.kind != TokenKind::RightPar {
                return Err(GenError::lex(
                    format!("expected ')' closing macro '{}'", mac.name),
                    SourceLocation::at(pos),
                ));
            }
        }

        let mut result = Vec::new();
        for token in &mac.body {
            if token.kind == TokenKind::Identifier {
                if let Some(arg) = bound.get(token.text.as_str()) {
                    result.extend(arg.iter().cloned());
                    continue;
                }
            }
            if token.kind == TokenKind::VarArgs {
                result.extend(var_args.iter().cloned());
                continue;
            }
            result.push(token.clone());
        }
        Ok(result)
    }

    /// Reads tokens for one macro argument up to a top-level comma or the
    /// closing paren; returns the argument and the terminating token.
    fn read_macro_arg(&mut self, pos: usize, mac: &Macro) -> Result<(Vec<Token>, Token)> {
        let mut result = Vec::new();
        let mut level: i32 = 0;
        loop {
            let token = self.expect_raw(pos, mac)?;
            if level == 0
                && (token.kind == TokenKind::Comma || token.kind == TokenKind::RightPar)
            {
                return Ok((result, token));
            }
            match token.kind {
                TokenKind::LeftPar | TokenKind::LeftBracket => level += 1,
                TokenKind::RightPar | TokenKind::RightBracket => level -= 1,
                _ => {}
            }
            result.push(token);
        }
    }

    /// Pulls the next token for macro argument capture, preferring pending
    /// cached tokens (nested expansions) over the raw stream.
    fn expect_raw(&mut self, pos: usize, mac: &Macro) -> Result<Token> {
        if let Some(t) = self.cache.pop_front() {
            return Ok(t);
        }
        self.raw.next_token().ok_or_else(|| {
            GenError::lex(
                format!("unexpected end of input in arguments of macro '{}'", mac.name),
                SourceLocation::at(pos),
            )
        })
    }

    /// Collects every remaining token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Drains the stream for side effects only (macro registration).
    pub fn read_all(&mut self) -> Result<()> {
        while self.next_token()?.is_some() {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<Token> {
        let mut macros = MacroTable::new();
        Tokenizer::new(source, &mut macros)
            .tokenize()
            .expect("tokenize failed")
    }

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.text.clone()).collect()
    }

    fn kinds_and_texts(tokens: &[Token]) -> Vec<(TokenKind, String)> {
        tokens.iter().map(|t| (t.kind, t.text.clone())).collect()
    }

    #[test]
    fn raw_tokens_and_kinds() {
        let tokens = tokenize("x += a->b[3] ... 0x1F 12.5 \"a\\\"b\" 'c'");
        assert_eq!(
            kinds_and_texts(&tokens),
            vec![
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::AugAssign, "+=".to_string()),
                (TokenKind::Identifier, "a".to_string()),
                (TokenKind::Arrow, "->".to_string()),
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::LeftBracket, "[".to_string()),
                (TokenKind::Number, "3".to_string()),
                (TokenKind::RightBracket, "]".to_string()),
                (TokenKind::Ellipsis, "...".to_string()),
                (TokenKind::Number, "0x1F".to_string()),
                (TokenKind::Number, "12.5".to_string()),
                (TokenKind::StringLit, "\"a\\\"b\"".to_string()),
                (TokenKind::StringLit, "'c'".to_string()),
            ]
        );
    }

    #[test]
    fn comments_and_continuations_are_skipped() {
        let tokens = tokenize("a // comment\n b /* block\n comment */ c \\\n d");
        assert_eq!(texts(&tokens), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn keywords_and_null_get_their_own_kinds() {
        let tokens = tokenize("if (NULL) return;");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].kind, TokenKind::Null);
        assert_eq!(tokens[4].kind, TokenKind::Keyword);
    }

    #[test]
    fn function_macro_expands_like_inline_text() {
        let expanded = tokenize("#define ADD(a,b) a+b\nADD(x,y)");
        let direct = tokenize("x+y");
        // The #define passthrough token comes first.
        assert_eq!(expanded[0].kind, TokenKind::Define);
        assert_eq!(
            texts(&expanded[1..]),
            texts(&direct),
            "macro application must equal direct tokenization"
        );
    }

    #[test]
    fn macro_argument_repeats_preserve_order() {
        let expanded = tokenize("#define CHECK(p,r) ((r) ? (r) : NULL)\nCHECK(p, make(1,2))");
        let direct = tokenize("((make(1,2)) ? (make(1,2)) : NULL)");
        assert_eq!(texts(&expanded[1..]), texts(&direct));
    }

    #[test]
    fn object_macro_and_nested_expansion() {
        let source = "#define TWO 2\n#define DOUBLE(x) (x*TWO)\nDOUBLE(n)";
        let tokens = tokenize(source);
        let code: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Define)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(code, vec!["(", "n", "*", "2", ")"]);
    }

    #[test]
    fn variadic_macro_splices_remainder() {
        let source = "#define CALL(f, ...) f(##__VA_ARGS__)\nCALL(g, 1, 2)";
        let tokens = tokenize(source);
        let code: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Define)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(code, vec!["g", "(", "1", ",", "2", ")"]);
    }

    #[test]
    fn if_zero_hides_tokens_and_else_inverts() {
        let source = "a\n#if 0\nhidden\n#else\nshown\n#endif\nb";
        let tokens = tokenize(source);
        assert_eq!(texts(&tokens), vec!["a", "shown", "b"]);
    }

    #[test]
    fn nested_conditionals_balance() {
        let source = "#if 1\nx\n#if 0\ny\n#if 1\nz\n#endif\n#endif\nw\n#endif";
        let tokens = tokenize(source);
        assert_eq!(texts(&tokens), vec!["x", "w"]);
    }

    #[test]
    fn inner_if_cannot_reopen_hidden_region() {
        let source = "#if 0\na\n#if 1\nz\n#endif\nb\n#endif\nc";
        let tokens = tokenize(source);
        assert_eq!(texts(&tokens), vec!["c"]);
    }

    #[test]
    fn ifdef_sees_macros_defined_in_hidden_regions() {
        // Macro registration is independent of visibility.
        let source = "#if 0\n#define HIDDEN\n#endif\n#ifdef HIDDEN\nyes\n#endif";
        let tokens = tokenize(source);
        assert_eq!(texts(&tokens), vec!["yes"]);
    }

    #[test]
    fn defined_form_in_if() {
        let source = "#define FLAG\n#if defined(FLAG)\na\n#endif\n#if defined(OTHER)\nb\n#endif";
        let tokens = tokenize(source);
        let code: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Define)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(code, vec!["a"]);
    }

    #[test]
    fn include_is_a_passthrough_token() {
        let tokens = tokenize("#include \"pegen.h\"\nx");
        assert_eq!(tokens[0].kind, TokenKind::Include);
        assert_eq!(tokens[1].text, "x");
    }

    #[test]
    fn unknown_character_becomes_symbol() {
        let tokens = tokenize("a @ b");
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].text, "@");
    }

    #[test]
    fn malformed_if_is_fatal() {
        let mut macros = MacroTable::new();
        let result = Tokenizer::new("#if a + b\n", &mut macros).tokenize();
        assert!(result.is_err());
    }

    #[test]
    fn macros_carry_across_tokenizers() {
        let mut macros = MacroTable::new();
        define_macro(&mut macros, "N", "42").expect("define failed");
        let tokens = Tokenizer::new("N", &mut macros).tokenize().unwrap();
        assert_eq!(texts(&tokens), vec!["42"]);
    }
}
