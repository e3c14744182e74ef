use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};

#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

pub fn lex(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    let lexer = Lexer::new(source);
    lexer.run()
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    current: Option<char>,
    offset: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            chars,
            current,
            offset: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Vec<LexError>> {
        while let Some(ch) = self.current {
            match ch {
                '\n' => {
                    self.maybe_insert_semi();
                    self.bump();
                }
                '/' if self.peek() == Some('/') => self.eat_line_comment(),
                '/' if self.peek() == Some('*') => self.eat_block_comment(),
                ch if ch.is_whitespace() => {
                    self.bump();
                }
                ch if ch.is_alphabetic() || ch == '_' => self.lex_identifier(),
                ch if ch.is_ascii_digit() => self.lex_number(),
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                '"' => self.lex_string(),
                '`' => self.lex_raw_string(),
                '\'' => self.lex_rune(),
                _ => self.lex_symbol(),
            }
        }
        self.maybe_insert_semi();
        self.push_token(TokenKind::Eof, self.offset, self.offset);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // The source language terminates a statement at a newline when the
    // preceding token could end one.
    fn maybe_insert_semi(&mut self) {
        if let Some(last) = self.tokens.last() {
            if last.kind.ends_statement() {
                self.push_token(TokenKind::Semi, self.offset, self.offset);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
        }
        self.current = self.chars.next();
        self.current
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        self.errors.push(LexError {
            message: message.into(),
            span: Span::new(start, end),
        });
    }

    fn eat_line_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn eat_block_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(ch) = self.current {
            if ch == '*' && self.peek() == Some('/') {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
        self.error(self.offset, self.offset, "Unterminated block comment");
    }

    fn lex_identifier(&mut self) {
        let start = self.offset;
        while let Some(ch) = self.current {
            if ch.is_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }

        let end = self.offset;
        let slice = &self.src[start..end];
        let kind = match slice {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::TypeKw,
            "var" => TokenKind::Var,
            _ => TokenKind::Identifier(slice.to_string()),
        };
        self.push_token(kind, start, end);
    }

    fn eat_digits(&mut self, radix: u32) {
        while let Some(ch) = self.current {
            if ch.is_digit(radix) || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_number(&mut self) {
        let start = self.offset;

        if self.current == Some('0') {
            match self.peek() {
                Some('x') | Some('X') => {
                    self.bump();
                    self.bump();
                    self.eat_digits(16);
                    return self.finish_int(start, 16, 2);
                }
                Some('o') | Some('O') => {
                    self.bump();
                    self.bump();
                    self.eat_digits(8);
                    return self.finish_int(start, 8, 2);
                }
                Some('b') | Some('B') => {
                    self.bump();
                    self.bump();
                    self.eat_digits(2);
                    return self.finish_int(start, 2, 2);
                }
                _ => {}
            }
        }

        let mut is_float = self.current == Some('.');
        self.eat_digits(10);

        if self.current == Some('.') && self.peek() != Some('.') {
            is_float = true;
            self.bump();
            self.eat_digits(10);
        }

        if matches!(self.current, Some('e') | Some('E')) {
            is_float = true;
            self.bump();
            if matches!(self.current, Some('+') | Some('-')) {
                self.bump();
            }
            self.eat_digits(10);
        }

        if self.current == Some('i') {
            self.bump();
            let end = self.offset;
            let text: String = self.src[start..end - 1]
                .chars()
                .filter(|c| *c != '_')
                .collect();
            match text.parse::<f64>() {
                Ok(value) => self.push_token(TokenKind::Imag(value), start, end),
                Err(_) => self.error(start, end, "Invalid imaginary literal"),
            }
            return;
        }

        let end = self.offset;
        let text: String = self.src[start..end].chars().filter(|c| *c != '_').collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.push_token(TokenKind::Float(value), start, end),
                Err(_) => self.error(start, end, "Invalid float literal"),
            }
        } else {
            // A bare leading zero makes the literal octal.
            let (digits, radix) = if text.len() > 1 && text.starts_with('0') {
                (&text[1..], 8)
            } else {
                (text.as_str(), 10)
            };
            match i128::from_str_radix(digits, radix) {
                Ok(value) => self.push_token(TokenKind::Int(value), start, end),
                Err(_) => self.error(start, end, "Invalid integer literal"),
            }
        }
    }

    fn finish_int(&mut self, start: usize, radix: u32, prefix_len: usize) {
        let end = self.offset;
        let text: String = self.src[start + prefix_len..end]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if self.current == Some('i') {
            self.bump();
        }
        match i128::from_str_radix(&text, radix) {
            Ok(value) => self.push_token(TokenKind::Int(value), start, end),
            Err(_) => self.error(start, end, "Invalid integer literal"),
        }
    }

    fn lex_escape(&mut self, quote: char) -> Option<char> {
        // Caller consumed the backslash.
        let esc = self.current?;
        self.bump();
        Some(match esc {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '0'..='7' => {
                let mut v = esc.to_digit(8).unwrap();
                for _ in 0..2 {
                    match self.current.and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            v = v * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                char::from_u32(v)?
            }
            'x' | 'u' | 'U' => {
                let width = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut v: u32 = 0;
                for _ in 0..width {
                    let d = self.current.and_then(|c| c.to_digit(16))?;
                    v = v.checked_mul(16)?.checked_add(d)?;
                    self.bump();
                }
                char::from_u32(v)?
            }
            c if c == quote => c,
            other => other,
        })
    }

    fn lex_string(&mut self) {
        let start = self.offset;
        self.bump();
        let mut value = String::new();
        while let Some(ch) = self.current {
            match ch {
                '"' => {
                    self.bump();
                    let end = self.offset;
                    self.push_token(TokenKind::Str(value), start, end);
                    return;
                }
                '\n' => break,
                '\\' => {
                    self.bump();
                    match self.lex_escape('"') {
                        Some(decoded) => value.push(decoded),
                        None => {
                            self.error(start, self.offset, "Invalid escape in string literal");
                            return;
                        }
                    }
                }
                _ => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        self.error(start, self.offset, "Unterminated string literal");
    }

    fn lex_raw_string(&mut self) {
        let start = self.offset;
        self.bump();
        let mut value = String::new();
        while let Some(ch) = self.current {
            if ch == '`' {
                self.bump();
                let end = self.offset;
                self.push_token(TokenKind::Str(value), start, end);
                return;
            }
            // Carriage returns are discarded inside raw literals.
            if ch != '\r' {
                value.push(ch);
            }
            self.bump();
        }
        self.error(self.offset, self.offset, "Unterminated raw string literal");
    }

    fn lex_rune(&mut self) {
        let start = self.offset;
        self.bump();
        let Some(ch) = self.current else {
            self.error(start, self.offset, "Unterminated rune literal");
            return;
        };
        let value = if ch == '\\' {
            self.bump();
            match self.lex_escape('\'') {
                Some(decoded) => decoded,
                None => {
                    self.error(start, self.offset, "Invalid escape in rune literal");
                    return;
                }
            }
        } else {
            self.bump();
            ch
        };
        if self.current != Some('\'') {
            self.error(start, self.offset, "Unterminated rune literal");
            return;
        }
        self.bump();
        let end = self.offset;
        self.push_token(TokenKind::Rune(value), start, end);
    }

    fn lex_symbol(&mut self) {
        let start = self.offset;
        match self.current {
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some('{') => self.single(TokenKind::LBrace),
            Some('}') => self.single(TokenKind::RBrace),
            Some(',') => self.single(TokenKind::Comma),
            Some(';') => self.single(TokenKind::Semi),
            Some('.') => {
                self.bump();
                if self.current == Some('.') && self.peek() == Some('.') {
                    self.bump();
                    self.bump();
                    self.push_token(TokenKind::Ellipsis, start, self.offset);
                } else {
                    self.push_token(TokenKind::Dot, start, self.offset);
                }
            }
            Some(':') => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    self.push_token(TokenKind::ColonEq, start, self.offset);
                } else {
                    self.push_token(TokenKind::Colon, start, self.offset);
                }
            }
            Some('+') => {
                self.bump();
                match self.current {
                    Some('+') => self.extend(TokenKind::PlusPlus, start),
                    Some('=') => self.extend(TokenKind::PlusEq, start),
                    _ => self.push_token(TokenKind::Plus, start, self.offset),
                }
            }
            Some('-') => {
                self.bump();
                match self.current {
                    Some('-') => self.extend(TokenKind::MinusMinus, start),
                    Some('=') => self.extend(TokenKind::MinusEq, start),
                    _ => self.push_token(TokenKind::Minus, start, self.offset),
                }
            }
            Some('*') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::StarEq, start),
                    _ => self.push_token(TokenKind::Star, start, self.offset),
                }
            }
            Some('/') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::SlashEq, start),
                    _ => self.push_token(TokenKind::Slash, start, self.offset),
                }
            }
            Some('%') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::PercentEq, start),
                    _ => self.push_token(TokenKind::Percent, start, self.offset),
                }
            }
            Some('^') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::CaretEq, start),
                    _ => self.push_token(TokenKind::Caret, start, self.offset),
                }
            }
            Some('&') => {
                self.bump();
                match self.current {
                    Some('&') => self.extend(TokenKind::AmpAmp, start),
                    Some('=') => self.extend(TokenKind::AmpEq, start),
                    Some('^') => {
                        self.bump();
                        if self.current == Some('=') {
                            self.extend(TokenKind::AmpCaretEq, start);
                        } else {
                            self.push_token(TokenKind::AmpCaret, start, self.offset);
                        }
                    }
                    _ => self.push_token(TokenKind::Amp, start, self.offset),
                }
            }
            Some('|') => {
                self.bump();
                match self.current {
                    Some('|') => self.extend(TokenKind::PipePipe, start),
                    Some('=') => self.extend(TokenKind::PipeEq, start),
                    _ => self.push_token(TokenKind::Pipe, start, self.offset),
                }
            }
            Some('=') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::EqEq, start),
                    _ => self.push_token(TokenKind::Eq, start, self.offset),
                }
            }
            Some('!') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::BangEq, start),
                    _ => self.push_token(TokenKind::Bang, start, self.offset),
                }
            }
            Some('<') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::LtEq, start),
                    Some('-') => self.extend(TokenKind::Arrow, start),
                    Some('<') => {
                        self.bump();
                        if self.current == Some('=') {
                            self.extend(TokenKind::ShlEq, start);
                        } else {
                            self.push_token(TokenKind::Shl, start, self.offset);
                        }
                    }
                    _ => self.push_token(TokenKind::Lt, start, self.offset),
                }
            }
            Some('>') => {
                self.bump();
                match self.current {
                    Some('=') => self.extend(TokenKind::GtEq, start),
                    Some('>') => {
                        self.bump();
                        if self.current == Some('=') {
                            self.extend(TokenKind::ShrEq, start);
                        } else {
                            self.push_token(TokenKind::Shr, start, self.offset);
                        }
                    }
                    _ => self.push_token(TokenKind::Gt, start, self.offset),
                }
            }
            Some(ch) => {
                self.bump();
                self.error(start, self.offset, format!("Unexpected character '{}'", ch));
            }
            None => {}
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.offset;
        self.bump();
        self.push_token(kind, start, self.offset);
    }

    fn extend(&mut self, kind: TokenKind, start: usize) {
        self.bump();
        self.push_token(kind, start, self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src)
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("42 0x2a 0o52 0b101010 052 1_000"),
            vec![
                TokenKind::Int(42),
                TokenKind::Int(42),
                TokenKind::Int(42),
                TokenKind::Int(42),
                TokenKind::Int(42),
                TokenKind::Int(1000),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("3.14 3e20 .5 2."),
            vec![
                TokenKind::Float(3.14),
                TokenKind::Float(3e20),
                TokenKind::Float(0.5),
                TokenKind::Float(2.0),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("1.5i"),
            vec![TokenKind::Imag(1.5), TokenKind::Semi, TokenKind::Eof]
        );
    }

    #[test]
    fn inserts_semicolons_at_newlines() {
        assert_eq!(
            kinds("x := 1\ny := 2"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::ColonEq,
                TokenKind::Int(1),
                TokenKind::Semi,
                TokenKind::Identifier("y".into()),
                TokenKind::ColonEq,
                TokenKind::Int(2),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
        // No insertion after an operator.
        assert_eq!(
            kinds("1 +\n2"),
            vec![
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_strings_and_runes() {
        assert_eq!(
            kinds(r#""a\tb" `raw\n` '\n' '界'"#),
            vec![
                TokenKind::Str("a\tb".into()),
                TokenKind::Str("raw\\n".into()),
                TokenKind::Rune('\n'),
                TokenKind::Rune('界'),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_compound_operators() {
        assert_eq!(
            kinds("a &^= b <<= c <- d"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::AmpCaretEq,
                TokenKind::Identifier("b".into()),
                TokenKind::ShlEq,
                TokenKind::Identifier("c".into()),
                TokenKind::Arrow,
                TokenKind::Identifier("d".into()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(lex("\"abc\nx := 1").is_err());
    }
}
