use crate::language::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i128),
    Float(f64),
    Imag(f64),
    Rune(char),
    Str(String),

    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    TypeKw,
    Var,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AmpCaretEq,

    AmpAmp,
    PipePipe,
    Arrow, // <-
    PlusPlus,
    MinusMinus,

    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    Bang,
    ColonEq,
    Ellipsis,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,

    Eof,
}

impl TokenKind {
    /// Whether a newline after this token triggers automatic semicolon
    /// insertion, following the source language's rule.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imag(_)
                | TokenKind::Rune(_)
                | TokenKind::Str(_)
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Int(v) => v.to_string(),
            TokenKind::Float(v) => v.to_string(),
            TokenKind::Imag(v) => format!("{v}i"),
            TokenKind::Rune(c) => format!("'{c}'"),
            TokenKind::Str(s) => format!("{s:?}"),
            TokenKind::Break => "break".into(),
            TokenKind::Case => "case".into(),
            TokenKind::Chan => "chan".into(),
            TokenKind::Const => "const".into(),
            TokenKind::Continue => "continue".into(),
            TokenKind::Default => "default".into(),
            TokenKind::Defer => "defer".into(),
            TokenKind::Else => "else".into(),
            TokenKind::Fallthrough => "fallthrough".into(),
            TokenKind::For => "for".into(),
            TokenKind::Func => "func".into(),
            TokenKind::Go => "go".into(),
            TokenKind::Goto => "goto".into(),
            TokenKind::If => "if".into(),
            TokenKind::Import => "import".into(),
            TokenKind::Interface => "interface".into(),
            TokenKind::Map => "map".into(),
            TokenKind::Package => "package".into(),
            TokenKind::Range => "range".into(),
            TokenKind::Return => "return".into(),
            TokenKind::Select => "select".into(),
            TokenKind::Struct => "struct".into(),
            TokenKind::Switch => "switch".into(),
            TokenKind::TypeKw => "type".into(),
            TokenKind::Var => "var".into(),
            TokenKind::Plus => "+".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Star => "*".into(),
            TokenKind::Slash => "/".into(),
            TokenKind::Percent => "%".into(),
            TokenKind::Amp => "&".into(),
            TokenKind::Pipe => "|".into(),
            TokenKind::Caret => "^".into(),
            TokenKind::Shl => "<<".into(),
            TokenKind::Shr => ">>".into(),
            TokenKind::AmpCaret => "&^".into(),
            TokenKind::PlusEq => "+=".into(),
            TokenKind::MinusEq => "-=".into(),
            TokenKind::StarEq => "*=".into(),
            TokenKind::SlashEq => "/=".into(),
            TokenKind::PercentEq => "%=".into(),
            TokenKind::AmpEq => "&=".into(),
            TokenKind::PipeEq => "|=".into(),
            TokenKind::CaretEq => "^=".into(),
            TokenKind::ShlEq => "<<=".into(),
            TokenKind::ShrEq => ">>=".into(),
            TokenKind::AmpCaretEq => "&^=".into(),
            TokenKind::AmpAmp => "&&".into(),
            TokenKind::PipePipe => "||".into(),
            TokenKind::Arrow => "<-".into(),
            TokenKind::PlusPlus => "++".into(),
            TokenKind::MinusMinus => "--".into(),
            TokenKind::EqEq => "==".into(),
            TokenKind::BangEq => "!=".into(),
            TokenKind::Lt => "<".into(),
            TokenKind::LtEq => "<=".into(),
            TokenKind::Gt => ">".into(),
            TokenKind::GtEq => ">=".into(),
            TokenKind::Eq => "=".into(),
            TokenKind::Bang => "!".into(),
            TokenKind::ColonEq => ":=".into(),
            TokenKind::Ellipsis => "...".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::LBracket => "[".into(),
            TokenKind::RBracket => "]".into(),
            TokenKind::LBrace => "{".into(),
            TokenKind::RBrace => "}".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::Dot => ".".into(),
            TokenKind::Semi => ";".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}
