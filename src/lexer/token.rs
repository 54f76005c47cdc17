//! Токены BSL.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Виды токенов BSL.
///
/// Идентификаторы представлены тремя видами: обычный `Identifier` внутри
/// выражений и два контекстных вида в начале оператора — `LValueIdent`
/// (дальше по оператору есть `=` верхнего уровня) и `CallIdent` (его нет).
/// Разделение выполняет лексер ограниченным просмотром вперёд, грамматике
/// остаётся один токен предпросмотра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Объявления
    Procedure,
    EndProcedure,
    Function,
    EndFunction,
    Var,
    VarBody,
    ValueParam,
    Export,
    Async,

    // Управление потоком
    If,
    Then,
    ElseIf,
    Else,
    EndIf,
    For,
    Each,
    In,
    To,
    Loop,
    EndLoop,
    While,
    Break,
    Continue,
    Try,
    Catch,
    EndTry,
    Throw,
    Return,
    Goto,
    GotoLabel,
    Execute,
    Await,

    // Значения
    True,
    False,
    Undefined,
    Null,

    // Операторы-слова
    And,
    Or,
    Not,
    New,

    // Арифметика и сравнение
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,

    // Пунктуация
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    Comma,
    Semicolon,
    Colon,
    Question,

    // Литералы
    Number,
    String,
    Date,

    // Идентификаторы
    Identifier,
    LValueIdent,
    CallIdent,

    // Аннотации
    Directive,
    ExtDirective,

    // Препроцессор (уровень модуля)
    PreprocIf,
    PreprocElseIf,
    PreprocElse,
    PreprocEndIf,
    PreprocRegion,
    PreprocEndRegion,
    PreprocUse,

    // Препроцессор (внутри тела процедуры/функции)
    PreprocIfBody,
    PreprocElseIfBody,
    PreprocElseBody,
    PreprocEndIfBody,
    PreprocRegionBody,
    PreprocEndRegionBody,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Значение токена-литерала, декодированное лексером.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenValue {
    None,
    Number(f64),
    String(String),
    /// None — пустая дата (все нули в литерале).
    Date(Option<NaiveDateTime>),
    Bool(bool),
    Undefined,
    Null,
}

/// Токен: вид, литерал как в исходнике, декодированное значение и байтовое
/// смещение начала. Позиция вычисляется буфером исходника по смещению.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub value: TokenValue,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            value: TokenValue::None,
            offset,
        }
    }

    pub fn eof(offset: usize) -> Self {
        Self::new(TokenKind::Eof, "", offset)
    }

    /// Токен, с которого может начинаться выражение.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Date
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Undefined
                | TokenKind::Null
                | TokenKind::Identifier
                | TokenKind::LValueIdent
                | TokenKind::CallIdent
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not
                | TokenKind::New
                | TokenKind::Await
                | TokenKind::Question
                | TokenKind::LeftParen
        )
    }
}
