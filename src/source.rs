//! Буфер исходного текста модуля.
//!
//! Хранит весь текст модуля и текущую позицию сканера. Позиции (строка,
//! колонка) вычисляются по запросу подсчётом переводов строк до смещения —
//! токены несут только байтовое смещение.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Позиция в исходном коде, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line: {}, column: {}", self.line, self.column)
    }
}

/// Буфер исходного кода с текущим смещением сканера.
#[derive(Debug)]
pub struct SourceBuffer<'src> {
    text: &'src str,
    offset: usize,
}

impl<'src> SourceBuffer<'src> {
    /// Создает буфер, отрезая UTF-8 BOM если он есть.
    pub fn new(text: &'src str) -> Self {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        Self { text, offset: 0 }
    }

    pub fn text(&self) -> &'src str {
        self.text
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Текущий символ или None в конце текста.
    pub fn current(&self) -> Option<char> {
        self.text[self.offset..].chars().next()
    }

    /// Символ, следующий за текущим.
    pub fn peek_next(&self) -> Option<char> {
        let mut chars = self.text[self.offset..].chars();
        chars.next();
        chars.next()
    }

    /// Сдвигает смещение на один символ.
    pub fn advance(&mut self) {
        if let Some(ch) = self.current() {
            self.offset += ch.len_utf8();
        }
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Вычисляет (строка, колонка) для смещения.
    /// Колонка считается в символах от начала строки, обе координаты 1-based.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = self.text[line_start..offset].chars().count() + 1;
        Position::new(line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_stripped() {
        let buf = SourceBuffer::new("\u{FEFF}Перем а;");
        assert_eq!(buf.current(), Some('П'));
    }

    #[test]
    fn test_position_counting() {
        let src = "Перем а;\nПерем б;";
        let buf = SourceBuffer::new(src);
        assert_eq!(buf.position_at(0), Position::new(1, 1));
        // смещение второй строки
        let second = src.find('\n').unwrap() + 1;
        assert_eq!(buf.position_at(second), Position::new(2, 1));
        // колонка в символах, не в байтах
        let b = src.rfind('б').unwrap();
        assert_eq!(buf.position_at(b), Position::new(2, 7));
    }

    #[test]
    fn test_advance_by_chars() {
        let mut buf = SourceBuffer::new("аб");
        buf.advance();
        assert_eq!(buf.current(), Some('б'));
        buf.advance();
        assert!(buf.is_eof());
    }
}
