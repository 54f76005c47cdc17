//! Ошибки разбора.
//!
//! Разбор останавливается на первой ошибке; каждая ошибка несёт позицию и
//! литерал, на котором она обнаружена. Текстовый формат стабилен — на него
//! завязаны внешние инструменты.

use crate::source::Position;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseError {
    /// Грамматическая или лексическая ошибка.
    #[error("syntax error. {position} (unexpected literal: {literal:?})")]
    Syntax { position: Position, literal: String },

    /// Буква вплотную за числовым литералом.
    #[error("identifier immediately follow the number. {position} (unexpected literal: {literal:?})")]
    NumberMalformed { position: Position, literal: String },

    /// Литерал даты не складывается в ГГГГММДД[ЧЧММ[СС]].
    #[error("incorrect Date type constant. {position} (unexpected literal: {literal:?})")]
    IncorrectDate { position: Position, literal: String },

    /// Прервать/Продолжить вне цикла.
    #[error("operator {operator:?} can only be used inside a loop. {position} (unexpected literal: {literal:?})")]
    OutsideLoop {
        operator: String,
        position: Position,
        literal: String,
    },

    /// ВызватьИсключение без аргументов вне блока Исключение.
    #[error("operator {operator:?} without arguments can only be used when handling an exception. {position} (unexpected literal: {literal:?})")]
    BareThrow {
        operator: String,
        position: Position,
        literal: String,
    },

    /// Возврат со значением в процедуре.
    #[error("procedure cannot return a value. {position} (unexpected literal: {literal:?})")]
    ProcedureReturnsValue { position: Position, literal: String },

    /// Повторное объявление переменной в одной области видимости.
    #[error("variable has already been defined. {position} (unexpected literal: {literal:?})")]
    VariableRedefined { position: Position, literal: String },

    /// Перем после тела модуля или после процедур.
    #[error("variable declarations must be placed at the beginning of the module. {position} (unexpected literal: {literal:?})")]
    VariableAfterBody { position: Position, literal: String },

    /// Процедура/функция после операторов тела модуля.
    #[error("procedure and function definitions should be placed before the module body statements. {position} (unexpected literal: {literal:?})")]
    RoutineAfterBody { position: Position, literal: String },

    /// Повторное объявление метки в одной процедуре.
    #[error("label has already been defined. {position} (unexpected literal: {literal:?})")]
    LabelRedefined { position: Position, literal: String },

    /// Перейти на необъявленную метку.
    #[error("undefined label. {position} (unexpected literal: {literal:?})")]
    UndefinedLabel { position: Position, literal: String },
}

impl ParseError {
    pub fn syntax(position: Position, literal: impl Into<String>) -> Self {
        ParseError::Syntax {
            position,
            literal: literal.into(),
        }
    }

    /// Позиция, в которой обнаружена ошибка.
    pub fn position(&self) -> Position {
        match self {
            ParseError::Syntax { position, .. }
            | ParseError::NumberMalformed { position, .. }
            | ParseError::IncorrectDate { position, .. }
            | ParseError::OutsideLoop { position, .. }
            | ParseError::BareThrow { position, .. }
            | ParseError::ProcedureReturnsValue { position, .. }
            | ParseError::VariableRedefined { position, .. }
            | ParseError::VariableAfterBody { position, .. }
            | ParseError::RoutineAfterBody { position, .. }
            | ParseError::LabelRedefined { position, .. }
            | ParseError::UndefinedLabel { position, .. } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_format() {
        let err = ParseError::syntax(Position::new(2, 11), "Тогда");
        assert_eq!(
            err.to_string(),
            "syntax error. line: 2, column: 11 (unexpected literal: \"Тогда\")"
        );
    }

    #[test]
    fn test_loop_error_format() {
        let err = ParseError::OutsideLoop {
            operator: "Прервать".to_string(),
            position: Position::new(4, 7),
            literal: "Прервать".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operator \"Прервать\" can only be used inside a loop. line: 4, column: 7 (unexpected literal: \"Прервать\")"
        );
    }

    #[test]
    fn test_bare_throw_format() {
        let err = ParseError::BareThrow {
            operator: "ВызватьИсключение".to_string(),
            position: Position::new(4, 24),
            literal: ";".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operator \"ВызватьИсключение\" without arguments can only be used when handling an exception. line: 4, column: 24 (unexpected literal: \";\")"
        );
    }
}
