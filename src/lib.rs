/*!
# BSL Parser

Парсер и принтер встроенного языка 1С:Предприятие (BSL).

Лексер и парсер работают в один проход: парсер тянет токены по одному,
лексер решает контекстные задачи языка — ключевые слова после точки,
различение присваивания и вызова просмотром вперёд, body-варианты токенов
препроцессора. Результат — типизированное дерево, которое можно обойти,
сериализовать в JSON и напечатать обратно в исходный текст.

## Использование

```rust,ignore
use bsl_parser::{parse_module, PrintConf};

let module = parse_module("Процедура Тест() Сообщить(\"Привет\"); КонецПроцедуры")?;
let json = module.to_json()?;
let text = module.print(PrintConf { one_line: true, margin: 0 });
```

Разбор останавливается на первой ошибке; текст ошибки стабилен:
`syntax error. line: L, column: C (unexpected literal: "X")`.
*/

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod reader;
pub mod source;

pub use ast::walk::Visitor;
pub use ast::{Expression, FunctionOrProcedure, Literal, Module, RoutineKind, Statement};
pub use error::ParseError;
pub use lexer::token::{Token, TokenKind, TokenValue};
pub use lexer::Lexer;
pub use parser::{parse_module, Parser};
pub use printer::PrintConf;
pub use reader::read_bsl_file;
pub use source::Position;

/// Расширения файлов с кодом BSL.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bsl", "os"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_print() {
        let module =
            parse_module("Процедура Тест() Сообщить(\"Привет\"); КонецПроцедуры").unwrap();
        let printed = module.print(PrintConf {
            one_line: true,
            margin: 0,
        });
        assert!(printed.contains("Процедура Тест()"));
        assert!(printed.contains("Сообщить(\"Привет\")"));
    }

    #[test]
    fn test_error_is_returned() {
        let err = parse_module("Процедура п()\nКонецФункции").unwrap_err();
        assert!(err.to_string().starts_with("syntax error."));
    }
}
