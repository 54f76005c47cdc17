//! Ключевые слова и директивы BSL.
//!
//! Таблицы строятся один раз и разделяются между потоками — после
//! инициализации они только читаются.

use super::token::TokenKind;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Ключевые слова: русский набор плюс английские алиасы
/// (`While`, `Do`/`EndDo`, `To`, `async`, `await`).
/// Ключи хранятся в нижнем регистре, поиск — после case_fold.
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("процедура", TokenKind::Procedure),
        ("конецпроцедуры", TokenKind::EndProcedure),
        ("функция", TokenKind::Function),
        ("конецфункции", TokenKind::EndFunction),
        ("перем", TokenKind::Var),
        ("знач", TokenKind::ValueParam),
        ("экспорт", TokenKind::Export),
        ("если", TokenKind::If),
        ("тогда", TokenKind::Then),
        ("иначеесли", TokenKind::ElseIf),
        ("иначе", TokenKind::Else),
        ("конецесли", TokenKind::EndIf),
        ("для", TokenKind::For),
        ("каждого", TokenKind::Each),
        ("из", TokenKind::In),
        ("по", TokenKind::To),
        ("цикл", TokenKind::Loop),
        ("конеццикла", TokenKind::EndLoop),
        ("пока", TokenKind::While),
        ("прервать", TokenKind::Break),
        ("продолжить", TokenKind::Continue),
        ("попытка", TokenKind::Try),
        ("исключение", TokenKind::Catch),
        ("конецпопытки", TokenKind::EndTry),
        ("вызватьисключение", TokenKind::Throw),
        ("возврат", TokenKind::Return),
        ("перейти", TokenKind::Goto),
        ("выполнить", TokenKind::Execute),
        ("новый", TokenKind::New),
        ("и", TokenKind::And),
        ("или", TokenKind::Or),
        ("не", TokenKind::Not),
        ("истина", TokenKind::True),
        ("ложь", TokenKind::False),
        ("неопределено", TokenKind::Undefined),
        ("null", TokenKind::Null),
        ("асинх", TokenKind::Async),
        ("ждать", TokenKind::Await),
        // английские алиасы
        ("while", TokenKind::While),
        ("do", TokenKind::Loop),
        ("enddo", TokenKind::EndLoop),
        ("to", TokenKind::To),
        ("async", TokenKind::Async),
        ("await", TokenKind::Await),
    ])
});

/// Директивы компиляции методов.
pub static DIRECTIVES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "&наклиенте",
        "&насервере",
        "&насерверебезконтекста",
        "&наклиентенасерверебезконтекста",
        "&наклиентенасервере",
    ])
});

/// Директивы расширений.
pub static EXT_DIRECTIVES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["&перед", "&после", "&вместо", "&изменениеиконтроль"])
});

/// Слова, завершающие оператор/блок — по ним останавливается просмотр
/// вперёд при классификации идентификатора в начале оператора.
pub static BLOCK_TERMINATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "конецесли",
        "endif",
        "конеццикла",
        "enddo",
        "конецпроцедуры",
        "endprocedure",
        "конецфункции",
        "endfunction",
        "конецпопытки",
        "endtry",
        "иначе",
        "else",
        "иначеесли",
        "elseif",
        "исключение",
        "except",
    ])
});

/// Приводит слово к нижнему регистру для поиска по таблицам.
/// Покрывает латиницу A–Z и кириллицу А–Я вместе с Ё обычным
/// посимвольным Unicode-преобразованием.
pub fn case_fold(word: &str) -> String {
    word.chars().flat_map(char::to_lowercase).collect()
}

/// Буква в смысле BSL: Unicode-буква или подчёркивание.
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Продолжение идентификатора: буква, цифра или подчёркивание.
pub fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

/// Пробельный символ, включая неразрывный пробел.
pub fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '\u{00A0}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_fold_two_alphabets() {
        assert_eq!(case_fold("ПРИВЕТ"), "привет");
        assert_eq!(case_fold("ПрИвЕт"), "привет");
        assert_eq!(case_fold("HeLLo"), "hello");
        assert_eq!(case_fold("ПриветHELLO"), "приветhello");
        assert_eq!(case_fold("ЁЛКА"), "ёлка");
        assert_eq!(case_fold("ПОДЪЁМ"), "подъём");
        assert_eq!(case_fold("РСТУФХЦЧШЩ"), "рстуфхцчшщ");
        assert_eq!(case_fold("123"), "123");
        assert_eq!(case_fold(""), "");
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(KEYWORDS.get("если"), Some(&TokenKind::If));
        assert_eq!(
            KEYWORDS.get(case_fold("КонецПроцедуры").as_str()),
            Some(&TokenKind::EndProcedure)
        );
        assert_eq!(KEYWORDS.get(case_fold("EndDo").as_str()), Some(&TokenKind::EndLoop));
        assert!(KEYWORDS.get("моялеременная").is_none());
    }

    #[test]
    fn test_directives() {
        assert!(DIRECTIVES.contains(case_fold("&НаСервере").as_str()));
        assert!(DIRECTIVES.contains(case_fold("&НасервереБезКонтекста").as_str()));
        assert!(EXT_DIRECTIVES.contains(case_fold("&Вместо").as_str()));
        assert!(!DIRECTIVES.contains("&насерверебез"));
    }

    #[test]
    fn test_identifier_chars() {
        assert!(is_identifier_start('я'));
        assert!(is_identifier_start('Ё'));
        assert!(is_identifier_start('_'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_part('1'));
        assert!(!is_identifier_part('.'));
    }
}
