//! Лексический анализатор BSL.
//!
//! Однопроходный сканер, который парсер тянет по одному токену. Помимо
//! обычного разбиения на токены выполняет три контекстные обязанности:
//!
//! 1. после точки зарезервированные слова понижаются до идентификаторов
//!    (`стр.Иначе`, `Параметры.КонецЦикла` — допустимые имена свойств);
//! 2. в начале оператора ограниченный просмотр вперёд различает
//!    `LValueIdent` (присваивание) и `CallIdent` (вызов) — фиксированного
//!    предпросмотра для этого не существует;
//! 3. внутри тела процедуры/функции токены препроцессора и `Перем`
//!    выдаются под body-вариантами, что разводит правила уровня модуля и
//!    уровня тела без конфликтов.

pub mod keywords;
pub mod token;

use crate::error::ParseError;
use crate::source::{Position, SourceBuffer};
use chrono::{NaiveDate, NaiveDateTime};
use keywords::{
    case_fold, is_identifier_part, is_identifier_start, is_space, BLOCK_TERMINATORS, DIRECTIVES,
    EXT_DIRECTIVES, KEYWORDS,
};
use token::{Token, TokenKind, TokenValue};

pub struct Lexer<'src> {
    source: SourceBuffer<'src>,
    /// Вид предыдущего токена — для определения начала оператора.
    prev_kind: Option<TokenKind>,
    /// Предыдущим токеном была точка: следующее слово — имя свойства.
    prev_dot: bool,
    /// true между Процедура/Функция и КонецПроцедуры/КонецФункции.
    in_procedure: bool,
    /// Глубина вложенности #Область: одинокий #КонецОбласти молча
    /// пропускается.
    region_depth: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            source: SourceBuffer::new(text),
            prev_kind: None,
            prev_dot: false,
            in_procedure: false,
            region_depth: 0,
        }
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.source.position_at(offset)
    }

    /// Возвращает следующий токен. Конец текста — токен `Eof`.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let mut tok = self.scan_token()?;

        match tok.kind {
            TokenKind::Procedure | TokenKind::Function => self.in_procedure = true,
            TokenKind::EndProcedure | TokenKind::EndFunction => self.in_procedure = false,
            _ => {}
        }

        if self.in_procedure {
            tok.kind = match tok.kind {
                TokenKind::PreprocIf => TokenKind::PreprocIfBody,
                TokenKind::PreprocElseIf => TokenKind::PreprocElseIfBody,
                TokenKind::PreprocElse => TokenKind::PreprocElseBody,
                TokenKind::PreprocEndIf => TokenKind::PreprocEndIfBody,
                TokenKind::PreprocRegion => TokenKind::PreprocRegionBody,
                TokenKind::PreprocEndRegion => TokenKind::PreprocEndRegionBody,
                TokenKind::Var => TokenKind::VarBody,
                kind => kind,
            };
        }

        tok.value = self.decode_value(&tok)?;
        self.prev_kind = Some(tok.kind);

        tracing::trace!(
            kind = %tok.kind,
            literal = %tok.literal,
            offset = tok.offset,
            in_procedure = self.in_procedure,
            "token"
        );

        Ok(tok)
    }

    fn decode_value(&self, tok: &Token) -> Result<TokenValue, ParseError> {
        Ok(match tok.kind {
            TokenKind::Number => {
                let n = tok.literal.parse::<f64>().map_err(|_| {
                    ParseError::syntax(self.position_at(tok.offset), tok.literal.clone())
                })?;
                TokenValue::Number(n)
            }
            TokenKind::String => TokenValue::String(tok.literal.clone()),
            TokenKind::Date => TokenValue::Date(self.decode_date(tok)?),
            TokenKind::True => TokenValue::Bool(true),
            TokenKind::False => TokenValue::Bool(false),
            TokenKind::Undefined => TokenValue::Undefined,
            TokenKind::Null => TokenValue::Null,
            _ => TokenValue::None,
        })
    }

    /// Литерал даты — строка из 8, 12 или 14 цифр. Строка из одних нулей
    /// равносильна пустой дате.
    fn decode_date(&self, tok: &Token) -> Result<Option<NaiveDateTime>, ParseError> {
        let digits = &tok.literal;
        if digits.chars().all(|c| c == '0') {
            return Ok(None);
        }

        let parsed = match digits.len() {
            8 => NaiveDate::parse_from_str(digits, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            12 => NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M").ok(),
            14 => NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok(),
            _ => None,
        };

        match parsed {
            Some(dt) => Ok(Some(dt)),
            None => Err(ParseError::IncorrectDate {
                position: self.position_at(tok.offset),
                literal: digits.clone(),
            }),
        }
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        self.skip_space();
        self.skip_comment();

        if self.source.current() == Some('#') {
            return self.handle_preprocessor();
        }

        let prev_dot = std::mem::take(&mut self.prev_dot);
        let start = self.source.offset();

        let ch = match self.source.current() {
            Some(ch) => ch,
            None => return Ok(Token::eof(start)),
        };

        match ch {
            c if is_identifier_start(c) => {
                let literal = self.scan_identifier();
                let folded = case_fold(&literal);

                if let Some(&kind) = KEYWORDS.get(folded.as_str()) {
                    if !prev_dot {
                        return Ok(Token::new(kind, literal, start));
                    }
                }

                // Идентификатор в начале оператора: просмотр вперёд
                // различает присваивание и вызов.
                if !prev_dot && self.at_statement_start() {
                    let kind = if self.has_top_level_assign() {
                        TokenKind::LValueIdent
                    } else {
                        TokenKind::CallIdent
                    };
                    return Ok(Token::new(kind, literal, start));
                }

                Ok(Token::new(TokenKind::Identifier, literal, start))
            }
            '.' => {
                // то, что идёт за точкой, читается обычным идентификатором,
                // а не зарезервированным словом
                self.prev_dot = true;
                self.source.advance();
                Ok(Token::new(TokenKind::Dot, ".", start))
            }
            c if c.is_ascii_digit() => {
                let literal = self.scan_number()?;
                Ok(Token::new(TokenKind::Number, literal, start))
            }
            '\'' => {
                let raw = self.scan_string('\'')?;
                let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    return Err(ParseError::IncorrectDate {
                        position: self.position_at(start),
                        literal: raw,
                    });
                }
                Ok(Token::new(TokenKind::Date, digits, start))
            }
            '"' => {
                let literal = self.scan_string('"')?;
                Ok(Token::new(TokenKind::String, literal, start))
            }
            '=' => {
                self.source.advance();
                Ok(Token::new(TokenKind::Equal, "=", start))
            }
            '<' => {
                self.source.advance();
                match self.source.current() {
                    Some('>') => {
                        self.source.advance();
                        Ok(Token::new(TokenKind::NotEqual, "<>", start))
                    }
                    Some('=') => {
                        self.source.advance();
                        Ok(Token::new(TokenKind::LessEq, "<=", start))
                    }
                    _ => Ok(Token::new(TokenKind::Less, "<", start)),
                }
            }
            '>' => {
                self.source.advance();
                if self.source.current() == Some('=') {
                    self.source.advance();
                    Ok(Token::new(TokenKind::GreaterEq, ">=", start))
                } else {
                    Ok(Token::new(TokenKind::Greater, ">", start))
                }
            }
            '&' => {
                self.source.advance();
                let word = self.scan_identifier();
                let folded = case_fold(&format!("&{word}"));

                if DIRECTIVES.contains(folded.as_str()) {
                    Ok(Token::new(TokenKind::Directive, format!("&{word}"), start))
                } else if EXT_DIRECTIVES.contains(folded.as_str()) {
                    Ok(Token::new(TokenKind::ExtDirective, format!("&{word}"), start))
                } else {
                    Err(ParseError::syntax(self.position_at(start), word))
                }
            }
            '~' => {
                self.source.advance();
                let name = self.scan_identifier();
                Ok(Token::new(TokenKind::GotoLabel, name, start))
            }
            _ => {
                let kind = match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Multiply,
                    '/' => TokenKind::Divide,
                    '%' => TokenKind::Modulo,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    ':' => TokenKind::Colon,
                    '?' => TokenKind::Question,
                    _ => {
                        self.source.advance();
                        return Err(ParseError::syntax(
                            self.position_at(start),
                            ch.to_string(),
                        ));
                    }
                };
                self.source.advance();
                Ok(Token::new(kind, ch.to_string(), start))
            }
        }
    }

    fn scan_identifier(&mut self) -> String {
        let mut out = String::new();
        while let Some(ch) = self.source.current() {
            if !is_identifier_part(ch) {
                break;
            }
            out.push(ch);
            self.source.advance();
        }
        out
    }

    /// Последовательность цифр с не более чем одной внутренней точкой.
    /// Буква вплотную за числом — лексическая ошибка.
    fn scan_number(&mut self) -> Result<String, ParseError> {
        let start = self.source.offset();
        let mut out = String::new();
        while let Some(ch) = self.source.current() {
            if !ch.is_ascii_digit() && ch != '.' {
                break;
            }
            out.push(ch);
            self.source.advance();
        }

        if let Some(ch) = self.source.current() {
            if is_identifier_start(ch) {
                return Err(ParseError::NumberMalformed {
                    position: self.position_at(start),
                    literal: out,
                });
            }
        }

        Ok(out)
    }

    /// Сканирует строковый (или датовый) литерал от открывающей кавычки.
    ///
    /// Перевод строки внутри строки допустим, только если следующая
    /// значимая позиция начинается с `|`; комментарии между ними
    /// пропускаются (встречаются в текстах запросов). `""` — экранированная
    /// кавычка. Закрытая строка, за которой после пробелов идёт `"`,
    /// продолжается тем же токеном — соседние литералы склеиваются.
    fn scan_string(&mut self, end: char) -> Result<String, ParseError> {
        let mut out = String::new();

        loop {
            self.source.advance();

            match self.source.current() {
                None => {
                    return Err(ParseError::syntax(
                        self.position_at(self.source.offset()),
                        "EOF",
                    ));
                }
                Some('\n') => {
                    self.source.advance();
                    self.skip_space();
                    self.skip_comment();
                    match self.source.current() {
                        Some('|') => {
                            out.push('\n');
                            out.push('|');
                        }
                        _ => {
                            return Err(ParseError::syntax(
                                self.position_at(self.source.offset()),
                                "unexpected EOL",
                            ));
                        }
                    }
                }
                Some(c) if c == end => {
                    if end == '"' && self.source.peek_next() == Some('"') {
                        self.source.advance();
                        out.push('"');
                        out.push('"');
                        continue;
                    }
                    self.source.advance();
                    self.skip_space();
                    if end == '"' && self.source.current() == Some('"') {
                        continue;
                    }
                    break;
                }
                Some(c) => out.push(c),
            }
        }

        Ok(out)
    }

    fn skip_space(&mut self) {
        while let Some(ch) = self.source.current() {
            if !is_space(ch) {
                break;
            }
            self.source.advance();
        }
    }

    fn skip_comment(&mut self) {
        if self.source.current() == Some('/') && self.source.peek_next() == Some('/') {
            while let Some(ch) = self.source.current() {
                if ch == '\n' {
                    break;
                }
                self.source.advance();
            }
            self.skip_space();
        } else {
            return;
        }

        // подряд идущие строки комментариев схлопываются;
        // #-директивы здесь не пропускаются — ими занимается препроцессор
        if self.source.current() == Some('/') {
            self.skip_comment();
        }
    }

    fn handle_preprocessor(&mut self) -> Result<Token, ParseError> {
        let start = self.source.offset();
        self.source.advance(); // '#'
        let word = self.scan_identifier();

        match case_fold(&word).as_str() {
            "если" | "if" => {
                let condition = self.scan_until_then();
                Ok(Token::new(TokenKind::PreprocIf, condition, start))
            }
            "иначеесли" | "elseif" => {
                let condition = self.scan_until_then();
                Ok(Token::new(TokenKind::PreprocElseIf, condition, start))
            }
            "иначе" | "else" => Ok(Token::new(TokenKind::PreprocElse, "", start)),
            "конецесли" | "endif" => Ok(Token::new(TokenKind::PreprocEndIf, "", start)),
            "область" | "region" => {
                self.region_depth += 1;
                self.skip_space_only();
                let name = self.scan_identifier();
                Ok(Token::new(TokenKind::PreprocRegion, name, start))
            }
            "конецобласти" | "endregion" => {
                if self.region_depth > 0 {
                    self.region_depth -= 1;
                    Ok(Token::new(TokenKind::PreprocEndRegion, "", start))
                } else {
                    // одинокий #КонецОбласти — молча пропускаем,
                    // как это делает платформа
                    self.scan_token()
                }
            }
            "использовать" | "use" => {
                self.skip_space_only();
                let path = if self.source.current() == Some('"') {
                    self.scan_string('"')?
                } else {
                    self.scan_identifier_path()
                };
                Ok(Token::new(TokenKind::PreprocUse, path, start))
            }
            _ => {
                // неизвестная директива: строка отбрасывается
                self.skip_to_eol();
                self.scan_token()
            }
        }
    }

    /// Условие препроцессора — текст до `Тогда`/`Then`, слова через один
    /// пробел, скобки сохраняются.
    fn scan_until_then(&mut self) -> String {
        let mut out = String::new();
        loop {
            self.skip_space_only();
            let ch = match self.source.current() {
                Some('\n') | None => break,
                Some(ch) => ch,
            };

            let word = self.scan_identifier();
            if word.is_empty() {
                if ch == '(' || ch == ')' {
                    out.push(ch);
                    self.source.advance();
                    continue;
                }
                break;
            }

            let folded = case_fold(&word);
            if folded == "тогда" || folded == "then" {
                break;
            }

            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&word);
        }
        out
    }

    /// Путь в #Использовать без кавычек: идентификатор с `.`, `/`, `\`.
    fn scan_identifier_path(&mut self) -> String {
        let mut out = String::new();
        while let Some(ch) = self.source.current() {
            if is_identifier_part(ch) || matches!(ch, '.' | '/' | '\\' | '-') {
                out.push(ch);
                self.source.advance();
            } else {
                break;
            }
        }
        out
    }

    fn skip_to_eol(&mut self) {
        while let Some(ch) = self.source.current() {
            if ch == '\n' {
                break;
            }
            self.source.advance();
        }
    }

    /// Пробелы и табы без переводов строк.
    fn skip_space_only(&mut self) {
        while let Some(ch) = self.source.current() {
            if ch == ' ' || ch == '\t' || ch == '\u{00A0}' {
                self.source.advance();
            } else {
                break;
            }
        }
    }

    /// Начало оператора: предыдущий токен не продолжает выражение и не
    /// является конструкцией, после которой идёт имя/выражение.
    fn at_statement_start(&self) -> bool {
        use TokenKind::*;
        let prev = match self.prev_kind {
            None => return true,
            Some(kind) => kind,
        };

        !matches!(
            prev,
            Dot | LeftParen
                | LeftBracket
                | Comma
                | Plus
                | Minus
                | Multiply
                | Divide
                | Modulo
                | Less
                | Greater
                | Equal
                | NotEqual
                | LessEq
                | GreaterEq
                | And
                | Or
                | Not
                | Await
                | ValueParam
                | Procedure
                | Function
                | Async
                | Var
                | VarBody
                | For
                | Each
                | In
                | To
                | New
                | Goto
                | Return
                | Throw
                | Execute
                | If
                | ElseIf
                | While
        )
    }

    /// Просмотр вперёд: есть ли `=` верхнего уровня до ближайшего `;`
    /// верхнего уровня или слова-терминатора блока. Строковые и датовые
    /// литералы пропускаются, вложенность `()`/`[]` учитывается, слово
    /// после точки терминатором не считается.
    fn has_top_level_assign(&self) -> bool {
        let text = self.source.text();
        let mut pos = self.source.offset();
        let mut depth: i32 = 0;
        let mut prev_was_dot = false;

        while pos < text.len() {
            let ch = match text[pos..].chars().next() {
                Some(ch) => ch,
                None => break,
            };
            let size = ch.len_utf8();

            match ch {
                '"' => {
                    pos += size;
                    while pos < text.len() {
                        let sch = text[pos..].chars().next().unwrap_or('"');
                        pos += sch.len_utf8();
                        if sch == '"' {
                            if text[pos..].starts_with('"') {
                                pos += 1;
                                continue;
                            }
                            break;
                        }
                    }
                    prev_was_dot = false;
                    continue;
                }
                '\'' => {
                    pos += size;
                    while pos < text.len() {
                        let sch = text[pos..].chars().next().unwrap_or('\'');
                        pos += sch.len_utf8();
                        if sch == '\'' {
                            break;
                        }
                    }
                    prev_was_dot = false;
                    continue;
                }
                '.' => prev_was_dot = true,
                '(' | '[' => {
                    depth += 1;
                    prev_was_dot = false;
                }
                ')' | ']' => {
                    depth -= 1;
                    prev_was_dot = false;
                }
                '=' => {
                    // "==" в языке нет: любой "=" вне скобок — присваивание
                    if depth == 0 {
                        return true;
                    }
                    prev_was_dot = false;
                }
                ';' => {
                    if depth == 0 {
                        return false;
                    }
                    prev_was_dot = false;
                }
                c if is_identifier_start(c) => {
                    let mut word_end = pos;
                    while word_end < text.len() {
                        let wch = match text[word_end..].chars().next() {
                            Some(wch) => wch,
                            None => break,
                        };
                        if !is_identifier_part(wch) {
                            break;
                        }
                        word_end += wch.len_utf8();
                    }
                    if depth == 0 && !prev_was_dot {
                        let folded = case_fold(&text[pos..word_end]);
                        if BLOCK_TERMINATORS.contains(folded.as_str()) {
                            return false;
                        }
                    }
                    pos = word_end;
                    prev_was_dot = false;
                    continue;
                }
                _ => prev_was_dot = false,
            }
            pos += size;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        Ok(out)
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let toks = tokenize("Процедура Тест() КонецПроцедуры").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Procedure);
        assert_eq!(toks[1].kind, TokenKind::Identifier);
        assert_eq!(toks[1].literal, "Тест");
        assert_eq!(toks[2].kind, TokenKind::LeftParen);
        assert_eq!(toks[3].kind, TokenKind::RightParen);
        assert_eq!(toks[4].kind, TokenKind::EndProcedure);
        assert_eq!(toks[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(kinds("конецпроцедуры")[0], TokenKind::EndProcedure);
        assert_eq!(kinds("КОНЕЦПРОЦЕДУРЫ")[0], TokenKind::EndProcedure);
        assert_eq!(kinds("ЕСЛИ")[0], TokenKind::If);
        assert_eq!(kinds("enddo")[0], TokenKind::EndLoop);
        assert_eq!(kinds("While")[0], TokenKind::While);
    }

    #[test]
    fn test_keyword_after_dot_demoted() {
        // стр.Иначе и стр.КонецЦикла — обычные свойства
        let toks = tokenize("а = стр.Иначе").unwrap();
        let dot = toks.iter().position(|t| t.kind == TokenKind::Dot).unwrap();
        assert_eq!(toks[dot + 1].kind, TokenKind::Identifier);
        assert_eq!(toks[dot + 1].literal, "Иначе");
    }

    #[test]
    fn test_statement_start_classification() {
        // присваивание: есть "=" верхнего уровня
        assert_eq!(kinds("а = 1;")[0], TokenKind::LValueIdent);
        assert_eq!(kinds("тест[333] = 1;")[0], TokenKind::LValueIdent);
        assert_eq!(kinds("Объект.Свойство = 1;")[0], TokenKind::LValueIdent);
        // вызов: "=" нет
        assert_eq!(kinds("Сообщить(а);")[0], TokenKind::CallIdent);
        assert_eq!(kinds("Объект.Метод(1, 2);")[0], TokenKind::CallIdent);
        // "=" внутри скобок не считается
        assert_eq!(kinds("Сообщить(а = 1);")[0], TokenKind::CallIdent);
        // "=" внутри строкового аргумента не считается
        assert_eq!(kinds("Формат(Гр, \"ЧЦ=2\");")[0], TokenKind::CallIdent);
    }

    #[test]
    fn test_classification_stops_at_block_terminator() {
        // вызов без ";" перед КонецЕсли
        let toks = tokenize("Если а Тогда\n ПриСоздании(Данные)\nКонецЕсли").unwrap();
        let call = toks
            .iter()
            .find(|t| t.literal == "ПриСоздании")
            .unwrap();
        assert_eq!(call.kind, TokenKind::CallIdent);
    }

    #[test]
    fn test_terminator_after_dot_is_property() {
        // Выбор.Иначе = Значение — слово за точкой не терминатор
        assert_eq!(kinds("Выбор.Иначе = Значение;")[0], TokenKind::LValueIdent);
    }

    #[test]
    fn test_string_with_comment_marker_inside() {
        let toks = tokenize("а = \"rererer // rererer\"").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.literal, "rererer // rererer");
    }

    #[test]
    fn test_multiline_string_continuation() {
        let toks = tokenize("а = \"один\n| два\n// комментарий\n| три\"").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.literal, "один\n| два\n| три");
    }

    #[test]
    fn test_adjacent_string_literals_concatenate() {
        let toks = tokenize("а = \"123_\"\n \"123_\" \n\"123\";").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.literal, "123_123_123");
    }

    #[test]
    fn test_string_escaped_quotes() {
        let toks = tokenize("а = \"ру = ''прибор''; знак \"\"х\"\"\";").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.literal, "ру = ''прибор''; знак \"\"х\"\"");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("а = \"нет конца").is_err());
    }

    #[test]
    fn test_string_eol_without_continuation() {
        assert!(tokenize("а = \"строка\nб = 1;").is_err());
    }

    #[test]
    fn test_date_literals() {
        let toks = tokenize("а = '20131231235959';").unwrap();
        let d = toks.iter().find(|t| t.kind == TokenKind::Date).unwrap();
        match &d.value {
            TokenValue::Date(Some(dt)) => {
                assert_eq!(dt.format("%Y%m%d%H%M%S").to_string(), "20131231235959")
            }
            other => panic!("unexpected value {other:?}"),
        }

        // все нули — пустая дата
        let toks = tokenize("а = '00000000';").unwrap();
        let d = toks.iter().find(|t| t.kind == TokenKind::Date).unwrap();
        assert_eq!(d.value, TokenValue::Date(None));

        // нецифровые символы игнорируются
        let toks = tokenize("а = '2024-01-15';").unwrap();
        let d = toks.iter().find(|t| t.kind == TokenKind::Date).unwrap();
        assert_eq!(d.literal, "20240115");
    }

    #[test]
    fn test_date_errors() {
        assert!(tokenize("а = '20240101").is_err());
        assert!(tokenize("а = 'абв';").is_err());
        assert!(tokenize("а = '123';").is_err());
    }

    #[test]
    fn test_number_value() {
        let toks = tokenize("а = 7.2;").unwrap();
        let n = toks.iter().find(|t| t.kind == TokenKind::Number).unwrap();
        assert_eq!(n.value, TokenValue::Number(7.2));
    }

    #[test]
    fn test_letter_glued_to_number() {
        let err = tokenize("а = 123абв;").unwrap_err();
        assert!(err
            .to_string()
            .contains("identifier immediately follow the number"));
    }

    #[test]
    fn test_directives() {
        let toks = tokenize("&НаСервере\nПроцедура п() КонецПроцедуры").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Directive);
        assert_eq!(toks[0].literal, "&НаСервере");

        let toks = tokenize("&Вместо\nПроцедура п() КонецПроцедуры").unwrap();
        assert_eq!(toks[0].kind, TokenKind::ExtDirective);
    }

    #[test]
    fn test_unknown_directive() {
        let err = tokenize("&НасервереБез\nПроцедура п() КонецПроцедуры").unwrap_err();
        assert_eq!(
            err.to_string(),
            "syntax error. line: 1, column: 1 (unexpected literal: \"НасервереБез\")"
        );
    }

    #[test]
    fn test_preprocessor_condition() {
        let toks = tokenize("#Если Сервер Или ВнешнееСоединение Тогда\n#КонецЕсли\n").unwrap();
        assert_eq!(toks[0].kind, TokenKind::PreprocIf);
        assert_eq!(toks[0].literal, "Сервер Или ВнешнееСоединение");
        assert_eq!(toks[1].kind, TokenKind::PreprocEndIf);
    }

    #[test]
    fn test_preprocessor_region() {
        let toks = tokenize("#Область ПрограммныйИнтерфейс\n#КонецОбласти\n").unwrap();
        assert_eq!(toks[0].kind, TokenKind::PreprocRegion);
        assert_eq!(toks[0].literal, "ПрограммныйИнтерфейс");
        assert_eq!(toks[1].kind, TokenKind::PreprocEndRegion);
    }

    #[test]
    fn test_orphan_end_region_skipped() {
        let toks = tokenize("#КонецОбласти\nПерем а;").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Var);
    }

    #[test]
    fn test_unknown_preprocessor_line_discarded() {
        let toks = tokenize("#НеизвестнаяДиректива\nПерем а;").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Var);
    }

    #[test]
    fn test_use_paths() {
        let toks = tokenize("#Использовать lib\n").unwrap();
        assert_eq!(toks[0].kind, TokenKind::PreprocUse);
        assert_eq!(toks[0].literal, "lib");

        let toks = tokenize("#Использовать \"./path/to/module\"\n").unwrap();
        assert_eq!(toks[0].literal, "./path/to/module");
    }

    #[test]
    fn test_body_token_aliases() {
        let toks = tokenize("Процедура п()\n#Если Клиент Тогда\nПерем а;\n#КонецЕсли\nКонецПроцедуры").unwrap();
        assert!(toks.iter().any(|t| t.kind == TokenKind::PreprocIfBody));
        assert!(toks.iter().any(|t| t.kind == TokenKind::PreprocEndIfBody));
        assert!(toks.iter().any(|t| t.kind == TokenKind::VarBody));
        // на уровне модуля — обычный Перем
        let toks = tokenize("Перем б;").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Var);
    }

    #[test]
    fn test_goto_label_token() {
        let toks = tokenize("Перейти ~метка;").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Goto);
        assert_eq!(toks[1].kind, TokenKind::GotoLabel);
        assert_eq!(toks[1].literal, "метка");
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("а = б <> в <= г >= д < е > ж;")[..],
            [
                TokenKind::LValueIdent,
                TokenKind::Equal,
                TokenKind::Identifier,
                TokenKind::NotEqual,
                TokenKind::Identifier,
                TokenKind::LessEq,
                TokenKind::Identifier,
                TokenKind::GreaterEq,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_character() {
        assert!(tokenize("а = §;").is_err());
    }

    #[test]
    fn test_bom_and_empty() {
        assert_eq!(kinds("\u{FEFF}"), [TokenKind::Eof]);
        assert_eq!(kinds(""), [TokenKind::Eof]);
        assert_eq!(kinds("  \n\t  "), [TokenKind::Eof]);
    }

    #[test]
    fn test_comments_collapsed() {
        let toks = tokenize("// один\n// два\n// три\nПерем а;").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Var);
    }
}
