//! Чтение файлов BSL с определением кодировки.
//!
//! Ядро парсера принимает готовую UTF-8 строку; этот модуль нужен
//! пакетным инструментам. Файлы 1С встречаются в UTF-8 (часто с BOM),
//! UTF-16 и Windows-1251.

use std::path::Path;

/// Читает файл BSL и возвращает текст в UTF-8 без BOM.
pub fn read_bsl_file<P: AsRef<Path>>(path: P) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;

    let content = if bytes.len() >= 2 {
        match (bytes[0], bytes[1]) {
            // UTF-16LE BOM: FF FE
            (0xFF, 0xFE) => {
                let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(&bytes);
                if had_errors {
                    tracing::warn!("errors detected while decoding UTF-16LE file");
                }
                decoded.into_owned()
            }
            // UTF-16BE BOM: FE FF
            (0xFE, 0xFF) => {
                let (decoded, _, had_errors) = encoding_rs::UTF_16BE.decode(&bytes);
                if had_errors {
                    tracing::warn!("errors detected while decoding UTF-16BE file");
                }
                decoded.into_owned()
            }
            _ => match String::from_utf8(bytes.clone()) {
                Ok(s) => s,
                Err(_) => {
                    // Windows-1251 типична для старых русских установок 1С
                    tracing::debug!("UTF-8 decoding failed, trying Windows-1251");
                    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1251.decode(&bytes);
                    if had_errors {
                        tracing::warn!("errors detected while decoding Windows-1251 file");
                    }
                    decoded.into_owned()
                }
            },
        }
    } else {
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
    };

    Ok(strip_bom(&content).to_string())
}

/// Отрезает UTF-8 BOM в начале текста.
pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}Процедура Тест()"), "Процедура Тест()");
        assert_eq!(strip_bom("Процедура Тест()"), "Процедура Тест()");
        assert_eq!(strip_bom(""), "");
    }
}
