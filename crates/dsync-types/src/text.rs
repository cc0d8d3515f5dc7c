//! Normalization of raw content bytes to UTF-8 text.
//!
//! Stored datastream bytes carry no reliable encoding label. Content is
//! accepted as UTF-8 (with or without a byte order mark) or as UTF-16 when a
//! byte order mark announces it. Anything else is rejected with the offset of
//! the first undecodable byte; nothing is replaced or dropped.

use std::borrow::Cow;

use crate::error::TypeError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode content bytes into UTF-8 text.
pub fn normalize_text(bytes: &[u8]) -> Result<Cow<'_, str>, TypeError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_utf8(rest, UTF8_BOM.len()).map(Cow::Borrowed);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes).map(Cow::Owned);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes).map(Cow::Owned);
    }
    decode_utf8(bytes, 0).map(Cow::Borrowed)
}

fn decode_utf8(bytes: &[u8], base: usize) -> Result<&str, TypeError> {
    std::str::from_utf8(bytes).map_err(|e| {
        let detail = match e.error_len() {
            Some(len) => format!("invalid {len}-byte sequence"),
            None => "truncated multi-byte sequence".to_string(),
        };
        TypeError::Encoding {
            offset: base + e.valid_up_to(),
            detail,
        }
    })
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, TypeError> {
    if bytes.len() % 2 != 0 {
        return Err(TypeError::Encoding {
            offset: bytes.len() + 1,
            detail: "odd number of bytes in utf-16 content".into(),
        });
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    let mut out = String::with_capacity(units.len());
    for (index, decoded) in char::decode_utf16(units.iter().copied()).enumerate() {
        match decoded {
            Ok(c) => out.push(c),
            Err(e) => {
                return Err(TypeError::Encoding {
                    offset: 2 + index * 2,
                    detail: format!("unpaired surrogate {:#06x}", e.unpaired_surrogate()),
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8_is_borrowed() {
        let text = normalize_text("caf\u{e9}".as_bytes()).unwrap();
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn raw_multibyte_sequence_decodes() {
        let bytes = b"\"\\n\xE2\x80\x99 \"";
        assert_eq!(normalize_text(bytes).unwrap(), "\"\\n\u{2019} \"");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let text = normalize_text(b"\xEF\xBB\xBF<xml/>").unwrap();
        assert_eq!(text, "<xml/>");
    }

    #[test]
    fn utf16_le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<a>\u{2019}</a>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(normalize_text(&bytes).unwrap(), "<a>\u{2019}</a>");
    }

    #[test]
    fn utf16_be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "ok".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(normalize_text(&bytes).unwrap(), "ok");
    }

    #[test]
    fn split_multibyte_sequence_reports_offset() {
        // First two bytes of U+2019 followed by ASCII.
        let err = normalize_text(b"abc\xE2\x80 d").unwrap_err();
        assert!(matches!(err, TypeError::Encoding { offset: 3, .. }));
    }

    #[test]
    fn truncated_sequence_at_end() {
        let err = normalize_text(b"abc\xE2\x80").unwrap_err();
        match err {
            TypeError::Encoding { offset, detail } => {
                assert_eq!(offset, 3);
                assert!(detail.contains("truncated"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn latin1_byte_is_rejected() {
        assert!(matches!(
            normalize_text(b"caf\xE9"),
            Err(TypeError::Encoding { offset: 3, .. })
        ));
    }

    #[test]
    fn odd_length_utf16_is_rejected() {
        assert!(normalize_text(&[0xFF, 0xFE, 0x41]).is_err());
    }
}
