//! Font-aware decoding of text string operands
//!
//! A string shown with `Tj`/`TJ` holds character codes of the current font,
//! not text. Codes go through the font's ToUnicode map when it has one.
//! Otherwise simple fonts fall back to their base encoding and composite
//! fonts to a UCS-2 CMap. Composite fonts with glyph-id encodings
//! (`Identity-H`) and no ToUnicode map cannot be decoded.

use lopdf::{Dictionary, Document, Object};

use crate::cmap::{code_value, ToUnicodeMap};

/// Base encodings lopdf can decode
const NAMED_ENCODINGS: [&str; 4] = [
    "StandardEncoding",
    "WinAnsiEncoding",
    "MacRomanEncoding",
    "MacExpertEncoding",
];

/// How codes without a ToUnicode entry are read
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fallback {
    /// Single-byte codes in a named base encoding
    Named(String),
    /// Single-byte codes with no declared encoding
    Raw,
    /// Two-byte codes that are UTF-16BE units
    Ucs2,
    /// Glyph ids; the value names the encoding for error messages
    Opaque(String),
}

/// Decoder for the strings of one font resource
#[derive(Debug, Clone)]
pub struct FontDecoder {
    to_unicode: Option<ToUnicodeMap>,
    code_len: usize,
    fallback: Fallback,
}

impl FontDecoder {
    /// Build a decoder from a font dictionary of the page resources
    pub fn from_font(doc: &Document, font: &Dictionary) -> Self {
        let composite = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|subtype| subtype == b"Type0")
            .unwrap_or(false);

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| stream_bytes(doc, obj))
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|map| !map.is_empty());

        let encoding = font
            .get(b"Encoding")
            .ok()
            .and_then(|obj| doc.dereference(obj).ok())
            .map(|(_, obj)| obj);

        let (code_len, fallback) = if composite {
            (2, composite_fallback(encoding))
        } else {
            (1, simple_fallback(encoding))
        };

        Self {
            to_unicode,
            code_len,
            fallback,
        }
    }

    /// Decode one string operand
    ///
    /// Fails when the font's codes have no route to Unicode.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        if bytes.is_empty() {
            return Ok(String::new());
        }

        match (&self.to_unicode, &self.fallback) {
            (Some(map), _) => Ok(self.decode_mapped(map, bytes)),
            (None, Fallback::Opaque(encoding)) => Err(format!(
                "{} font codes cannot be mapped to text without a ToUnicode map",
                encoding
            )),
            (None, _) => Ok(self.decode_unmapped(bytes)),
        }
    }

    fn decode_mapped(&self, map: &ToUnicodeMap, bytes: &[u8]) -> String {
        let mut text = String::new();
        let mut rest = bytes;

        while !rest.is_empty() {
            let (code, tail) = rest.split_at(map.code_len(rest, self.code_len));
            match map.lookup(code_value(code)) {
                Some(mapped) => text.push_str(&mapped),
                None => text.push_str(&self.decode_unmapped(code)),
            }
            rest = tail;
        }

        text
    }

    fn decode_unmapped(&self, bytes: &[u8]) -> String {
        match &self.fallback {
            Fallback::Named(encoding) => Document::decode_text(Some(encoding.as_str()), bytes),
            Fallback::Raw => decode_raw(bytes),
            Fallback::Ucs2 => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Fallback::Opaque(_) => String::new(),
        }
    }
}

fn composite_fallback(encoding: Option<&Object>) -> Fallback {
    match encoding.and_then(|obj| obj.as_name_str().ok()) {
        Some(name) if name.starts_with("Uni") && (name.contains("UCS2") || name.contains("UTF16")) => {
            Fallback::Ucs2
        }
        Some(name) => Fallback::Opaque(name.to_string()),
        None => Fallback::Opaque("Embedded CMap".to_string()),
    }
}

fn simple_fallback(encoding: Option<&Object>) -> Fallback {
    let name = match encoding {
        Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        // Differences are not applied, only the base encoding
        Some(Object::Dictionary(dict)) => dict
            .get(b"BaseEncoding")
            .and_then(Object::as_name_str)
            .ok()
            .map(str::to_string),
        _ => None,
    };

    match name {
        Some(name) if NAMED_ENCODINGS.contains(&name.as_str()) => Fallback::Named(name),
        _ => Fallback::Raw,
    }
}

fn stream_bytes(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    let (_, obj) = doc.dereference(obj).ok()?;
    let stream = obj.as_stream().ok()?;
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}

/// Decode bytes shown without font information
///
/// UTF-16BE when they carry a byte order mark, otherwise UTF-8 with a
/// Latin-1 fallback.
pub fn decode_raw(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decoder(font: Dictionary) -> FontDecoder {
        FontDecoder::from_font(&Document::with_version("1.7"), &font)
    }

    fn font(entries: Vec<(&str, Object)>) -> Dictionary {
        Dictionary::from_iter(entries)
    }

    #[test]
    fn test_utf16_with_bom() {
        assert_eq!(decode_raw(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_raw(&[0x41, 0xE9]), "Aé");
    }

    #[test]
    fn test_simple_font_without_encoding_is_raw() {
        let font = decoder(font(vec![("Subtype", Object::Name(b"Type1".to_vec()))]));
        assert_eq!(font.decode(b"Payer").unwrap(), "Payer");
    }

    #[test]
    fn test_win_ansi_encoding() {
        let font = decoder(font(vec![
            ("Subtype", Object::Name(b"TrueType".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        assert_eq!(font.decode(b"O\x92NEIL").unwrap(), "O\u{2019}NEIL");
    }

    #[test]
    fn test_differences_use_base_encoding() {
        let encoding = Dictionary::from_iter(vec![
            ("BaseEncoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ("Differences", Object::Array(vec![])),
        ]);
        let font = decoder(font(vec![
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("Encoding", Object::Dictionary(encoding)),
        ]));
        assert_eq!(font.decode(b"\x93ok\x94").unwrap(), "\u{201C}ok\u{201D}");
    }

    #[test]
    fn test_identity_h_without_to_unicode_fails() {
        let font = decoder(font(vec![
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
        ]));
        let err = font.decode(&[0x00, 0x01]).unwrap_err();
        assert!(err.contains("Identity-H"));
        assert_eq!(font.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_ucs2_cmap_without_to_unicode() {
        let font = decoder(font(vec![
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("Encoding", Object::Name(b"UniGB-UCS2-H".to_vec())),
        ]));
        assert_eq!(font.decode(&[0x00, 0x41, 0x4E, 0x2D]).unwrap(), "A中");
    }
}
