//! ToUnicode CMap parsing
//!
//! Reads the `codespacerange`, `bfchar` and `bfrange` sections of a
//! ToUnicode stream. The rest of the CMap program is skipped.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CodespaceRange {
    len: usize,
    low: u32,
    high: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RangeTarget {
    /// Destination of the first code; later codes increment its last unit
    Offset(Vec<u16>),
    /// One destination per code
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BfRange {
    low: u32,
    high: u32,
    target: RangeTarget,
}

/// Character code to Unicode map of one font
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToUnicodeMap {
    codespace: Vec<CodespaceRange>,
    chars: HashMap<u32, String>,
    ranges: Vec<BfRange>,
}

impl ToUnicodeMap {
    /// Parse a decompressed ToUnicode stream
    ///
    /// Malformed entries are skipped, so the result may be empty.
    pub fn parse(data: &[u8]) -> Self {
        let mut map = Self::default();
        let mut tokens = tokenize(data).into_iter();

        while let Some(token) = tokens.next() {
            let Token::Word(word) = token else {
                continue;
            };
            match word.as_str() {
                "begincodespacerange" => {
                    let section = section(&mut tokens, "endcodespacerange");
                    map.read_codespace(section);
                }
                "beginbfchar" => {
                    let section = section(&mut tokens, "endbfchar");
                    map.read_bfchar(section);
                }
                "beginbfrange" => {
                    let section = section(&mut tokens, "endbfrange");
                    map.read_bfrange(section);
                }
                _ => {}
            }
        }

        map
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.ranges.is_empty()
    }

    /// Unicode text for one character code
    pub fn lookup(&self, code: u32) -> Option<String> {
        if let Some(text) = self.chars.get(&code) {
            return Some(text.clone());
        }

        let range = self
            .ranges
            .iter()
            .find(|r| r.low <= code && code <= r.high)?;
        let offset = code - range.low;

        match &range.target {
            RangeTarget::Offset(start) => {
                let mut units = start.clone();
                let last = units.last_mut()?;
                *last = last.checked_add(u16::try_from(offset).ok()?)?;
                Some(String::from_utf16_lossy(&units))
            }
            RangeTarget::List(values) => values.get(offset as usize).cloned(),
        }
    }

    /// Byte length of the code at the start of `bytes`
    ///
    /// Uses the codespace ranges when the CMap declares them, otherwise
    /// `default_len`. Always at least one byte and never past the end.
    pub fn code_len(&self, bytes: &[u8], default_len: usize) -> usize {
        let matched = self.codespace.iter().find(|range| {
            range.len <= bytes.len() && {
                let code = code_value(&bytes[..range.len]);
                range.low <= code && code <= range.high
            }
        });

        let len = match matched {
            Some(range) => range.len,
            None => self
                .codespace
                .iter()
                .map(|range| range.len)
                .min()
                .unwrap_or(default_len),
        };
        len.clamp(1, bytes.len().max(1))
    }

    fn read_codespace(&mut self, section: Vec<Token>) {
        let bounds: Vec<Vec<u8>> = hex_values(section).collect();
        for pair in bounds.chunks_exact(2) {
            self.codespace.push(CodespaceRange {
                len: pair[0].len(),
                low: code_value(&pair[0]),
                high: code_value(&pair[1]),
            });
        }
    }

    fn read_bfchar(&mut self, section: Vec<Token>) {
        let values: Vec<Vec<u8>> = hex_values(section).collect();
        for pair in values.chunks_exact(2) {
            self.chars
                .insert(code_value(&pair[0]), utf16_text(&pair[1]));
        }
    }

    fn read_bfrange(&mut self, section: Vec<Token>) {
        let mut tokens = section.into_iter();
        while let (Some(Token::Hex(low)), Some(Token::Hex(high))) = (tokens.next(), tokens.next()) {
            let target = match tokens.next() {
                Some(Token::Hex(start)) => RangeTarget::Offset(utf16_units(&start)),
                Some(Token::ArrayStart) => RangeTarget::List(
                    tokens
                        .by_ref()
                        .take_while(|t| *t != Token::ArrayEnd)
                        .filter_map(|t| match t {
                            Token::Hex(bytes) => Some(utf16_text(&bytes)),
                            _ => None,
                        })
                        .collect(),
                ),
                _ => break,
            };

            self.ranges.push(BfRange {
                low: code_value(&low),
                high: code_value(&high),
                target,
            });
        }
    }
}

/// Big-endian value of a character code of up to four bytes
pub fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn section(tokens: &mut impl Iterator<Item = Token>, end: &str) -> Vec<Token> {
    tokens
        .take_while(|t| !matches!(t, Token::Word(w) if w == end))
        .collect()
}

fn hex_values(section: Vec<Token>) -> impl Iterator<Item = Vec<u8>> {
    section.into_iter().filter_map(|t| match t {
        Token::Hex(bytes) => Some(bytes),
        _ => None,
    })
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    let mut padded = Vec::with_capacity(bytes.len() + 1);
    if bytes.len() % 2 == 1 {
        padded.push(0);
    }
    padded.extend_from_slice(bytes);
    padded
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn is_regular(b: u8) -> bool {
    !b.is_ascii_whitespace() && b != 0 && !b"()<>[]{}/%".contains(&b)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let end = data[i..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map_or(data.len(), |p| i + p);
                tokens.push(Token::Hex(decode_hex(&data[i + 1..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => i = skip_literal(data, i),
            b'/' => {
                // Names carry nothing the map needs
                i += 1;
                while i < data.len() && is_regular(data[i]) {
                    i += 1;
                }
            }
            b if !is_regular(b) => i += 1,
            _ => {
                let start = i;
                while i < data.len() && is_regular(data[i]) {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&c| (c as char).to_digit(16).map(|d| d as u8))
        .collect();

    // A trailing odd digit is followed by an implied zero
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn skip_literal(data: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    data.len()
}
