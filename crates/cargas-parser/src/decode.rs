use std::fmt;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

use crate::errors::DecodeError;

/// Bytes that Windows-1252 leaves unassigned. Strict decoders reject them.
const CP1252_UNASSIGNED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Utf8,
    /// UTF-16 in either byte order, selected by the byte-order mark.
    Utf16,
    Windows1252,
    Latin1,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                UTF_8
                    .decode_without_bom_handling_and_without_replacement(body)
                    .map(|text| text.into_owned())
            }
            TextEncoding::Utf16 => {
                let (encoding, bom_len) = Encoding::for_bom(bytes)?;
                if encoding != UTF_16LE && encoding != UTF_16BE {
                    return None;
                }
                encoding
                    .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
                    .map(|text| text.into_owned())
            }
            TextEncoding::Windows1252 => {
                if bytes.iter().any(|b| CP1252_UNASSIGNED.contains(b)) {
                    return None;
                }
                let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
                (!had_errors).then(|| text.into_owned())
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Multi-byte encodings first; single-byte encodings accept nearly anything and only serve
/// as fallbacks.
pub const DEFAULT_ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Utf16,
    TextEncoding::Windows1252,
    TextEncoding::Latin1,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

#[derive(Debug, Clone)]
pub struct Decoder {
    candidates: Vec<TextEncoding>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_ENCODINGS.to_vec(),
        }
    }
}

impl Decoder {
    pub fn new(candidates: impl Into<Vec<TextEncoding>>) -> Self {
        Self {
            candidates: candidates.into(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedText, DecodeError> {
        for encoding in &self.candidates {
            if let Some(text) = encoding.decode(bytes) {
                return Ok(DecodedText {
                    text,
                    encoding: *encoding,
                });
            }
        }

        Err(DecodeError {
            tried: self.candidates.iter().map(TextEncoding::label).collect(),
        })
    }
}

/// Decode with the default candidate list.
pub fn decode(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    Decoder::default().decode(bytes)
}
