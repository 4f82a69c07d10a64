use std::cmp::min;

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GB18030, ISO_8859_10, ISO_8859_13, ISO_8859_14, ISO_8859_15,
    ISO_8859_16, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7,
    ISO_8859_8, SHIFT_JIS, UTF_16BE, UTF_8, WINDOWS_1250, WINDOWS_1251, WINDOWS_1252,
    WINDOWS_1254, WINDOWS_1256, WINDOWS_874,
};

use super::Mode;
use crate::common::metadata::Version;
use crate::common::utils::{BitStream, QRError, QRResult};

const ALPHANUMERIC_CHARS: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

const GS1_SEPARATOR: char = '\u{1d}';

// Decoder for corrected data codewords
//------------------------------------------------------------------------------

/// Parses the segments of a symbol's data codewords into text. Parsing ends at a terminator or
/// when fewer than 4 bits remain.
pub fn decode(data: &[u8], ver: Version) -> QRResult<String> {
    let mut inp = BitStream::from(data);
    let mut out = TextWriter::default();

    while inp.remaining() >= 4 {
        let mode = Mode::from_bits(take(&mut inp, 4)?)?;

        match mode {
            Mode::Terminator => break,
            Mode::Numeric => write_numeric(&mut inp, ver, &mut out)?,
            Mode::Alphanumeric => write_alphanumeric(&mut inp, ver, &mut out)?,
            Mode::Byte => write_byte(&mut inp, ver, &mut out)?,
            Mode::Kanji => write_kanji(&mut inp, ver, &mut out)?,
            Mode::Eci => {
                let assignment = take_eci(&mut inp)?;
                out.set_charset(eci_charset(assignment))?;
            }
            Mode::StructuredAppend => {
                // Symbol position, total and parity
                take(&mut inp, 16)?;
            }
            Mode::Fnc1First => out.gs1 = true,
            Mode::Fnc1Second => {
                // Application indicator
                take(&mut inp, 8)?;
                out.gs1 = true;
            }
        }
    }

    out.finish()
}

fn take(inp: &mut BitStream, size: usize) -> QRResult<u32> {
    inp.take_bits(size).ok_or(QRError::CorruptDataSegment)
}

fn take_char_cnt(inp: &mut BitStream, ver: Version, mode: Mode) -> QRResult<usize> {
    Ok(take(inp, ver.char_cnt_bits(mode))? as usize)
}

fn write_numeric(inp: &mut BitStream, ver: Version, out: &mut TextWriter) -> QRResult<()> {
    let mut char_cnt = take_char_cnt(inp, ver, Mode::Numeric)?;
    let mut text = String::with_capacity(char_cnt);

    while char_cnt > 0 {
        let digits = min(3, char_cnt);
        let chunk = take(inp, digits * 3 + 1)?;
        if chunk >= 10u32.pow(digits as u32) {
            return Err(QRError::CorruptDataSegment);
        }
        text.push_str(&format!("{chunk:0digits$}"));
        char_cnt -= digits;
    }

    out.push_text(&text)
}

fn write_alphanumeric(inp: &mut BitStream, ver: Version, out: &mut TextWriter) -> QRResult<()> {
    let mut char_cnt = take_char_cnt(inp, ver, Mode::Alphanumeric)?;
    let mut text = String::with_capacity(char_cnt);

    while char_cnt > 1 {
        let chunk = take(inp, 11)? as usize;
        if chunk >= 45 * 45 {
            return Err(QRError::CorruptDataSegment);
        }
        text.push(ALPHANUMERIC_CHARS[chunk / 45] as char);
        text.push(ALPHANUMERIC_CHARS[chunk % 45] as char);
        char_cnt -= 2;
    }
    if char_cnt == 1 {
        let chunk = take(inp, 6)? as usize;
        let ch = ALPHANUMERIC_CHARS.get(chunk).ok_or(QRError::CorruptDataSegment)?;
        text.push(*ch as char);
    }

    if out.gs1 {
        text = expand_gs1_separators(&text);
    }
    out.push_text(&text)
}

// In GS1 mode "%" encodes the group separator and "%%" a literal percent sign
fn expand_gs1_separators(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '%' if chars.peek() == Some(&'%') => {
                chars.next();
                res.push('%');
            }
            '%' => res.push(GS1_SEPARATOR),
            _ => res.push(ch),
        }
    }
    res
}

fn write_byte(inp: &mut BitStream, ver: Version, out: &mut TextWriter) -> QRResult<()> {
    let char_cnt = take_char_cnt(inp, ver, Mode::Byte)?;
    let mut bytes = Vec::with_capacity(char_cnt);

    for _ in 0..char_cnt {
        bytes.push(take(inp, 8)? as u8);
    }

    out.pending.extend(bytes);
    Ok(())
}

fn write_kanji(inp: &mut BitStream, ver: Version, out: &mut TextWriter) -> QRResult<()> {
    let char_cnt = take_char_cnt(inp, ver, Mode::Kanji)?;
    let mut bytes = Vec::with_capacity(char_cnt * 2);

    for _ in 0..char_cnt {
        let chunk = take(inp, 13)?;
        let packed = ((chunk / 0xc0) << 8) | (chunk % 0xc0);
        let sjis = if packed < 0x1f00 { packed + 0x8140 } else { packed + 0xc140 };
        bytes.push((sjis >> 8) as u8);
        bytes.push(sjis as u8);
    }

    let (text, _, has_err) = SHIFT_JIS.decode(&bytes);
    if has_err {
        return Err(QRError::CorruptDataSegment);
    }
    out.push_text(&text)
}

fn take_eci(inp: &mut BitStream) -> QRResult<u32> {
    let first = take(inp, 8)?;

    if first & 0x80 == 0 {
        Ok(first)
    } else if first & 0xc0 == 0x80 {
        Ok(((first & 0x3f) << 8) | take(inp, 8)?)
    } else if first & 0xe0 == 0xc0 {
        Ok(((first & 0x1f) << 16) | take(inp, 16)?)
    } else {
        Err(QRError::CorruptDataSegment)
    }
}

// Charset for an ECI assignment number. None leaves the charset to be detected
fn eci_charset(assignment: u32) -> Option<&'static Encoding> {
    let enc = match assignment {
        1 | 3 | 27 | 170 => WINDOWS_1252,
        4 => ISO_8859_2,
        5 => ISO_8859_3,
        6 => ISO_8859_4,
        7 => ISO_8859_5,
        8 => ISO_8859_6,
        9 => ISO_8859_7,
        10 => ISO_8859_8,
        11 => WINDOWS_1254,
        12 => ISO_8859_10,
        13 => WINDOWS_874,
        15 => ISO_8859_13,
        16 => ISO_8859_14,
        17 => ISO_8859_15,
        18 => ISO_8859_16,
        20 => SHIFT_JIS,
        21 => WINDOWS_1250,
        22 => WINDOWS_1251,
        23 => WINDOWS_1252,
        24 => WINDOWS_1256,
        25 => UTF_16BE,
        26 => UTF_8,
        28 => BIG5,
        29 => GB18030,
        30 => EUC_KR,
        _ => return None,
    };
    Some(enc)
}

// Text writer
// Consecutive byte segments are buffered so multi-byte characters can span segments
//------------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TextWriter {
    out: String,
    pending: Vec<u8>,
    charset: Option<&'static Encoding>,
    gs1: bool,
}

impl TextWriter {
    fn push_text(&mut self, text: &str) -> QRResult<()> {
        self.flush()?;
        self.out.push_str(text);
        Ok(())
    }

    fn set_charset(&mut self, charset: Option<&'static Encoding>) -> QRResult<()> {
        self.flush()?;
        self.charset = charset;
        Ok(())
    }

    fn flush(&mut self) -> QRResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.pending);

        match self.charset {
            Some(enc) => {
                let (text, has_err) = enc.decode_without_bom_handling(&bytes);
                if has_err {
                    return Err(QRError::InvalidCharacterEncoding);
                }
                self.out.push_str(&text);
            }
            None => self.out.push_str(&detect_and_decode(bytes)),
        }
        Ok(())
    }

    fn finish(mut self) -> QRResult<String> {
        self.flush()?;
        Ok(self.out)
    }
}

// UTF-8 first, then Shift_JIS, then Latin-1 which accepts any byte
fn detect_and_decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(utf8) => utf8,
        Err(e) => {
            let bytes = e.into_bytes();
            let (kanji, has_err) = SHIFT_JIS.decode_without_bom_handling(&bytes);
            if !has_err {
                return kanji.into_owned();
            }
            WINDOWS_1252.decode_without_bom_handling(&bytes).0.into_owned()
        }
    }
}

#[cfg(test)]
mod decoder_tests {
    use test_case::test_case;

    use super::decode;
    use crate::common::metadata::Version;
    use crate::common::utils::QRError;

    // Packs a string of 0s and 1s into bytes, ignoring spaces and padding the last byte with 0s
    fn bits(s: &str) -> Vec<u8> {
        let bits: Vec<u8> = s.bytes().filter(|b| *b != b' ').map(|b| b - b'0').collect();
        bits.chunks(8)
            .map(|c| c.iter().enumerate().fold(0u8, |acc, (i, b)| acc | (b << (7 - i))))
            .collect()
    }

    #[test_case("0001 0000001000 0000001100 0101011001 1000011 0000", "01234567"; "numeric")]
    #[test_case("0010 000000101 00111001110 11100111001 000010 0000", "AC-42"; "alphanumeric")]
    #[test_case("0100 00000010 01101000 01101001 0000", "hi"; "byte")]
    #[test_case("0100 00000010 10010011 01011111 0000", "点"; "byte shift jis fallback")]
    #[test_case("0111 00011010 0100 00000010 11000011 10101001 0000", "é"; "eci utf8")]
    #[test_case("0111 00000011 0100 00000001 11101001 0000", "é"; "eci latin1")]
    #[test_case("1000 00000010 0110110011111 1101010101010 0000", "点茗"; "kanji")]
    #[test_case("0101 0010 000000011 00111001101 100110 0000", "AB\u{1d}"; "gs1 separator")]
    #[test_case("0011 0000000100000000 0100 00000001 01100001 0000", "a"; "structured append")]
    #[test_case("0001 0000000011 0001111011 000", "123"; "short tail without terminator")]
    #[test_case("0100 00000001 01100001 0001 0000000010 0101110", "a46"; "mixed segments")]
    fn test_decode(data: &str, exp: &str) {
        let ver = Version::new(1).unwrap();
        assert_eq!(decode(&bits(data), ver).unwrap(), exp);
    }

    #[test]
    fn test_decode_v10_char_count() {
        // Byte mode uses 16 bits for the character count from version 10
        let data = bits("0100 0000000000000010 01101111 01101011 0000");
        let ver = Version::new(10).unwrap();
        assert_eq!(decode(&data, ver).unwrap(), "ok");
    }

    #[test]
    fn test_utf8_split_across_segments() {
        let data = bits("0100 00000001 11000011 0100 00000001 10101001 0000");
        let ver = Version::new(1).unwrap();
        assert_eq!(decode(&data, ver).unwrap(), "é");
    }

    #[test_case("0110 0000", QRError::InvalidMode(6); "invalid mode")]
    #[test_case("0100 00000101 01101000 0000", QRError::CorruptDataSegment; "truncated byte")]
    #[test_case("0001 0000000011 1111101000", QRError::CorruptDataSegment; "numeric overflow")]
    #[test_case("0111 11100000 0100", QRError::CorruptDataSegment; "invalid eci")]
    fn test_decode_err(data: &str, exp: QRError) {
        let ver = Version::new(1).unwrap();
        assert_eq!(decode(&bits(data), ver), Err(exp));
    }
}
