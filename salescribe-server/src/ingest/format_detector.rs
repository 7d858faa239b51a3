//! Encoding and delimiter detection for uploaded delimited text
//!
//! Detection only looks at a bounded prefix of the upload. The chosen
//! encoding is then applied to the whole buffer.

use super::IngestError;
use encoding_rs::Encoding;
use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

/// Bytes inspected when choosing an encoding and delimiter
pub const SAMPLE_PREFIX_BYTES: usize = 64 * 1024;

/// Non-empty lines inspected when scoring delimiters
const SAMPLE_LINES: usize = 10;

/// Candidate delimiters in preference order
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text encodings tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1252")]
    Windows1252,
    #[serde(rename = "x-mac-roman")]
    MacRoman,
}

impl TextEncoding {
    pub const CANDIDATES: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Windows1252,
        TextEncoding::MacRoman,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::MacRoman => "x-mac-roman",
        }
    }

    fn legacy(self) -> Option<&'static Encoding> {
        match self {
            TextEncoding::Utf8 => None,
            TextEncoding::Windows1252 => Some(encoding_rs::WINDOWS_1252),
            TextEncoding::MacRoman => Some(encoding_rs::MACINTOSH),
        }
    }

    /// Strict decode of a sample. `truncated` tolerates a multibyte UTF-8
    /// sequence cut off at the end of the sample.
    fn decode_sample<'a>(self, sample: &'a [u8], truncated: bool) -> Option<Cow<'a, str>> {
        match self.legacy() {
            None => match std::str::from_utf8(sample) {
                Ok(text) => Some(Cow::Borrowed(text)),
                Err(e) if truncated && e.error_len().is_none() => {
                    std::str::from_utf8(&sample[..e.valid_up_to()])
                        .ok()
                        .map(Cow::Borrowed)
                }
                Err(_) => None,
            },
            Some(encoding) => encoding.decode_without_bom_handling_and_without_replacement(sample),
        }
    }

    fn decode_full(self, bytes: &[u8]) -> String {
        match self.legacy() {
            None => String::from_utf8_lossy(bytes).into_owned(),
            Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }
}

/// Result of format detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    pub encoding: TextEncoding,
    pub delimiter: u8,
    /// Raw header cells as they appear in the file
    pub header: Vec<String>,
}

/// Detected format plus the fully decoded content
#[derive(Debug, Clone)]
pub struct DecodedUpload {
    pub format: DetectedFormat,
    pub text: String,
}

/// Detect encoding, delimiter and header of an uploaded buffer
///
/// # Errors
/// - [`IngestError::UnreadableFile`] for an empty buffer or one no candidate
///   encoding decodes to plausible text
/// - [`IngestError::NoHeader`] when fewer than two non-empty lines exist
pub fn detect(bytes: &[u8]) -> Result<DecodedUpload, IngestError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.is_empty() {
        return Err(IngestError::UnreadableFile("file is empty".to_string()));
    }

    let truncated = bytes.len() > SAMPLE_PREFIX_BYTES;
    let sample = &bytes[..bytes.len().min(SAMPLE_PREFIX_BYTES)];

    let (encoding, sample_text) = TextEncoding::CANDIDATES
        .into_iter()
        .find_map(|encoding| {
            encoding
                .decode_sample(sample, truncated)
                .filter(|text| is_plausible_text(text))
                .map(|text| (encoding, text))
        })
        .ok_or_else(|| {
            IngestError::UnreadableFile("content is not text in a supported encoding".to_string())
        })?;

    let lines: Vec<&str> = sample_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();
    if lines.len() < 2 {
        return Err(IngestError::NoHeader(
            "expected a header line followed by at least one data line".to_string(),
        ));
    }

    let delimiter = choose_delimiter(&lines);
    let header = parse_header(lines[0], delimiter)?;

    debug!(
        encoding = encoding.label(),
        delimiter = %(delimiter as char).escape_default(),
        columns = header.len(),
        "Detected upload format"
    );

    Ok(DecodedUpload {
        format: DetectedFormat {
            encoding,
            delimiter,
            header,
        },
        text: encoding.decode_full(bytes),
    })
}

fn is_plausible_text(text: &str) -> bool {
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\r' | '\n'))
}

/// Occurrences of `delimiter` outside double-quoted sections
pub fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Pick the candidate whose per-line count most often matches the header's.
/// Ties go to the earlier candidate; no candidate at all means comma.
pub fn choose_delimiter(lines: &[&str]) -> u8 {
    let Some(header) = lines.first() else {
        return b',';
    };

    let mut best: Option<(u8, usize, usize)> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let header_count = count_unquoted(header, delimiter);
        if header_count == 0 {
            continue;
        }
        let consistent = lines
            .iter()
            .filter(|line| count_unquoted(line, delimiter) == header_count)
            .count();
        let better = match best {
            None => true,
            Some((_, best_consistent, best_count)) => {
                consistent > best_consistent
                    || (consistent == best_consistent && header_count > best_count)
            }
        };
        if better {
            best = Some((delimiter, consistent, header_count));
        }
    }

    best.map(|(delimiter, _, _)| delimiter).unwrap_or(b',')
}

fn parse_header(line: &str, delimiter: u8) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(|cell| cell.to_string()).collect()),
        Ok(false) => Err(IngestError::NoHeader("header line is empty".to_string())),
        Err(e) => Err(IngestError::NoHeader(format!("header line is malformed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "date,product,amount\n2024-01-01,Widget,10.50\n2024-01-02,Gadget,3\n";

    #[test]
    fn test_empty_buffer_is_unreadable() {
        assert!(matches!(detect(b""), Err(IngestError::UnreadableFile(_))));
        assert!(matches!(detect(UTF8_BOM), Err(IngestError::UnreadableFile(_))));
    }

    #[test]
    fn test_binary_content_is_unreadable() {
        let bytes: Vec<u8> = vec![0x00, 0x01, 0x02, 0x81, 0x8D, 0xFF, b'\n', 0x00, 0x07];
        assert!(matches!(detect(&bytes), Err(IngestError::UnreadableFile(_))));
    }

    #[test]
    fn test_single_line_has_no_header() {
        assert!(matches!(detect(b"date,amount\n\n  \n"), Err(IngestError::NoHeader(_))));
    }

    #[test]
    fn test_utf8_comma() {
        let decoded = detect(SAMPLE.as_bytes()).unwrap();
        assert_eq!(decoded.format.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.format.delimiter, b',');
        assert_eq!(decoded.format.header, vec!["date", "product", "amount"]);
        assert_eq!(decoded.text, SAMPLE);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let decoded = detect(&bytes).unwrap();
        assert_eq!(decoded.format.header[0], "date");
        assert!(!decoded.text.starts_with('\u{feff}'));
    }

    #[test]
    fn test_each_delimiter_detected() {
        for delimiter in CANDIDATE_DELIMITERS {
            let d = delimiter as char;
            let text = format!(
                "date{d}product{d}amount\n2024-01-01{d}Widget{d}10\n2024-01-02{d}Gadget{d}3\n"
            );
            let decoded = detect(text.as_bytes()).unwrap();
            assert_eq!(decoded.format.delimiter, delimiter, "delimiter {:?}", d);
            assert_eq!(decoded.format.header.len(), 3);
        }
    }

    #[test]
    fn test_quoted_delimiters_do_not_count() {
        let text = "date;product;amount\n2024-01-01;\"Widget, large\";10,50\n2024-01-02;Gadget;3\n";
        let decoded = detect(text.as_bytes()).unwrap();
        assert_eq!(decoded.format.delimiter, b';');
    }

    #[test]
    fn test_windows_1252_detected() {
        // "Café" with 0xE9 is invalid UTF-8
        let bytes = b"date,product,amount\n2024-01-01,Caf\xE9,10\n".to_vec();
        let decoded = detect(&bytes).unwrap();
        assert_eq!(decoded.format.encoding, TextEncoding::Windows1252);
        assert!(decoded.text.contains("Café"));
    }

    #[test]
    fn test_mac_roman_detected_when_windows_1252_rejects() {
        // 0x8F is undefined in Windows-1252 and 'è' in Mac Roman
        let bytes = b"date,product,amount\n2024-01-01,Cr\x8Fme,10\n".to_vec();
        let decoded = detect(&bytes).unwrap();
        assert_eq!(decoded.format.encoding, TextEncoding::MacRoman);
        assert!(decoded.text.contains("Crème"));
    }

    #[test]
    fn test_truncated_utf8_sequence_at_prefix_edge() {
        let mut text = String::from("date,product,amount\n");
        while text.len() < SAMPLE_PREFIX_BYTES - 1 {
            text.push_str("2024-01-01,Widget,1\n");
        }
        text.truncate(SAMPLE_PREFIX_BYTES - 1);
        text.push('é');
        text.push_str("\n2024-01-02,Gadget,2\n");

        let decoded = detect(text.as_bytes()).unwrap();
        assert_eq!(decoded.format.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_no_candidate_defaults_to_comma() {
        assert_eq!(choose_delimiter(&["amount", "10", "20"]), b',');
    }

    #[test]
    fn test_consistency_beats_raw_count() {
        // Header has more '|' than ';' but only ';' is consistent
        let lines = ["a;b;c|x|y|z", "1;2;3", "4;5;6|7"];
        assert_eq!(choose_delimiter(&lines), b';');
    }
}
