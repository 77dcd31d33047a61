use crate::error::OutputError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// Standard alphabet; padding optional and trailing bits ignored on decode.
const BASE64_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A line of `"0"` is as good as empty to the generator protocol.
fn is_blank(line: &str) -> bool {
    line.is_empty() || line == "0"
}

/// A file produced by the generator in `name+b64` output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl GeneratedFile {
    /// Parse `name\nbase64\n...`. Lines past the second are ignored; a
    /// trailing `\r` on either line is dropped. Spaces and tabs inside the
    /// base64 line are skipped, and the final `=` padding may be left off.
    pub fn parse(output: &str) -> Result<Self, OutputError> {
        let mut lines = output.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        let name = lines
            .next()
            .filter(|l| !is_blank(l))
            .ok_or(OutputError::MissingName)?;
        let encoded = lines
            .next()
            .filter(|l| !is_blank(l))
            .ok_or(OutputError::MissingContent)?;

        if name.chars().any(char::is_control) {
            return Err(OutputError::InvalidFileName);
        }

        let encoded: String = encoded
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\r'))
            .collect();
        let content = BASE64_ENGINE
            .decode(encoded)
            .map_err(|e| OutputError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            content,
        })
    }

    /// `attachment; filename="..."` with embedded quotes backslash-escaped.
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"",
            self.name.replace('"', "\\\"")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_content() {
        let file = GeneratedFile::parse("icon.png\naGVsbG8gd29ybGQ=\n").unwrap();
        assert_eq!(file.name, "icon.png");
        assert_eq!(file.content, b"hello world");
    }

    #[test]
    fn ignores_lines_after_content() {
        let file = GeneratedFile::parse("icon.svg\nPHN2Zy8+\ntrailing diagnostics\n").unwrap();
        assert_eq!(file.content, b"<svg/>");
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let original: Vec<u8> = (0..=255u8).rev().collect();
        let output = format!("solacon.png\n{}\n", BASE64_ENGINE.encode(&original));

        let file = GeneratedFile::parse(&output).unwrap();

        assert_eq!(file.content, original);
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let file = GeneratedFile::parse("icon.png\r\naGk=\r\n").unwrap();
        assert_eq!(file.name, "icon.png");
        assert_eq!(file.content, b"hi");
    }

    #[test]
    fn rejects_missing_or_empty_lines() {
        assert_eq!(GeneratedFile::parse(""), Err(OutputError::MissingName));
        assert_eq!(GeneratedFile::parse("\naGk=\n"), Err(OutputError::MissingName));
        assert_eq!(GeneratedFile::parse("icon.png"), Err(OutputError::MissingContent));
        assert_eq!(GeneratedFile::parse("icon.png\n"), Err(OutputError::MissingContent));
        assert_eq!(GeneratedFile::parse("icon.png\n\naGk=\n"), Err(OutputError::MissingContent));
    }

    #[test]
    fn zero_counts_as_an_empty_line() {
        assert_eq!(GeneratedFile::parse("0\naGk=\n"), Err(OutputError::MissingName));
        assert_eq!(GeneratedFile::parse("icon.png\n0\n"), Err(OutputError::MissingContent));
        assert_eq!(GeneratedFile::parse("00\naGk=\n").unwrap().name, "00");
    }

    #[test]
    fn accepts_unpadded_and_spaced_base64() {
        let cases: [(&str, &[u8]); 5] = [
            ("aGk", b"hi"),
            ("aGl", b"hi"),
            ("aGVsbG8", b"hello"),
            ("a GVsbG8=", b"hello"),
            ("aGVs\tbG8gd29y bGQ", b"hello world"),
        ];

        for (encoded, expected) in cases {
            let file = GeneratedFile::parse(&format!("icon.png\n{encoded}\n")).unwrap();
            assert_eq!(file.content, expected, "{encoded:?}");
        }
    }

    #[test]
    fn rejects_invalid_base64() {
        for encoded in ["not base64!", "aGk=x", "aGVsb", "aG=k"] {
            let output = format!("icon.png\n{encoded}\n");
            assert!(
                matches!(GeneratedFile::parse(&output), Err(OutputError::InvalidBase64(_))),
                "{encoded:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_control_characters_in_name() {
        assert_eq!(
            GeneratedFile::parse("icon\t.png\naGk=\n"),
            Err(OutputError::InvalidFileName)
        );
    }

    #[test]
    fn escapes_quotes_in_content_disposition() {
        let file = GeneratedFile {
            name: r#"my "icon".png"#.to_string(),
            content: Vec::new(),
        };
        assert_eq!(
            file.content_disposition(),
            r#"attachment; filename="my \"icon\".png""#
        );
    }
}
