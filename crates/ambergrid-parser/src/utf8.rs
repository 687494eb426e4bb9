/// Byte-at-a-time UTF-8 decoder. Invalid lead or continuation bytes reset
/// the decoder silently; nothing is emitted for them.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    codepoint: u32,
    expected: u8,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte through the decoder, calling `emit` once a full
    /// codepoint has been assembled.
    pub fn push(&mut self, byte: u8, mut emit: impl FnMut(char)) {
        if self.expected == 0 {
            if byte < 0x80 {
                emit(byte as char);
            } else if byte & 0xe0 == 0xc0 {
                self.codepoint = (byte & 0x1f) as u32;
                self.expected = 1;
            } else if byte & 0xf0 == 0xe0 {
                self.codepoint = (byte & 0x0f) as u32;
                self.expected = 2;
            } else if byte & 0xf8 == 0xf0 {
                self.codepoint = (byte & 0x07) as u32;
                self.expected = 3;
            } else {
                self.reset();
            }
        } else if byte & 0xc0 == 0x80 {
            self.codepoint = (self.codepoint << 6) | (byte & 0x3f) as u32;
            self.expected -= 1;
            if self.expected == 0 {
                let cp = self.codepoint;
                self.codepoint = 0;
                emit(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        } else {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.codepoint = 0;
        self.expected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode(bytes: &[u8]) -> Vec<char> {
        let mut decoder = Utf8Decoder::new();
        let mut out = Vec::new();
        for &b in bytes {
            decoder.push(b, |c| out.push(c));
        }
        out
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode(b"Hi!"), vec!['H', 'i', '!']);
    }

    #[test]
    fn two_byte_sequence() {
        // U+00E9 'é'
        assert_eq!(decode(&[0xc3, 0xa9]), vec!['\u{e9}']);
    }

    #[test]
    fn three_byte_sequence() {
        // U+2603 '☃'
        assert_eq!(decode(&[0xe2, 0x98, 0x83]), vec!['\u{2603}']);
    }

    #[test]
    fn four_byte_sequence() {
        // U+1F600 '😀'
        assert_eq!(decode(&[0xf0, 0x9f, 0x98, 0x80]), vec!['\u{1f600}']);
    }

    #[test]
    fn invalid_lead_resets_silently() {
        assert_eq!(decode(&[0xff, b'A']), vec!['A']);
    }

    #[test]
    fn truncated_sequence_resets_on_bad_continuation() {
        // lead byte for a 3-byte sequence followed by an ASCII byte: the
        // ASCII byte is not a continuation byte, so the decoder resets and
        // drops both without emitting anything.
        assert_eq!(decode(&[0xe2, b'A']), Vec::<char>::new());
    }

    #[test]
    fn never_panics_on_arbitrary_bytes() {
        for byte in 0u8..=255 {
            let mut decoder = Utf8Decoder::new();
            decoder.push(byte, |_| {});
        }
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_valid_utf8(s in ".*") {
            let bytes = s.as_bytes();
            let decoded = decode(bytes);
            let expected: Vec<char> = s.chars().collect();
            prop_assert_eq!(decoded, expected);
        }

        #[test]
        fn never_panics_on_arbitrary_byte_strings(bytes: Vec<u8>) {
            let mut decoder = Utf8Decoder::new();
            for b in bytes {
                decoder.push(b, |_| {});
            }
        }
    }
}
