const LSB_MASK: u64 = 0x0101_0101_0101_0101;
const LOW7_MASK: u64 = 0x7F7F_7F7F_7F7F_7F7F;

/// Marks the high bit of every zero byte in `word`, with no false positives.
#[inline(always)]
fn zero_bytes(word: u64) -> u64 {
    !(((word & LOW7_MASK).wrapping_add(LOW7_MASK)) | word | LOW7_MASK)
}

pub trait ByteBuffer {
    /// Index of the first `needle` byte.
    fn byte_position(&self, needle: u8) -> Option<usize>;

    /// Index of the last `needle` byte.
    fn last_position(&self, needle: u8) -> Option<usize>;

    fn byte_count(&self, needle: u8) -> usize;
}

impl ByteBuffer for [u8] {
    #[inline(always)]
    fn byte_position(&self, needle: u8) -> Option<usize> {
        let mut i = 0;

        let repeat = LSB_MASK * needle as u64;
        while let Some(word) = self[i..].first_chunk::<8>() {
            let matching_bytes = zero_bytes(u64::from_le_bytes(*word) ^ repeat);

            if matching_bytes != 0 {
                let j = (matching_bytes.trailing_zeros() / 8) as usize;
                return Some(i + j);
            }

            i += 8;
        }

        self[i..]
            .iter()
            .position(|&b| b == needle)
            .map(|j| i + j)
    }

    #[inline(always)]
    fn last_position(&self, needle: u8) -> Option<usize> {
        let mut end = self.len();

        let repeat = LSB_MASK * needle as u64;
        while let Some(word) = self[..end].last_chunk::<8>() {
            let matching_bytes = zero_bytes(u64::from_le_bytes(*word) ^ repeat);

            if matching_bytes != 0 {
                let j = 7 - (matching_bytes.leading_zeros() / 8) as usize;
                return Some(end - 8 + j);
            }

            end -= 8;
        }

        self[..end].iter().rposition(|&b| b == needle)
    }

    fn byte_count(&self, needle: u8) -> usize {
        self.iter().filter(|&&b| b == needle).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_position() {
        let cases: Vec<(Vec<u8>, Option<usize>, Option<usize>)> = vec![
            (b"Xi;3.4\n".to_vec(), Some(2), Some(6)),
            (b"Lima;5.6\n".to_vec(), Some(4), Some(8)),
            (b"Berlin;12.3\n".to_vec(), Some(6), Some(11)),
            (b"Melbourne;23.4\n".to_vec(), Some(9), Some(14)),
            (b"San Francisco;-5.2\n".to_vec(), Some(13), Some(18)),
            (b"Thiruvananthapuram;31.2\n".to_vec(), Some(18), Some(23)),
            (
                b"Some Very Long Station Name That Goes On Forever;99.9\n".to_vec(),
                Some(48),
                Some(53),
            ),
            (b"".to_vec(), None, None),
            (b"Hell\nBo\n".to_vec(), None, Some(4)),
        ];

        for (input, semicolon, newline) in cases {
            assert_eq!(input.byte_position(b';'), semicolon);
            assert_eq!(input.byte_position(b'\n'), newline);
        }
    }

    #[test]
    fn test_last_position() {
        let cases: Vec<(&[u8], Option<usize>)> = vec![
            (b"", None),
            (b"Xi;3.4", None),
            (b"Xi;3.4\n", Some(6)),
            (b"Xi;3.4\nBo;1.0\nLeftover", Some(13)),
            (b"\nAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", Some(0)),
            (b"Lima;5.6\nBerlin;12.3\nMelbourne;23.4\n", Some(35)),
        ];

        for (input, expected) in cases {
            assert_eq!(input.last_position(b'\n'), expected, "{input:?}");
        }
    }

    #[test]
    fn test_positions_match_naive_search() {
        // Bytes one above the needle trip up the borrow-based SWAR trick.
        let bytes = b"<;<;;<<\n<<\n\n<<<<<<<<;<<<<<<<<\n<;";

        for start in 0..bytes.len() {
            let slice = &bytes[start..];
            for needle in [b';', b'\n'] {
                assert_eq!(
                    slice.byte_position(needle),
                    slice.iter().position(|&b| b == needle)
                );
                assert_eq!(
                    slice.last_position(needle),
                    slice.iter().rposition(|&b| b == needle)
                );
            }
        }
    }

    #[test]
    fn test_byte_position_realistic() {
        let lines = vec![
            "Bāgepalli;17.8",
            "San Fernando;-1.9",
            "Kika;4.3",
            "Bo;6.8",
        ];
        let str = lines.join("\n");
        let bytes = str.as_bytes();

        let end = bytes.len();

        // Bāgepalli;17.8
        let start = 0;
        let newline = bytes[start..end].byte_position(b'\n').unwrap();
        assert_eq!(newline, 15);

        let line = &bytes[start..start + newline];
        assert_eq!(line.byte_position(b';'), Some(10));

        // San Fernando;-1.9
        let start = start + newline + 1;
        let newline = bytes[start..end].byte_position(b'\n').unwrap();
        assert_eq!(newline, 17);

        let line = &bytes[start..start + newline];
        assert_eq!(line.byte_position(b';'), Some(12));

        // Kika;4.3
        let start = start + newline + 1;
        let newline = bytes[start..end].byte_position(b'\n').unwrap();
        assert_eq!(newline, 8);

        // Bo;6.8 has no trailing newline
        let start = start + newline + 1;
        assert_eq!(bytes[start..end].byte_position(b'\n'), None);
        assert_eq!(bytes[start..end].byte_position(b';'), Some(2));
    }

    #[test]
    fn test_byte_count() {
        assert_eq!(b"".byte_count(b'\n'), 0);
        assert_eq!(b"a;1\nb;2\nc;3".byte_count(b'\n'), 2);
    }
}
