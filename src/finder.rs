use bytes::Bytes;

/// Precomputed Boyer-Moore-Horspool search state for one boundary.
///
/// The byte table holds the bad-character shift for every byte value, the
/// offset table the good-suffix shift for every depth of partial match.
/// Both are derived once from the needle and never change afterwards.
#[derive(Debug, Clone)]
pub(crate) struct BoundaryFinder {
    needle: Bytes,
    byte_table: [usize; 256],
    offset_table: Box<[usize]>,
}

impl BoundaryFinder {
    /// Builds the skip tables for `needle`, which must not be empty.
    pub fn new<B: Into<Bytes>>(needle: B) -> crate::Result<BoundaryFinder> {
        let needle = needle.into();

        if needle.is_empty() {
            return Err(crate::Error::InvalidBoundary("boundary must have non-zero length"));
        }

        Ok(BoundaryFinder {
            byte_table: byte_table(&needle),
            offset_table: offset_table(&needle),
            needle,
        })
    }

    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    pub fn len(&self) -> usize {
        self.needle.len()
    }

    /// Searches the first `max_len` positions of a haystack addressed through
    /// `at` and returns the offset where the first match starts.
    ///
    /// A match has to end before `max_len`; bytes at or past it are never
    /// looked at.
    pub fn find_by<F>(&self, max_len: usize, at: F) -> Option<usize>
    where
        F: Fn(usize) -> u8,
    {
        let last = self.needle.len() - 1;
        let mut i = last;

        while i < max_len {
            let mut j = last;

            loop {
                if self.needle[j] != at(i) {
                    break;
                }

                if j == 0 {
                    return Some(i);
                }

                i -= 1;
                j -= 1;
            }

            i += self.offset_table[last - j].max(self.byte_table[at(i) as usize]);
        }

        None
    }

    /// Searches a contiguous slice.
    #[cfg(test)]
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        self.find_by(haystack.len(), |i| haystack[i])
    }
}

fn byte_table(needle: &[u8]) -> [usize; 256] {
    let mut table = [needle.len(); 256];

    for (i, &b) in needle.iter().enumerate() {
        table[b as usize] = needle.len() - 1 - i;
    }

    table
}

fn offset_table(needle: &[u8]) -> Box<[usize]> {
    let len = needle.len();
    let mut table = vec![0; len];
    let mut last_prefix_position = len;

    for i in (1..=len).rev() {
        if is_prefix(needle, i) {
            last_prefix_position = i;
        }
        table[len - i] = last_prefix_position - i + len;
    }

    for i in 0..len - 1 {
        let suffix_len = suffix_length(needle, i);
        table[suffix_len] = len - 1 - i + suffix_len;
    }

    table.into_boxed_slice()
}

/// Whether `needle[position..]` is also a prefix of `needle`.
fn is_prefix(needle: &[u8], position: usize) -> bool {
    needle[position..].iter().zip(needle.iter()).all(|(a, b)| a == b)
}

/// Length of the longest substring ending at `position` that is also a suffix of `needle`.
fn suffix_length(needle: &[u8], position: usize) -> usize {
    needle[..=position]
        .iter()
        .rev()
        .zip(needle.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_needle_rejected() {
        assert!(BoundaryFinder::new(Bytes::new()).is_err());
    }

    #[test]
    fn test_find() {
        let finder = BoundaryFinder::new(&b"\r\n--XYZ"[..]).unwrap();

        assert_eq!(finder.find(b"abc\r\n--XYZ"), Some(3));
        assert_eq!(finder.find(b"\r\n--XYZ--"), Some(0));
        assert_eq!(finder.find(b"abc\r\n--XY"), None);
        assert_eq!(finder.find(b"\r\n--XY\r\n--XYZ"), Some(6));
        assert_eq!(finder.find(b""), None);
    }

    #[test]
    fn test_find_stops_at_max_len() {
        let finder = BoundaryFinder::new(&b"bc"[..]).unwrap();
        let haystack = b"aaabc";

        assert_eq!(finder.find_by(5, |i| haystack[i]), Some(3));
        assert_eq!(finder.find_by(4, |i| haystack[i]), None);
    }

    #[test]
    fn test_repeated_byte_needle() {
        let finder = BoundaryFinder::new(&b"aaaa"[..]).unwrap();

        assert_eq!(finder.find(b"aaabaaa"), None);
        assert_eq!(finder.find(b"aaabaaaa"), Some(4));
        assert_eq!(finder.find(b"aaaaaaaa"), Some(0));
    }

    #[test]
    fn test_self_overlapping_needle() {
        let finder = BoundaryFinder::new(&b"abab"[..]).unwrap();

        assert_eq!(finder.find(b"aabababab"), Some(1));
        assert_eq!(finder.find(b"abaabab"), Some(3));
    }

    #[test]
    fn test_tables() {
        let finder = BoundaryFinder::new(&b"abcab"[..]).unwrap();

        assert_eq!(finder.byte_table[b'a' as usize], 1);
        assert_eq!(finder.byte_table[b'b' as usize], 0);
        assert_eq!(finder.byte_table[b'c' as usize], 2);
        assert_eq!(finder.byte_table[b'z' as usize], 5);
        assert_eq!(finder.offset_table.len(), 5);
    }

    proptest! {
        #[test]
        fn prop_matches_naive_search(
            needle in proptest::collection::vec(0u8..4, 1..8),
            haystack in proptest::collection::vec(0u8..4, 0..64),
        ) {
            let finder = BoundaryFinder::new(needle.clone()).unwrap();
            prop_assert_eq!(finder.find(&haystack), memchr::memmem::find(&haystack, &needle));
        }

        #[test]
        fn prop_matches_naive_search_in_window(
            needle in proptest::collection::vec(0u8..3, 1..6),
            haystack in proptest::collection::vec(0u8..3, 0..48),
            window in 0usize..48,
        ) {
            let window = window.min(haystack.len());
            let finder = BoundaryFinder::new(needle.clone()).unwrap();
            prop_assert_eq!(
                finder.find_by(window, |i| haystack[i]),
                memchr::memmem::find(&haystack[..window], &needle)
            );
        }
    }
}
