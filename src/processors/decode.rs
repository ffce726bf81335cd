//! Greedy CTC decoding of per-frame class indices.
//!
//! The network emits one class index per frame. Greedy decoding collapses
//! that sequence into text by dropping the blank class, merging runs of the
//! same index, and mapping what remains through the charset.

use crate::core::BLANK_INDEX;
use crate::domain::Charset;

/// Text decoded from one sequence, with decoding statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedSequence {
    /// The decoded text.
    pub text: String,
    /// Indices skipped because they fall outside the charset.
    pub out_of_vocabulary: usize,
}

/// Greedy CTC decoder over a fixed charset.
#[derive(Debug, Clone)]
pub struct CTCGreedyDecode {
    charset: Charset,
}

impl CTCGreedyDecode {
    /// Creates a decoder for `charset`.
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }

    /// The charset used for lookups.
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Decodes one class index sequence into text.
    ///
    /// Out-of-range indices, negative ones included, are skipped silently.
    pub fn decode(&self, indices: &[i64]) -> String {
        self.decode_detailed(indices).text
    }

    /// Decodes several sequences independently.
    pub fn decode_batch<S: AsRef<[i64]>>(&self, sequences: &[S]) -> Vec<String> {
        sequences.iter().map(|s| self.decode(s.as_ref())).collect()
    }

    /// Like [`CTCGreedyDecode::decode`], also counting skipped indices.
    pub fn decode_detailed(&self, indices: &[i64]) -> DecodedSequence {
        let mut out = DecodedSequence::default();
        let mut last = BLANK_INDEX;

        for &index in indices {
            if index != BLANK_INDEX && index != last {
                match self.charset.get(index) {
                    Some(entry) => out.text.push_str(entry),
                    None => out.out_of_vocabulary += 1,
                }
            }
            // an out-of-range index still breaks a run
            last = index;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> CTCGreedyDecode {
        let charset =
            Charset::from_entries(vec!["".into(), "A".into(), "B".into(), "C".into()]).unwrap();
        CTCGreedyDecode::new(charset)
    }

    #[test]
    fn test_blank_separates_repeats() {
        assert_eq!(abc().decode(&[0, 3, 3, 0, 3]), "CC");
    }

    #[test]
    fn test_consecutive_repeats_collapse() {
        assert_eq!(abc().decode(&[0, 3, 3, 3, 0]), "C");
        assert_eq!(abc().decode(&[1, 1, 2, 2, 1]), "ABA");
    }

    #[test]
    fn test_all_blank_is_empty() {
        assert_eq!(abc().decode(&[0, 0, 0]), "");
        assert_eq!(abc().decode(&[]), "");
    }

    #[test]
    fn test_out_of_range_skipped_silently() {
        let charset = Charset::from_entries(
            ["", "a", "b", "c", "d"].into_iter().map(String::from).collect(),
        )
        .unwrap();
        let decoder = CTCGreedyDecode::new(charset);
        assert_eq!(decoder.decode(&[0, 99]), "");

        let detailed = decoder.decode_detailed(&[0, 99, 99, 1, -4, 2]);
        assert_eq!(detailed.text, "ab");
        assert_eq!(detailed.out_of_vocabulary, 2);
    }

    #[test]
    fn test_out_of_range_breaks_run() {
        assert_eq!(abc().decode(&[2, 42, 2]), "BB");
    }

    #[test]
    fn test_multi_character_entries() {
        let charset =
            Charset::from_entries(vec!["".into(), "th".into(), "e".into(), " ".into()]).unwrap();
        let decoder = CTCGreedyDecode::new(charset);
        assert_eq!(decoder.decode(&[1, 1, 2, 0, 3, 1, 0]), "the th");
    }

    #[test]
    fn test_decode_batch_keeps_order() {
        let decoded = abc().decode_batch(&[vec![1, 0, 2], vec![], vec![3, 3]]);
        assert_eq!(decoded, vec!["AB".to_string(), String::new(), "C".to_string()]);
    }
}
