// imports
use crate::hash::hash;

pub const BOW: &str = "<";
pub const EOW: &str = ">";

fn is_continuation(c: u8) -> bool {
    (c & 0xC0) == 0x80
}

// wraps a word with the boundary markers
pub fn bracket(word: &[u8]) -> Vec<u8> {
    let mut bracketed = Vec::with_capacity(word.len() + BOW.len() + EOW.len());
    bracketed.extend_from_slice(BOW.as_bytes());
    bracketed.extend_from_slice(word);
    bracketed.extend_from_slice(EOW.as_bytes());
    bracketed
}


#[derive(Clone, Copy, Debug)]
pub struct NgramExtractor {
    pub minn: usize,
    pub maxn: usize,
    pub bucket: u32,
}

impl NgramExtractor {

    pub fn new(minn: usize, maxn: usize, bucket: u32) -> Self {
        Self { minn, maxn, bucket }
    }

    pub fn is_enabled(&self) -> bool {
        self.maxn > 0 && self.bucket > 0
    }

    pub fn bucket_of(&self, ngram: &[u8]) -> i32 {
        (hash(ngram) % self.bucket) as i32
    }

    // Calls `emit` with the bucket of every character n-gram of `word` and the n-gram
    // bytes. `word` is expected to carry the boundary markers already.
    //
    // Start positions skip UTF-8 continuation bytes and n-grams grow one code point at a
    // time, so a multi-byte character is never cut. Malformed sequences are not rejected,
    // stray continuation bytes just glue onto the preceding character.
    pub fn for_each<F>(&self, word: &[u8], mut emit: F)
    where
        F: FnMut(i32, &[u8]) {

        if !self.is_enabled() {
            return;
        }

        let len = word.len();
        for i in 0..len {
            if is_continuation(word[i]) {
                continue;
            }

            let mut j = i;
            let mut n = 1;
            while j < len && n <= self.maxn {
                j += 1;
                while j < len && is_continuation(word[j]) {
                    j += 1;
                }
                // single characters at either end are the markers themselves
                if n >= self.minn && !(n == 1 && (i == 0 || j == len)) {
                    let ngram = &word[i..j];
                    emit(self.bucket_of(ngram), ngram);
                }
                n += 1;
            }
        }
    }
}


#[cfg(test)]
mod tests {

    use super::{bracket, NgramExtractor};
    use crate::hash::hash;

    fn collect(extractor: &NgramExtractor, word: &[u8]) -> (Vec<i32>, Vec<Vec<u8>>) {
        let mut ids = Vec::new();
        let mut subs = Vec::new();
        extractor.for_each(word, |h, ngram| {
            ids.push(h);
            subs.push(ngram.to_vec());
        });
        (ids, subs)
    }

    fn substrings(extractor: &NgramExtractor, word: &str) -> Vec<String> {
        let (_, subs) = collect(extractor, &bracket(word.as_bytes()));
        subs.into_iter().map(|s| String::from_utf8(s).unwrap()).collect()
    }

    #[test]
    fn trigrams_of_cat() {
        let extractor = NgramExtractor::new(3, 3, 2000000);
        assert_eq!(substrings(&extractor, "cat"), vec!["<ca", "cat", "at>"]);
    }

    #[test]
    fn ids_are_buckets() {
        let extractor = NgramExtractor::new(3, 3, 1000);
        let (ids, _) = collect(&extractor, &bracket(b"cat"));
        let expected: Vec<i32> = ["<ca", "cat", "at>"].iter()
            .map(|s| (hash(s.as_bytes()) % 1000) as i32)
            .collect();
        assert_eq!(ids, expected);
        assert!(ids.iter().all(|id| (0..1000).contains(id)));
    }

    #[test]
    fn boundary_unigrams_are_skipped() {
        let extractor = NgramExtractor::new(1, 2, 100);
        // "<" and ">" alone are never produced, "<a" and "b>" are
        assert_eq!(substrings(&extractor, "ab"), vec!["<a", "a", "ab", "b", "b>"]);
    }

    #[test]
    fn multibyte_characters_are_atomic() {
        let extractor = NgramExtractor::new(1, 2, 100);
        let subs = substrings(&extractor, "né");
        assert_eq!(subs, vec!["<n", "n", "né", "é", "é>"]);

        // every substring is valid utf8, i.e. no code point was cut
        let extractor = NgramExtractor::new(1, 6, 100);
        for s in substrings(&extractor, "日本語のテキスト") {
            assert!(!s.is_empty());
            assert!(s.chars().count() <= 6);
        }
    }

    #[test]
    fn malformed_utf8_is_tolerated() {
        let extractor = NgramExtractor::new(1, 1, 100);
        // a lone continuation byte sticks to the previous character
        let (_, subs) = collect(&extractor, &bracket(&[b'a', 0x80, b'b']));
        assert_eq!(subs, vec![vec![b'a', 0x80], vec![b'b']]);
    }

    #[test]
    fn disabled_extractor_emits_nothing() {
        assert!(collect(&NgramExtractor::new(0, 0, 100), &bracket(b"word")).0.is_empty());
        assert!(collect(&NgramExtractor::new(3, 6, 0), &bracket(b"word")).0.is_empty());
    }
}
