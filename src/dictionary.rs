// imports
use crate::config::Args;
use crate::error::DictionaryError;
use crate::hash::hash;
use crate::ngrams::{bracket, NgramExtractor};
use crate::reader::{TokenReader, EOS};

use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Seek};
use std::sync::Arc;
use log::info;
use rand::Rng;
use rayon::prelude::*;

pub const MAX_VOCAB_SIZE: usize = 30000000;
pub const MAX_LINE_SIZE: usize = 1024;

// marks an unused slot in `word2int`
pub(crate) const EMPTY: i32 = -1;

const WORD_NGRAM_PRIME: u64 = 116049371;


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EntryType {
    Word = 0,
    Label = 1,
}

impl EntryType {
    pub fn from_byte(b: u8) -> Option<EntryType> {
        match b {
            0 => Some(EntryType::Word),
            1 => Some(EntryType::Label),
            _ => None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub word: Vec<u8>,
    pub count: i64,
    pub entry_type: EntryType,
    pub subwords: Vec<i32>,
}


// Vocabulary of words and labels with an open addressing index.
//
// `words` is the arena, an entry's position is its id. `word2int` maps a probe slot to an
// id and is only ever filled additively or rebuilt from scratch, never deleted from in
// place. Every `threshold` and `prune` reorders the arena, so ids handed out before are
// void afterwards; `generation` is bumped each time so callers can tell.
pub struct Dictionary {
    pub(crate) args: Arc<Args>,
    pub(crate) extractor: NgramExtractor,
    pub(crate) word2int: Vec<i32>,
    pub(crate) words: Vec<Entry>,
    pub(crate) pdiscard: Vec<f32>,
    pub(crate) size: i32,
    pub(crate) nwords: i32,
    pub(crate) nlabels: i32,
    pub(crate) ntokens: i64,
    pub(crate) quant: bool,
    pub(crate) quantidx: BTreeMap<i32, i32>,
    pub(crate) generation: u64,
}

impl Dictionary {

    pub fn new(args: Arc<Args>) -> Dictionary {
        Dictionary::with_capacity(args, MAX_VOCAB_SIZE)
    }

    pub fn with_capacity(args: Arc<Args>, capacity: usize) -> Dictionary {
        assert!(capacity > 0, "capacity must be positive");
        let extractor = NgramExtractor::new(args.minn, args.maxn, args.bucket);
        Self {
            args,
            extractor,
            word2int: vec![EMPTY; capacity],
            words: Vec::new(),
            pdiscard: Vec::new(),
            size: 0,
            nwords: 0,
            nlabels: 0,
            ntokens: 0,
            quant: false,
            quantidx: BTreeMap::new(),
            generation: 0
        }
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn capacity(&self) -> usize {
        self.word2int.len()
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn nwords(&self) -> i32 {
        self.nwords
    }

    pub fn nlabels(&self) -> i32 {
        self.nlabels
    }

    pub fn ntokens(&self) -> i64 {
        self.ntokens
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_quantized(&self) -> bool {
        self.quant
    }

    pub fn quantization_index(&self) -> &BTreeMap<i32, i32> {
        &self.quantidx
    }

    pub fn entries(&self) -> &[Entry] {
        &self.words
    }

    pub fn find(&self, w: &[u8]) -> usize {
        self.find_hashed(w, hash(w))
    }

    // linear probe from the hash slot to either the slot holding `w` or the first free one
    pub(crate) fn find_hashed(&self, w: &[u8], h: u32) -> usize {
        let capacity = self.word2int.len();
        let mut slot = h as usize % capacity;
        while self.word2int[slot] != EMPTY && self.words[self.word2int[slot] as usize].word != w {
            slot = (slot + 1) % capacity;
        }
        slot
    }

    pub fn add(&mut self, w: &[u8]) {
        let slot = self.find(w);
        self.ntokens += 1;
        if self.word2int[slot] == EMPTY {
            let entry_type = if w.starts_with(self.args.label.as_bytes()) {
                EntryType::Label
            } else {
                EntryType::Word
            };
            self.words.push(Entry {
                word: w.to_vec(),
                count: 1,
                entry_type,
                subwords: Vec::new()
            });
            self.word2int[slot] = self.size;
            self.size += 1;
        } else {
            let entry = &mut self.words[self.word2int[slot] as usize];
            entry.count = entry.count.saturating_add(1);
        }
    }

    pub fn get_id(&self, w: &[u8]) -> Option<i32> {
        let id = self.word2int[self.find(w)];
        if id == EMPTY { None } else { Some(id) }
    }

    pub fn get_type(&self, id: i32) -> EntryType {
        debug_assert!(id >= 0 && id < self.size, "id {} out of range", id);
        self.words[id as usize].entry_type
    }

    pub fn get_word(&self, id: i32) -> &[u8] {
        debug_assert!(id >= 0 && id < self.size, "id {} out of range", id);
        &self.words[id as usize].word
    }

    pub fn get_label(&self, lid: i32) -> &[u8] {
        debug_assert!(lid >= 0 && lid < self.nlabels, "label id {} out of range", lid);
        &self.words[(lid + self.nwords) as usize].word
    }

    pub fn get_counts(&self, entry_type: EntryType) -> Vec<i64> {
        self.words.iter().filter(|e| e.entry_type == entry_type).map(|e| e.count).collect()
    }

    // word -> id for every word kind entry. Words that are not valid utf8 are keyed by
    // their ascii escaped bytes (`\xff`), so distinct byte strings keep distinct keys.
    pub fn word_ids(&self) -> HashMap<String, usize> {
        self.words.iter()
            .take(self.nwords as usize)
            .enumerate()
            .map(|(i, e)| {
                let key = match std::str::from_utf8(&e.word) {
                    Ok(word) => word.to_owned(),
                    Err(_) => e.word.escape_ascii().to_string()
                };
                (key, i)
            })
            .collect()
    }

    // Sorts words before labels, each by descending count, drops the entries under the
    // minimum of their kind and rebuilds the index. Derived caches (subwords, discard
    // table) are cleared, `init_table_discard` and `init_ngrams` rebuild them.
    pub fn threshold(&mut self, t: i64, tl: i64) {
        self.words.sort_by(|e1, e2| {
            e1.entry_type.cmp(&e2.entry_type).then_with(|| e2.count.cmp(&e1.count))
        });
        self.words.retain(|e| {
            match e.entry_type {
                EntryType::Word => e.count >= t,
                EntryType::Label => e.count >= tl
            }
        });
        self.words.shrink_to_fit();
        self.pdiscard.clear();
        self.rebuild_index();
        self.generation += 1;
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.size = 0;
        self.nwords = 0;
        self.nlabels = 0;
        self.word2int.fill(EMPTY);
        for i in 0..self.words.len() {
            let slot = self.find(&self.words[i].word);
            self.word2int[slot] = self.size;
            self.size += 1;
            match self.words[i].entry_type {
                EntryType::Word => self.nwords += 1,
                EntryType::Label => self.nlabels += 1
            }
            self.words[i].subwords.clear();
        }
    }

    pub fn read_from_file<R: BufRead>(&mut self, reader: &mut TokenReader<R>) -> Result<(), DictionaryError> {

        // streaming pass, memory stays bounded by pruning with a rising watermark whenever
        // the table passes 75% of its capacity. Entries dropped that way are lost for good.
        let mut word = Vec::new();
        let mut min_threshold: i64 = 1;
        let high_water = 0.75 * self.capacity() as f64;
        while reader.read_word(&mut word)? {
            self.add(&word);
            if self.ntokens % 1000000 == 0 && self.args.verbose > 1 {
                info!("Read {}M words", self.ntokens / 1000000);
            }
            if self.size as f64 > high_water {
                min_threshold += 1;
                self.threshold(min_threshold, min_threshold);
            }
        }

        self.threshold(self.args.min_count, self.args.min_count_label);
        self.init_table_discard();
        self.init_ngrams();

        if self.args.verbose > 0 {
            info!("Read {}M words", self.ntokens / 1000000);
            info!("Number of words:  {}", self.nwords);
            info!("Number of labels: {}", self.nlabels);
        }
        if self.size == 0 {
            return Err(DictionaryError::EmptyVocabulary);
        }
        Ok(())
    }

    pub fn init_table_discard(&mut self) {
        let t = self.args.t;
        let ntokens = self.ntokens as f64;
        self.pdiscard = self.words.iter()
            .take(self.nwords as usize)
            .map(|e| {
                let f = e.count as f64 / ntokens;
                ((t / f).sqrt() + t / f) as f32
            })
            .collect();
    }

    // keep-probability bound of a word, a draw above it drops the word
    pub fn discard_bound(&self, id: i32) -> f32 {
        debug_assert!(id >= 0 && id < self.nwords, "word id {} out of range", id);
        self.pdiscard[id as usize]
    }

    pub fn discard(&self, id: i32, rand: f32) -> bool {
        if self.args.supervised {
            return false;
        }
        rand > self.discard_bound(id)
    }

    // an empty map gates nothing, a loaded or remapped one drops every bucket it lacks
    fn map_bucket(&self, h: i32) -> Option<i32> {
        if self.quantidx.is_empty() {
            Some(h)
        } else {
            self.quantidx.get(&h).copied()
        }
    }

    // `word` carries the boundary markers
    pub fn compute_ngrams(&self, word: &[u8], ngrams: &mut Vec<i32>) {
        self.extractor.for_each(word, |h, _| {
            if let Some(id) = self.map_bucket(h) {
                ngrams.push(self.nwords + id);
            }
        });
    }

    pub fn compute_ngrams_with_substrings(&self, word: &[u8], ngrams: &mut Vec<i32>, substrings: &mut Vec<Vec<u8>>) {
        self.extractor.for_each(word, |h, ngram| {
            if let Some(id) = self.map_bucket(h) {
                ngrams.push(self.nwords + id);
                substrings.push(ngram.to_vec());
            }
        });
    }

    fn entry_subwords(&self, id: usize) -> Vec<i32> {
        let mut subwords = vec![id as i32];
        self.compute_ngrams(&bracket(&self.words[id].word), &mut subwords);
        subwords
    }

    pub fn init_ngrams(&mut self) {
        let subwords: Vec<Vec<i32>> = (0..self.words.len())
            .into_par_iter()
            .map(|i| self.entry_subwords(i))
            .collect();
        for (entry, subwords) in self.words.iter_mut().zip(subwords) {
            entry.subwords = subwords;
        }
    }

    pub fn get_subwords(&self, id: i32) -> &[i32] {
        debug_assert!(id >= 0 && id < self.size, "id {} out of range", id);
        &self.words[id as usize].subwords
    }

    // cached sequence for known words, bare n-grams for out of vocabulary ones
    pub fn get_subwords_for(&self, word: &[u8]) -> Vec<i32> {
        match self.get_id(word) {
            Some(id) => self.get_subwords(id).to_vec(),
            None => {
                let mut ngrams = Vec::new();
                self.compute_ngrams(&bracket(word), &mut ngrams);
                ngrams
            }
        }
    }

    pub fn get_subwords_with_substrings(&self, word: &[u8]) -> (Vec<i32>, Vec<Vec<u8>>) {
        let mut ngrams = Vec::new();
        let mut substrings = Vec::new();
        match self.get_id(word) {
            Some(id) => {
                ngrams.push(id);
                substrings.push(self.words[id as usize].word.clone());
            },
            None => {
                ngrams.push(-1);
                substrings.push(word.to_vec());
            }
        }
        self.compute_ngrams_with_substrings(&bracket(word), &mut ngrams, &mut substrings);
        (ngrams, substrings)
    }

    // Appends the ids of every window of 2..n consecutive hashes. Hashes are widened with
    // sign extension before mixing, the serialized quantization map depends on it.
    pub fn add_ngrams(&self, line: &mut Vec<i32>, hashes: &[i32], n: usize) {
        self.for_each_window(hashes, n, |b| {
            if let Some(id) = self.map_bucket(b) {
                line.push(self.nwords + id);
            }
        });
    }

    // raw bucket of every window of 2..n consecutive hashes, never gated by the map
    pub(crate) fn for_each_window<F: FnMut(i32)>(&self, hashes: &[i32], n: usize, mut emit: F) {
        let bucket = self.args.bucket as u64;
        if bucket == 0 {
            return;
        }
        for i in 0..hashes.len() {
            let mut h = hashes[i] as i64 as u64;
            for j in (i + 1)..hashes.len().min(i + n) {
                h = h.wrapping_mul(WORD_NGRAM_PRIME).wrapping_add(hashes[j] as i64 as u64);
                emit((h % bucket) as i32);
            }
        }
    }

    pub fn get_line_tokens<R: BufRead + Seek>(&self, reader: &mut TokenReader<R>, tokens: &mut Vec<Vec<u8>>) -> io::Result<usize> {
        let max_line = if self.args.supervised { None } else { Some(MAX_LINE_SIZE) };
        reader.read_line(tokens, max_line)
    }

    // Reads one line and resolves it. Unknown tokens only leave their raw hash behind and
    // are not counted. Known words go through subsampling; a dropped word still leaves its
    // hash. Labels are reported relative to the first label id.
    pub fn get_line_with_hashes<R, G>(&self,
        reader: &mut TokenReader<R>,
        words: &mut Vec<i32>,
        word_hashes: &mut Vec<i32>,
        labels: &mut Vec<i32>,
        rng: &mut G) -> io::Result<usize>
    where
        R: BufRead + Seek,
        G: Rng + ?Sized {

        let mut tokens = Vec::new();
        self.get_line_tokens(reader, &mut tokens)?;
        words.clear();
        labels.clear();
        word_hashes.clear();

        let mut ntokens = 0;
        for token in &tokens {
            let h = hash(token);
            let wid = self.word2int[self.find_hashed(token, h)];
            if wid == EMPTY {
                word_hashes.push(h as i32);
                continue;
            }

            ntokens += 1;
            match self.get_type(wid) {
                EntryType::Word => {
                    if !self.discard(wid, rng.gen::<f32>()) {
                        words.push(wid);
                    }
                    word_hashes.push(h as i32);
                },
                EntryType::Label => labels.push(wid - self.nwords)
            }
        }
        Ok(ntokens)
    }

    // Line as consumed by a model: word ids (plus word n-gram features in supervised mode)
    // and label ids. Returns the number of known tokens on the line.
    pub fn get_line<R, G>(&self,
        reader: &mut TokenReader<R>,
        words: &mut Vec<i32>,
        labels: &mut Vec<i32>,
        rng: &mut G) -> io::Result<usize>
    where
        R: BufRead + Seek,
        G: Rng + ?Sized {

        let mut word_hashes = Vec::new();
        let ntokens = self.get_line_with_hashes(reader, words, &mut word_hashes, labels, rng)?;
        if self.args.supervised {
            if self.quant {
                self.add_ngrams(words, &word_hashes, self.args.word_ngrams);
            } else {
                let mut ngrams = Vec::new();
                self.add_ngrams(&mut ngrams, words, self.args.word_ngrams);
                words.extend(ngrams);
            }
        }
        Ok(ntokens)
    }

    pub fn is_eos(&self, id: i32) -> bool {
        self.get_word(id) == EOS.as_bytes()
    }
}


#[cfg(test)]
pub(crate) mod tests {

    use std::io::Cursor;
    use std::sync::Arc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::config::Args;
    use crate::error::DictionaryError;
    use crate::hash::hash;
    use crate::reader::{TokenReader, EOS};
    use super::{Dictionary, EntryType, EMPTY};

    pub(crate) fn build(text: &str, args: Args) -> Dictionary {
        let mut dict = Dictionary::with_capacity(Arc::new(args), 4096);
        let mut reader = TokenReader::new(Cursor::new(text.as_bytes().to_vec()));
        dict.read_from_file(&mut reader).unwrap();
        dict
    }

    fn reader(text: &str) -> TokenReader<Cursor<Vec<u8>>> {
        TokenReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn quiet(args: Args) -> Args {
        Args { verbose: 0, ..args }
    }

    #[test]
    fn end_to_end_small_corpus() {
        let dict = build("a b a c\na b\n", quiet(Args { min_count: 1, ..Args::default() }));

        // 6 words and 2 end of line tokens
        assert_eq!(dict.ntokens(), 8);
        assert_eq!(dict.size(), 4);
        assert_eq!(dict.nwords(), 4);
        assert_eq!(dict.nlabels(), 0);

        // descending counts, equal counts keep first seen order
        let expected: [(&[u8], i64); 4] = [(&b"a"[..], 3), (&b"b"[..], 2), (EOS.as_bytes(), 2), (&b"c"[..], 1)];
        for (id, (word, count)) in expected.iter().enumerate() {
            assert_eq!(dict.get_word(id as i32), *word);
            assert_eq!(dict.words[id].count, *count);
            assert_eq!(dict.get_id(word), Some(id as i32));
        }
        assert!(dict.is_eos(2));

        let mut r = reader("a b a c\na b\n");
        let mut tokens = Vec::new();
        dict.get_line_tokens(&mut r, &mut tokens).unwrap();
        let tokens: Vec<&[u8]> = tokens.iter().map(|t| t.as_slice()).collect();
        assert_eq!(tokens, vec![&b"a"[..], &b"b"[..], &b"a"[..], &b"c"[..], EOS.as_bytes()]);
    }

    #[test]
    fn find_is_stable_and_probes_past_collisions() {
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args::default())), 7);
        for w in ["x", "y", "z", "w"] {
            dict.add(w.as_bytes());
        }
        for w in ["x", "y", "z", "w"] {
            let slot = dict.find(w.as_bytes());
            assert_eq!(slot, dict.find(w.as_bytes()));
            assert_ne!(dict.word2int[slot], EMPTY);
            assert_eq!(dict.get_word(dict.word2int[slot]), w.as_bytes());
        }
        // every occupied slot is reachable by probing from its word's home slot
        for (slot, id) in dict.word2int.iter().enumerate() {
            if *id != EMPTY {
                assert_eq!(dict.find(&dict.words[*id as usize].word), slot);
            }
        }
        assert_eq!(dict.get_id(b"missing"), None);
    }

    #[test]
    fn add_counts_and_classifies() {
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args::default())), 64);
        dict.add(b"__label__pos");
        dict.add(b"good");
        dict.add(b"good");
        assert_eq!(dict.ntokens(), 3);
        assert_eq!(dict.size(), 2);
        assert_eq!(dict.get_type(0), EntryType::Label);
        assert_eq!(dict.get_type(1), EntryType::Word);
        assert_eq!(dict.words[1].count, 2);
    }

    #[test]
    fn word_map_keeps_invalid_utf8_apart() {
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args::default())), 64);
        for w in [&b"caf\xc3\xa9"[..], &b"a\xff"[..], &b"a\xfe"[..]] {
            dict.add(w);
        }
        dict.threshold(1, 1);

        let ids = dict.word_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids["café"], dict.get_id("café".as_bytes()).unwrap() as usize);
        assert_eq!(ids["a\\xff"], dict.get_id(b"a\xff").unwrap() as usize);
        assert_eq!(ids["a\\xfe"], dict.get_id(b"a\xfe").unwrap() as usize);
    }

    #[test]
    fn threshold_orders_and_filters() {
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args::default())), 64);
        let stream = "__label__x r q q __label__y p p p __label__y __label__y s s";
        for w in stream.split(' ') {
            dict.add(w.as_bytes());
        }
        let generation = dict.generation();
        dict.threshold(2, 2);

        assert_eq!(dict.generation(), generation + 1);
        assert_eq!(dict.nwords() + dict.nlabels(), dict.size());
        let kept: Vec<(&[u8], i64)> = dict.entries().iter().map(|e| (e.word.as_slice(), e.count)).collect();
        assert_eq!(kept, vec![(&b"p"[..], 3), (&b"q"[..], 2), (&b"s"[..], 2), (&b"__label__y"[..], 3)]);
        assert_eq!(dict.get_label(0), b"__label__y");
        assert_eq!(dict.get_id(b"r"), None);
        assert_eq!(dict.get_id(b"__label__x"), None);
        assert_eq!(dict.get_counts(EntryType::Word), vec![3, 2, 2]);
        assert_eq!(dict.get_counts(EntryType::Label), vec![3]);
    }

    #[test]
    fn dynamic_threshold_bounds_the_table() {
        // 40 slots, pruning kicks in above 30 entries
        let mut text = String::new();
        for i in 0..100 {
            text.push_str(&format!("rare{} common ", i));
        }
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args { min_count: 1, ..Args::default() })), 40);
        dict.read_from_file(&mut reader(&text)).unwrap();

        assert!(dict.size() as f64 <= 0.75 * 40.0);
        assert_eq!(dict.ntokens(), 200);
        assert_eq!(dict.get_word(0), b"common");
        assert_eq!(dict.words[0].count, 100);
    }

    #[test]
    fn empty_vocabulary_is_reported() {
        let mut dict = Dictionary::with_capacity(Arc::new(quiet(Args { min_count: 10, ..Args::default() })), 64);
        let result = dict.read_from_file(&mut reader("a b c\n"));
        assert!(matches!(result, Err(DictionaryError::EmptyVocabulary)));
    }

    #[test]
    fn subwords_are_cached_after_build() {
        let dict = build("cat cat dog\n", quiet(Args { min_count: 1, minn: 3, maxn: 3, bucket: 100, ..Args::default() }));
        let id = dict.get_id(b"cat").unwrap();
        let subwords = dict.get_subwords(id);
        assert_eq!(subwords.len(), 4);
        assert_eq!(subwords[0], id);
        for (sub, ngram) in subwords[1..].iter().zip(["<ca", "cat", "at>"]) {
            assert_eq!(*sub, dict.nwords() + (hash(ngram.as_bytes()) % 100) as i32);
        }
        assert_eq!(dict.get_subwords_for(b"cat"), subwords.to_vec());

        // unknown words get n-grams only
        assert_eq!(dict.get_subwords_for(b"cow").len(), 3);
        let (ids, subs) = dict.get_subwords_with_substrings(b"cow");
        assert_eq!(ids[0], -1);
        assert_eq!(subs[0], b"cow".to_vec());
        assert_eq!(subs[1..].to_vec(), vec![b"<co".to_vec(), b"cow".to_vec(), b"ow>".to_vec()]);

        let (ids, subs) = dict.get_subwords_with_substrings(b"dog");
        assert_eq!(ids[0], dict.get_id(b"dog").unwrap());
        assert_eq!(subs[0], b"dog".to_vec());
    }

    #[test]
    fn subsampling_is_monotonic_in_frequency() {
        let mut text = String::new();
        for _ in 0..50 { text.push_str("the "); }
        for _ in 0..5 { text.push_str("cat "); }
        text.push_str("zebra\n");
        let dict = build(&text, quiet(Args { min_count: 1, t: 0.01, ..Args::default() }));

        let the = dict.get_id(b"the").unwrap();
        let cat = dict.get_id(b"cat").unwrap();
        let zebra = dict.get_id(b"zebra").unwrap();
        assert!(dict.discard_bound(the) <= dict.discard_bound(cat));
        assert!(dict.discard_bound(cat) <= dict.discard_bound(zebra));

        for r in [0.0f32, 0.2, 0.5, 0.9, 0.999] {
            if dict.discard(cat, r) {
                assert!(dict.discard(the, r));
            }
        }

        // f = 50 / 57, t / f = 0.0114
        let f = 50.0 / 57.0;
        let expected = ((0.01f64 / f).sqrt() + 0.01 / f) as f32;
        assert!((dict.discard_bound(the) - expected).abs() < 1e-6);
    }

    #[test]
    fn supervised_never_discards() {
        let dict = build("a a a a b\n", quiet(Args { t: 1e-9, ..Args::supervised() }));
        assert!(!dict.discard(dict.get_id(b"a").unwrap(), 0.999));
    }

    #[test]
    fn unknown_tokens_only_leave_hashes() {
        let dict = build("a b\n", quiet(Args { min_count: 1, t: 1.0, ..Args::default() }));
        let mut rng = StdRng::seed_from_u64(0);
        let (mut words, mut hashes, mut labels) = (Vec::new(), Vec::new(), Vec::new());

        let mut r = reader("a zzz b\n");
        let ntokens = dict.get_line_with_hashes(&mut r, &mut words, &mut hashes, &mut labels, &mut rng).unwrap();

        // a, b and the end of line token are known, zzz is not
        assert_eq!(ntokens, 3);
        let eos = dict.get_id(EOS.as_bytes()).unwrap();
        assert_eq!(words, vec![dict.get_id(b"a").unwrap(), dict.get_id(b"b").unwrap(), eos]);
        assert_eq!(hashes, vec![hash(b"a") as i32, hash(b"zzz") as i32, hash(b"b") as i32, hash(EOS.as_bytes()) as i32]);
        assert!(labels.is_empty());
    }

    #[test]
    fn dropped_words_are_counted_but_not_emitted() {
        let mut text = String::new();
        for _ in 0..1000 { text.push_str("the "); }
        text.push_str("rare\n");
        let dict = build(&text, quiet(Args { min_count: 1, t: 1e-5, ..Args::default() }));
        let mut rng = StdRng::seed_from_u64(7);
        let (mut words, mut hashes, mut labels) = (Vec::new(), Vec::new(), Vec::new());

        let mut r = reader("the the the the the the the the the the\n");
        let ntokens = dict.get_line_with_hashes(&mut r, &mut words, &mut hashes, &mut labels, &mut rng).unwrap();
        assert_eq!(ntokens, 11);
        // "the" survives a draw with probability ~0.003
        assert!(words.len() < 5);
        assert_eq!(hashes.len(), 11);
    }

    #[test]
    fn supervised_line_with_labels_and_word_ngrams() {
        let args = quiet(Args { word_ngrams: 2, bucket: 1000, ..Args::supervised() });
        let dict = build("__label__a hello world\n__label__b hello\n", args);
        assert_eq!(dict.nlabels(), 2);

        let mut rng = StdRng::seed_from_u64(0);
        let (mut words, mut labels) = (Vec::new(), Vec::new());
        let mut r = reader("__label__b hello world\n");
        let ntokens = dict.get_line(&mut r, &mut words, &mut labels, &mut rng).unwrap();
        assert_eq!(ntokens, 4);

        let lid = dict.get_id(b"__label__b").unwrap() - dict.nwords();
        assert_eq!(labels, vec![lid]);
        assert_eq!(dict.get_label(lid), b"__label__b");

        let hello = dict.get_id(b"hello").unwrap();
        let world = dict.get_id(b"world").unwrap();
        let eos = dict.get_id(EOS.as_bytes()).unwrap();
        let bigram = |a: i32, b: i32| dict.nwords() + (((a as u64) * 116049371 + b as u64) % 1000) as i32;
        assert_eq!(words, vec![hello, world, eos, bigram(hello, world), bigram(world, eos)]);
    }

    #[test]
    fn add_ngrams_window_sizes() {
        let dict = build("a b c d\n", quiet(Args { min_count: 1, bucket: 1 << 20, ..Args::supervised() }));
        let mut line = Vec::new();
        dict.add_ngrams(&mut line, &[1, 2, 3, 4], 3);
        // pairs and triples: (1,2) (1,2,3) (2,3) (2,3,4) (3,4)
        assert_eq!(line.len(), 5);
        assert!(line.iter().all(|id| *id >= dict.nwords() && *id < dict.nwords() + (1 << 20)));

        line.clear();
        dict.add_ngrams(&mut line, &[1, 2, 3, 4], 1);
        assert!(line.is_empty());

        // negative hashes are sign extended before mixing
        line.clear();
        dict.add_ngrams(&mut line, &[-1, 5], 2);
        let h = (u64::MAX).wrapping_mul(116049371).wrapping_add(5);
        assert_eq!(line, vec![dict.nwords() + (h % (1 << 20)) as i32]);
    }
}
