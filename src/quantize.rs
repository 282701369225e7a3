// imports
use crate::dictionary::{Dictionary, EntryType};
use crate::error::DictionaryError;
use crate::hash::hash;
use crate::reader::TokenReader;

use std::collections::{BTreeMap, HashMap};
use std::collections::btree_map::Entry as MapEntry;
use std::fs::File;
use std::io::BufReader;
use log::info;


impl Dictionary {

    // Keeps the word ids and n-gram ids listed in `idx` (labels always stay) and rewrites
    // `idx` to the surviving ids: sorted word ids first, then the n-gram ids that got a
    // compact slot, in the order of those slots. On error the dictionary and `idx` are
    // left as they were.
    pub fn prune(&mut self, idx: &mut Vec<i32>) -> Result<(), DictionaryError> {

        let mut words: Vec<i32> = Vec::new();
        let mut ngrams: Vec<i32> = Vec::new();
        for id in idx.iter() {
            if *id >= self.nwords {
                ngrams.push(*id);
            } else if *id >= 0 {
                words.push(*id);
            }
        }
        words.sort_unstable();
        words.dedup();

        let mut kept = words.clone();
        if !ngrams.is_empty() {
            let (quantidx, remaining) = self.convert_ngrams(&ngrams)?;
            kept.extend_from_slice(&remaining);
            // nothing survived the remap, the full bucket space stays addressable
            self.quant = !quantidx.is_empty();
            self.quantidx = quantidx;
        }
        *idx = kept;

        // compact the arena, the kept words keep their relative order and labels follow
        let old = std::mem::take(&mut self.words);
        let mut w = 0;
        for (i, entry) in old.into_iter().enumerate() {
            let keep = match entry.entry_type {
                EntryType::Label => true,
                EntryType::Word => w < words.len() && words[w] == i as i32
            };
            if keep {
                if entry.entry_type == EntryType::Word {
                    w += 1;
                }
                self.words.push(entry);
            }
        }

        self.rebuild_index();
        self.generation += 1;
        self.init_table_discard();
        self.init_ngrams();
        Ok(())
    }

    // Rescans the corpus and, for every retained n-gram bucket, tallies the buckets the
    // same word windows fall into when built from raw token hashes instead of word ids.
    // Each bucket is replaced by its most frequent raw counterpart (ties go to the lowest
    // one), which then gets the next compact id. Buckets that never occur, or whose
    // counterpart is already taken, are left out of the returned ids.
    //
    // Returns the new map and the surviving n-gram ids; `self` is not touched.
    fn convert_ngrams(&self, ngramidx: &[i32]) -> Result<(BTreeMap<i32, i32>, Vec<i32>), DictionaryError> {

        let corpus = self.args.input.clone();
        let file = File::open(&corpus)
            .map_err(|source| DictionaryError::CorpusUnavailable { path: corpus.clone(), source })?;
        let mut reader = TokenReader::new(BufReader::new(file));

        let mut convert: HashMap<i32, BTreeMap<i32, u64>> = ngramidx.iter()
            .map(|id| (*id, BTreeMap::new()))
            .collect();

        let n = self.args.word_ngrams;
        let mut tokens = Vec::new();
        let (mut words, mut word_hashes) = (Vec::new(), Vec::new());
        let (mut oldhashes, mut newhashes) = (Vec::new(), Vec::new());
        while !reader.at_end()? {
            self.get_line_tokens(&mut reader, &mut tokens)?;

            // only positions holding a known word feed both sequences, so they stay aligned
            words.clear();
            word_hashes.clear();
            for token in &tokens {
                let h = hash(token);
                let wid = self.word2int[self.find_hashed(token, h)];
                if wid >= 0 && self.get_type(wid) == EntryType::Word {
                    words.push(wid);
                    word_hashes.push(h as i32);
                }
            }
            if words.is_empty() {
                continue;
            }

            // both sides in the raw bucket space, whatever map is currently loaded
            oldhashes.clear();
            newhashes.clear();
            self.for_each_window(&words, n, |b| oldhashes.push(self.nwords + b));
            self.for_each_window(&word_hashes, n, |b| newhashes.push(b));
            debug_assert_eq!(oldhashes.len(), newhashes.len());

            for (oh, nh) in oldhashes.iter().zip(newhashes.iter()) {
                if let Some(tally) = convert.get_mut(oh) {
                    *tally.entry(*nh).or_insert(0) += 1;
                }
            }
        }

        let mut quantidx = BTreeMap::new();
        let mut remaining = Vec::new();
        let mut next: i32 = 0;
        for id in ngramidx.iter() {
            let best = convert.get(id).and_then(|tally| {
                tally.iter().fold(None, |best: Option<(i32, u64)>, (h, c)| match best {
                    Some((_, top)) if top >= *c => best,
                    _ => Some((*h, *c))
                })
            });
            let newhash = match best {
                Some((newhash, _)) => newhash,
                None => continue
            };
            if let MapEntry::Vacant(slot) = quantidx.entry(newhash) {
                slot.insert(next);
                next += 1;
                remaining.push(*id);
            }
        }

        if self.args.verbose > 0 {
            info!("Kept {} of {} n-gram buckets", remaining.len(), ngramidx.len());
        }
        Ok((quantidx, remaining))
    }
}
