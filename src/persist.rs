// imports
use crate::dictionary::{Dictionary, Entry, EntryType};
use crate::error::DictionaryError;

use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead, Read, Write};

// Binary layout, native byte order:
//   size:i32 nwords:i32 nlabels:i32 ntokens:i64
//   size x (text bytes, 0, count:i64, kind:u8)
//   quantized only: map size:usize, then (key:i32, value:i32) pairs
//
// Subword caches and the discard table are not stored, `load` recomputes them.

fn read_i32<R: Read>(input: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_ne_bytes(buf))
}

fn read_i64<R: Read>(input: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(i64::from_ne_bytes(buf))
}

fn read_usize<R: Read>(input: &mut R) -> io::Result<usize> {
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    input.read_exact(&mut buf)?;
    Ok(usize::from_ne_bytes(buf))
}

fn read_u8<R: Read>(input: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}


impl Dictionary {

    pub fn save<W: Write>(&self, out: &mut W) -> io::Result<()> {

        out.write_all(&self.size.to_ne_bytes())?;
        out.write_all(&self.nwords.to_ne_bytes())?;
        out.write_all(&self.nlabels.to_ne_bytes())?;
        out.write_all(&self.ntokens.to_ne_bytes())?;
        for e in &self.words {
            out.write_all(&e.word)?;
            out.write_all(&[0])?;
            out.write_all(&e.count.to_ne_bytes())?;
            out.write_all(&[e.entry_type as u8])?;
        }

        if self.quant {
            out.write_all(&self.quantidx.len().to_ne_bytes())?;
            for (k, v) in &self.quantidx {
                out.write_all(&k.to_ne_bytes())?;
                out.write_all(&v.to_ne_bytes())?;
            }
        }
        Ok(())
    }

    // Replaces the content of the dictionary with a saved one. `quantized` tells whether the
    // stream carries the quantization map, the file itself does not record it.
    pub fn load<R: BufRead>(&mut self, input: &mut R, quantized: bool) -> Result<(), DictionaryError> {

        let size = read_i32(input)?;
        let nwords = read_i32(input)?;
        let nlabels = read_i32(input)?;
        let ntokens = read_i64(input)?;
        if size < 0 || nwords < 0 || nlabels < 0 || nwords as i64 + nlabels as i64 != size as i64 {
            return Err(DictionaryError::Corrupt(format!("inconsistent header: size {}, words {}, labels {}", size, nwords, nlabels)));
        }
        if size as usize >= self.capacity() {
            return Err(DictionaryError::Corrupt(format!("{} entries do not fit a table of {}", size, self.capacity())));
        }

        // decode everything first, a failure leaves the current content untouched
        let mut entries: Vec<Entry> = Vec::with_capacity(size as usize);
        let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(size as usize);
        for i in 0..size {
            let mut word = Vec::new();
            input.read_until(0, &mut word)?;
            if word.pop() != Some(0) {
                return Err(DictionaryError::Corrupt(format!("entry {} is truncated", i)));
            }
            let count = read_i64(input)?;
            let kind = read_u8(input)?;
            let entry_type = EntryType::from_byte(kind)
                .ok_or_else(|| DictionaryError::Corrupt(format!("entry {} has unknown kind {}", i, kind)))?;
            if (entry_type == EntryType::Word) != (i < nwords) {
                return Err(DictionaryError::Corrupt(format!("entry {} is out of order", i)));
            }
            if !seen.insert(word.clone()) {
                return Err(DictionaryError::Corrupt(format!("entry {} is a duplicate", i)));
            }
            entries.push(Entry {
                word,
                count,
                entry_type,
                subwords: Vec::new()
            });
        }

        let mut quantidx = BTreeMap::new();
        if quantized {
            let map_size = read_usize(input)?;
            for _ in 0..map_size {
                let k = read_i32(input)?;
                let v = read_i32(input)?;
                quantidx.insert(k, v);
            }
        }

        self.words = entries;
        self.rebuild_index();
        self.ntokens = ntokens;
        self.quant = quantized;
        self.quantidx = quantidx;

        self.generation += 1;
        self.init_table_discard();
        self.init_ngrams();
        Ok(())
    }
}
