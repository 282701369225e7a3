// imports
use crate::config::{files_handling, Config, JsonTypes};
use crate::dictionary::{Dictionary, EntryType};
use crate::error::DictionaryError;
use crate::reader::TokenReader;

use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Instant;
use bincode::{deserialize, serialize};
use log::{info, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::{prelude::*, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};


// One corpus line as handed to a model: word ids (with n-gram features in supervised
// mode) and label ids relative to the first label.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EncodedLine {
    pub words: Vec<i32>,
    pub labels: Vec<i32>,
}

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> dictionary building (or loading), optionally pruned
    // -> encoding of the corpus by the worker threads

    pub fn run() {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = match Config::new(&args) {
            Ok(config) => config.get_params(),
            Err(e) => panic!("{}", e)
        };

        if let Err(e) = Pipeline::run_with(&params) {
            panic!("{}", e)
        }
    }

    pub fn run_with(params: &JsonTypes) -> Result<Dictionary, Box<dyn Error>> {

        let timer = Instant::now();
        let mut dict = match params.saved_dict {
            Some(true) => {
                info!("loading dictionary from {}...", params.output_dir);
                Pipeline::load_dict(params)?
            },
            _ => {
                info!("{}", params);
                info!("starting dictionary building...");
                Pipeline::build_dict(params)?
            }
        };
        info!("dictionary ready with {} entries, took {} seconds ...", dict.size(), timer.elapsed().as_secs());

        if let Some(prune_ids) = &params.prune_ids {
            let timer = Instant::now();
            let path = prune_ids.strip_suffix(".json").unwrap_or(prune_ids);
            let mut idx = files_handling::read_input::<Vec<i32>>(path)?;
            info!("pruning to {} ids...", idx.len());
            dict.prune(&mut idx)?;
            files_handling::save_output::<Vec<i32>>(&params.output_dir, "kept_ids", &idx)?;
            info!("kept {} ids, took {} seconds ...", idx.len(), timer.elapsed().as_secs());
        }

        // save the dictionary and the views models consume
        files_handling::save_output::<Dictionary>(&params.output_dir, "dict", &dict)?;
        files_handling::save_output::<HashMap<String, usize>>(&params.output_dir, "words", &dict.word_ids())?;
        let counts = Array1::from(dict.get_counts(EntryType::Word));
        files_handling::save_output::<Array1<i64>>(&params.output_dir, "counts", &counts)?;

        let timer = Instant::now();
        info!("starting encoding with {} threads...", params.num_threads);
        let chunks = Pipeline::encode(&dict, params)?;
        files_handling::save_output::<Vec<Vec<u8>>>(&params.output_dir, "ids", &chunks)?;
        info!("finished encoding, saved as zip files. Took {} seconds ...", timer.elapsed().as_secs());

        Ok(dict)
    }

    fn build_dict(params: &JsonTypes) -> Result<Dictionary, Box<dyn Error>> {
        let file = File::open(&params.corpus_file)?;
        let mut reader = TokenReader::new(BufReader::new(file));
        let mut dict = Dictionary::new(Arc::new(params.args.clone()));
        dict.read_from_file(&mut reader)?;
        Ok(dict)
    }

    pub fn load_dict(params: &JsonTypes) -> Result<Dictionary, Box<dyn Error>> {
        let path = params.output_dir.to_string() + "/dict.bin";
        let mut input = BufReader::new(File::open(path)?);
        let mut dict = Dictionary::new(Arc::new(params.args.clone()));
        dict.load(&mut input, params.quantized)?;
        Ok(dict)
    }

    pub fn encode(dict: &Dictionary, params: &JsonTypes) -> Result<Vec<Vec<u8>>, Box<dyn Error>> {

        let num_threads = params.num_threads;
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
        let chunks = pool.install(|| {
            (0..num_threads).into_par_iter().map(|thread_i| {
                Pipeline::run_thread(dict, &params.corpus_file, thread_i, num_threads, params.seed)
            }).collect::<Result<Vec<Vec<u8>>, DictionaryError>>()
        })?;
        Ok(chunks)
    }

    // Each thread reads its own handle starting at its share of the file and encodes
    // lines until it has seen `ntokens / num_threads` known tokens, wrapping around the
    // end of the corpus when needed.
    fn run_thread(dict: &Dictionary,
        corpus: &str,
        thread_i: usize,
        num_threads: usize,
        seed: u64) -> Result<Vec<u8>, DictionaryError> {

        let file = File::open(corpus)
            .map_err(|source| DictionaryError::CorpusUnavailable { path: corpus.to_string(), source })?;
        let len = file.metadata()?.len();
        let mut reader = TokenReader::new(BufReader::new(file));
        reader.seek_to(thread_i as u64 * len / num_threads as u64)?;

        let mut rng = StdRng::seed_from_u64(seed + thread_i as u64);
        let share = dict.ntokens() / num_threads as i64;
        let mut consumed: i64 = 0;
        let mut lines: Vec<EncodedLine> = Vec::new();
        let (mut words, mut labels) = (Vec::new(), Vec::new());
        while consumed < share {
            consumed += dict.get_line(&mut reader, &mut words, &mut labels, &mut rng)? as i64;
            if consumed == 0 && reader.rewinds() > 1 {
                warn!("thread {} found no known token in the corpus", thread_i);
                break;
            }
            if words.is_empty() && labels.is_empty() {
                continue;
            }
            lines.push(EncodedLine { words: words.clone(), labels: labels.clone() });
        }

        if dict.args().verbose > 1 {
            info!("thread {} encoded {} lines", thread_i, lines.len());
        }
        Ok(serialize(&lines)?)
    }

    pub fn read_encoded(params: &JsonTypes) -> Result<Vec<Vec<EncodedLine>>, Box<dyn Error>> {
        let path = params.output_dir.to_string() + "/ids";
        let chunks = files_handling::read_input::<Vec<Vec<u8>>>(&path)?;
        let mut encoded = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            encoded.push(deserialize::<Vec<EncodedLine>>(&chunk)?);
        }
        Ok(encoded)
    }
}
