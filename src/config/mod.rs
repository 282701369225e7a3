pub mod files_handling;

use serde_json::Value;
use std::{fs, error::Error, fmt::Display};

// Knobs read by the dictionary. Shared read-only behind an `Arc` once built.
#[derive(Clone, Debug)]
pub struct Args {
    pub input: String,
    pub label: String,
    pub min_count: i64,
    pub min_count_label: i64,
    pub minn: usize,
    pub maxn: usize,
    pub bucket: u32,
    pub t: f64,
    pub word_ngrams: usize,
    pub supervised: bool,
    pub verbose: u8,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input: String::new(),
            label: "__label__".to_string(),
            min_count: 5,
            min_count_label: 0,
            minn: 3,
            maxn: 6,
            bucket: 2000000,
            t: 1e-4,
            word_ngrams: 1,
            supervised: false,
            verbose: 2,
        }
    }
}

impl Args {

    // classification defaults: every word kept, no character n-grams
    pub fn supervised() -> Self {
        Self {
            min_count: 1,
            minn: 0,
            maxn: 0,
            supervised: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.maxn > 0 && self.minn > self.maxn {
            return Err(format!("minn ({}) cannot exceed maxn ({})", self.minn, self.maxn).into());
        }
        if self.bucket > i32::MAX as u32 {
            return Err(format!("bucket {} exceeds {}", self.bucket, i32::MAX).into());
        }
        if self.bucket == 0 && (self.maxn > 0 || self.word_ngrams > 1) {
            return Err("bucket must be positive when n-gram features are enabled".into());
        }
        if self.min_count < 1 {
            return Err(format!("min_count {} is not valid", self.min_count).into());
        }
        Ok(())
    }
}

impl Display for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dictionary parameters:
        input: {},
        label: {},
        min_count: {},
        min_count_label: {},
        minn: {},
        maxn: {},
        bucket: {},
        t: {},
        word_ngrams: {},
        supervised: {},
        verbose: {}",
        self.input, self.label, self.min_count, self.min_count_label, self.minn, self.maxn,
        self.bucket, self.t, self.word_ngrams, self.supervised, self.verbose
        )
    }
}


#[derive(Clone, Debug)]
pub struct JsonTypes {
    pub corpus_file: String,
    pub output_dir: String,
    pub saved_dict: Option<bool>,
    pub quantized: bool,
    pub prune_ids: Option<String>,
    pub num_threads: usize,
    pub seed: u64,
    pub args: Args
}

impl Display for JsonTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        corpus_file: {}
        output_dir: {}
        saved_dict: {:?}
        quantized: {}
        prune_ids: {:?}
        num_threads: {}
        seed: {},
        Using {}",
        self.corpus_file, self.output_dir, self.saved_dict, self.quantized, self.prune_ids,
        self.num_threads, self.seed, self.args)
    }
}


fn get_str<'a>(json: &'a Value, key: &str) -> Result<Option<&'a str>, Box<dyn Error>> {
    match json.get(key) {
        Some(value) => match value.as_str() {
            Some(s) => Ok(Some(s)),
            None => Err(format!("given {} is not a string", key).into())
        },
        None => Ok(None)
    }
}

fn get_i64(json: &Value, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
    match json.get(key) {
        Some(value) => value.as_i64().ok_or_else(|| format!("given {} is not numeric", key).into()),
        None => Ok(default)
    }
}

fn get_usize(json: &Value, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
    let value = get_i64(json, key, default as i64)?;
    usize::try_from(value).map_err(|_| format!("given {} cannot be negative", key).into())
}

fn get_f64(json: &Value, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
    match json.get(key) {
        Some(value) => value.as_f64().ok_or_else(|| format!("given {} is not numeric", key).into()),
        None => Ok(default)
    }
}

fn get_bool(json: &Value, key: &str) -> Result<Option<bool>, Box<dyn Error>> {
    match json.get(key) {
        Some(value) => match value.as_bool() {
            Some(b) => Ok(Some(b)),
            None => Err(format!("given {} is not boolean", key).into())
        },
        None => Ok(None)
    }
}


pub struct Config {
    params: JsonTypes
}

impl Config {

    pub fn get_params(&self) -> JsonTypes {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config, Box<dyn Error>> {

        if args.len() != 2 {
            return Err("input should be a path to json file only".into());
        }

        let f = fs::File::open(&args[1])?;
        let json: Value = serde_json::from_reader(f)?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config, Box<dyn Error>> {

        // validate input and output in json
        let corpus_file = get_str(json, "corpus_file")?.ok_or("corpus_file was not supplied through json")?;
        let output_dir = get_str(json, "output_dir")?.ok_or("output_dir was not supplied through json")?;

        // the mode decides the defaults of the remaining knobs
        let supervised = get_bool(json, "supervised")?.unwrap_or(false);
        let defaults = if supervised { Args::supervised() } else { Args::default() };

        let bucket = get_i64(json, "bucket", defaults.bucket as i64)?;
        let verbose = get_i64(json, "verbose", defaults.verbose as i64)?;
        let args = Args {
            input: corpus_file.to_owned(),
            label: get_str(json, "label")?.unwrap_or(defaults.label.as_str()).to_owned(),
            min_count: get_i64(json, "min_count", defaults.min_count)?,
            min_count_label: get_i64(json, "min_count_label", defaults.min_count_label)?,
            minn: get_usize(json, "minn", defaults.minn)?,
            maxn: get_usize(json, "maxn", defaults.maxn)?,
            bucket: u32::try_from(bucket).map_err(|_| format!("bucket {} is out of range", bucket))?,
            t: get_f64(json, "t", defaults.t)?,
            word_ngrams: get_usize(json, "word_ngrams", defaults.word_ngrams)?,
            supervised,
            verbose: verbose.clamp(0, u8::MAX as i64) as u8,
        };
        args.validate()?;

        let num_threads = get_usize(json, "num_threads", 4)?;
        if num_threads == 0 {
            return Err("num_threads must be at least 1".into());
        }

        let params = JsonTypes {
            corpus_file: corpus_file.to_owned(),
            output_dir: output_dir.to_owned(),
            saved_dict: get_bool(json, "saved_dict")?,
            quantized: get_bool(json, "quantized")?.unwrap_or(false),
            prune_ids: get_str(json, "prune_ids")?.map(|s| s.to_owned()),
            num_threads,
            seed: get_i64(json, "seed", 0)? as u64,
            args
        };

        Ok(Self { params })
    }
}
