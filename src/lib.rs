mod config;
mod dictionary;
mod error;
mod hash;
mod ngrams;
mod persist;
mod pipeline;
mod quantize;
mod reader;

pub use config::{files_handling, Args, Config, JsonTypes};
pub use dictionary::{Dictionary, Entry, EntryType, MAX_LINE_SIZE, MAX_VOCAB_SIZE};
pub use error::DictionaryError;
pub use hash::hash;
pub use ngrams::NgramExtractor;
pub use pipeline::{EncodedLine, Pipeline};
pub use reader::{TokenReader, EOS};
