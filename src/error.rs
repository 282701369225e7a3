use std::io;
use thiserror::Error;

// Errors surfaced by the dictionary. Unknown tokens are not errors, they go through
// the raw hash path of `get_line`.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Empty vocabulary. Try a smaller min_count value.")]
    EmptyVocabulary,
    #[error("Input file {path} cannot be opened: {source}")]
    CorpusUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Corrupt dictionary data: {0}")]
    Corrupt(String),
    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::Error),
}
