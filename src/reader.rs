// imports
use std::io::{self, BufRead, Seek, SeekFrom};

pub const EOS: &str = "</s>";

fn is_separator(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c | 0)
}


pub struct TokenReader<R> {
    inner: R,
    eof: bool,
    rewinds: usize,
}

impl<R: BufRead> TokenReader<R> {

    pub fn new(inner: R) -> Self {
        Self {
            inner,
            eof: false,
            rewinds: 0
        }
    }

    // number of times the stream was rewound to its start by `read_line`
    pub fn rewinds(&self) -> usize {
        self.rewinds
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn at_end(&mut self) -> io::Result<bool> {
        let at_end = self.inner.fill_buf()?.is_empty();
        if at_end {
            self.eof = true;
        }
        Ok(at_end)
    }

    pub fn read_word(&mut self, word: &mut Vec<u8>) -> io::Result<bool> {

        // separators are collapsed, a newline closes the pending token and is left
        // unconsumed so the next call turns it into the EOS token.
        word.clear();
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                self.eof = true;
                return Ok(!word.is_empty());
            }

            let mut used = 0;
            let mut done = false;
            for &c in buf {
                if is_separator(c) {
                    if word.is_empty() {
                        used += 1;
                        if c == b'\n' {
                            word.extend_from_slice(EOS.as_bytes());
                            done = true;
                            break;
                        }
                        continue;
                    }
                    if c != b'\n' {
                        used += 1;
                    }
                    done = true;
                    break;
                }
                word.push(c);
                used += 1;
            }

            self.inner.consume(used);
            if done {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead + Seek> TokenReader<R> {

    pub fn read_line(&mut self, tokens: &mut Vec<Vec<u8>>, max_line: Option<usize>) -> io::Result<usize> {

        // an exhausted stream starts over, callers see an endless supply of lines
        if self.eof {
            self.inner.seek(SeekFrom::Start(0))?;
            self.eof = false;
            self.rewinds += 1;
        }

        tokens.clear();
        let mut token = Vec::new();
        while self.read_word(&mut token)? {
            let is_eos = token == EOS.as_bytes();
            tokens.push(token.clone());
            if is_eos {
                break;
            }
            if let Some(max_line) = max_line {
                if tokens.len() > max_line {
                    break;
                }
            }
        }
        Ok(tokens.len())
    }

    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.eof = false;
        Ok(())
    }
}
