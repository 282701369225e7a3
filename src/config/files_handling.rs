// imports
use ndarray::Array1;
use ndarray_npy::{ReadNpyError, read_npy, write_npy};
use std::{fs::{self, File}, error::Error, collections::HashMap, io::{BufWriter, BufReader}};
use std::io::prelude::*;
use std::path::Path;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use crate::dictionary::Dictionary;
use crate::error::DictionaryError;


pub fn read_input<R: ReadFile>(file_path: &str) -> Result<<R as ReadFile>::Item, <R as ReadFile>::Error> {
    let input = <R as ReadFile>::read_file(file_path)?;
    Ok(input)
}

pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> Result<(), Box<dyn Error>> {

    // create output folder
    fs::create_dir_all(output_dir)?;
    item.save_file(output_dir, file_name).map_err(|e| e.into())
}

pub trait ReadFile {
    type Error;
    type Item;
    fn read_file(file_path: &str) -> Result<Self::Item, Self::Error>;
}

pub trait SaveFile {
    type Error: Into<Box<dyn Error>>;
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error>;
}


// word -> id map, json text
impl ReadFile for HashMap<String, usize> {
    type Error = std::io::Error;
    type Item = Self;
    fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {
        let in_file = file_path.to_string() + ".txt";
        let f = BufReader::new(File::open(in_file)?);
        let item = serde_json::from_reader(f)?;
        Ok(item)
    }
}

impl SaveFile for HashMap<String, usize> {
    type Error = std::io::Error;
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error> {
        let out = output_dir.to_string() + "/" + file_name + ".txt";
        let f = BufWriter::new(File::create(out)?);
        serde_json::to_writer(f, self)?;
        Ok(())
    }
}

// id lists, json array
impl ReadFile for Vec<i32> {
    type Error = std::io::Error;
    type Item = Self;
    fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {
        let in_file = file_path.to_string() + ".json";
        let f = BufReader::new(File::open(in_file)?);
        let item = serde_json::from_reader(f)?;
        Ok(item)
    }
}

impl SaveFile for Vec<i32> {
    type Error = std::io::Error;
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error> {
        let out = output_dir.to_string() + "/" + file_name + ".json";
        let f = BufWriter::new(File::create(out)?);
        serde_json::to_writer(f, self)?;
        Ok(())
    }
}

// counts per id
impl ReadFile for Array1<i64> {
    type Error = ReadNpyError;
    type Item = Self;
    fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {
        let in_file = file_path.to_string() + ".npy";
        let item = read_npy(in_file)?;
        Ok(item)
    }
}

impl SaveFile for Array1<i64> {
    type Error = Box<dyn Error>;
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error> {
        let out = output_dir.to_string() + "/" + file_name + ".npy";
        write_npy(out, self)?;
        Ok(())
    }
}

impl SaveFile for Dictionary {
    type Error = DictionaryError;
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error> {
        let out = output_dir.to_string() + "/" + file_name + ".bin";
        let mut f = BufWriter::new(File::create(out)?);
        self.save(&mut f)?;
        f.flush()?;
        Ok(())
    }
}

// Serialized chunks, one gzip file per chunk: `<file_name><i>.gz`.
impl SaveFile for Vec<Vec<u8>> {
    type Error = Box<dyn Error>;

    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Self::Error> {

        for (i, buf) in self.iter().enumerate() {

            let out = output_dir.to_string() + "/" + file_name + &format!("{}.gz", i);
            let f = BufWriter::new(File::create(out)?);
            let mut writer = GzEncoder::new(f, Compression::default());
            writer.write_all(buf)?;
            writer.finish()?.flush()?;
        }

        Ok(())
    }
}

impl ReadFile for Vec<Vec<u8>> {
    type Error = Box<dyn Error>;
    type Item = Self;
    fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {

        // `file_path` is `<dir>/<file_name>`, every `<file_name><i>.gz` in dir is read back in index order
        let path = Path::new(file_path);
        let main_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new(".")
        };
        let prefix = path.file_name().and_then(|s| s.to_str()).ok_or("invalid chunk path")?;

        let mut indexed: Vec<(usize, std::path::PathBuf)> = Vec::new();
        for entry in fs::read_dir(main_dir)? {
            let entry_path = entry?.path();
            let name = match entry_path.file_name().and_then(|s| s.to_str()) {
                Some(name) => name,
                None => continue
            };
            let index = name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".gz"))
                .and_then(|i| i.parse::<usize>().ok());
            if let Some(index) = index {
                indexed.push((index, entry_path));
            }
        }
        indexed.sort_by_key(|(i, _)| *i);

        let mut items: Vec<Vec<u8>> = Vec::new();
        for (_, chunk_path) in indexed {
            let f = BufReader::new(File::open(chunk_path)?);
            let mut reader = GzDecoder::new(f);
            let mut buf: Vec<u8> = Vec::new();
            reader.read_to_end(&mut buf)?;
            items.push(buf);
        }

        Ok(items)
    }
}
