use std::{error::Error, env, fs::File, io::{self, BufRead, BufReader, Write}, sync::Arc};
extern crate subword_dict;
use subword_dict::{Config, Dictionary, EntryType};


// this module has some checks on a saved dictionary: a dump of its entries, and the
// subword n-grams (with their ids) of a list of words.
// treated as binary executable so it can be ran independently from main

fn main() {

    // arguments to this executable should be:
    // a letter selector: "d" for dump, "n" for n-grams
    // path to the json config the dictionary was built with
    // path to the saved dictionary (bin)
    // for "n" only, path to a words file, one word per line
    // example: ... n args.json Output/dict.bin Input/words.txt
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 { panic!("input arguments should be a selector, a json config and a dictionary path"); }
    let selector = &args[1];

    let params = match Config::new(&[args[0].clone(), args[2].clone()]) {
        Ok(config) => config.get_params(),
        Err(e) => panic!("{}", e)
    };

    let dict = match load(&args[3], params.quantized, params.args) {
        Ok(dict) => dict,
        Err(e) => panic!("{}", e)
    };

    match selector.as_str() {
        "d" => {
            if let Err(e) = dump(&dict) {
                panic!("{}", e);
            }
        },
        "n" => {
            if args.len() != 5 { panic!("selector n expects a words file as last argument"); }
            let open_in_file = File::open(&args[4]).expect("could not open words file");
            let words = BufReader::new(open_in_file)
                .lines()
                .map(|line| line.expect("could not read line"))
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<String>>();

            print_ngrams(&dict, &words);
        },
        _ => panic!("unrecognized pattern in first argument {}", &args[1])
    }
}


fn load(path: &str, quantized: bool, args: subword_dict::Args) -> Result<Dictionary, Box<dyn Error>> {
    let mut input = BufReader::new(File::open(path)?);
    let mut dict = Dictionary::new(Arc::new(args));
    dict.load(&mut input, quantized)?;
    Ok(dict)
}

fn dump(dict: &Dictionary) -> io::Result<()> {

    // one entry per line, id, text, count and kind
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} entries, {} words, {} labels, {} tokens", dict.size(), dict.nwords(), dict.nlabels(), dict.ntokens())?;
    for (i, entry) in dict.entries().iter().enumerate() {
        let kind = match entry.entry_type {
            EntryType::Word => "word",
            EntryType::Label => "label"
        };
        writeln!(out, "{}\t{}\t{}\t{}", i, String::from_utf8_lossy(&entry.word), entry.count, kind)?;
    }
    if dict.is_quantized() {
        writeln!(out, "quantized with {} n-gram slots", dict.quantization_index().len())?;
    }
    Ok(())
}

fn print_ngrams(dict: &Dictionary, words: &[String]) {

    // unknown words show as -1 followed by their n-grams
    for word in words {
        let (ids, substrings) = dict.get_subwords_with_substrings(word.trim().as_bytes());
        println!("{}", word);
        for (id, substring) in ids.iter().zip(substrings.iter()) {
            println!("  {} {}", String::from_utf8_lossy(substring), id);
        }
    }
}
