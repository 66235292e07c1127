#[macro_use]
extern crate clap;

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use clap::Arg;
use vm16asm::{assemble, output, DiskFs};

#[derive(Debug)]
enum Error {
    Asm(vm16asm::Error),
    Io(PathBuf, std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Asm(err) => write!(f, "{}", err),
            Error::Io(path, err) => {
                write!(f, "Error: Writing '{}' failed: {}", path.display(), err)
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Root assembly source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("com")
                .long("com")
                .help("Write a COM image instead of H16"),
        )
        .arg(
            Arg::with_name("lst")
                .long("lst")
                .help("Write a listing file"),
        )
        .arg(
            Arg::with_name("tbl")
                .long("tbl")
                .help("Write a constant-table file"),
        )
        .arg(
            Arg::with_name("bin")
                .long("bin")
                .help("Write a plain hex-word file"),
        )
        .arg(
            Arg::with_name("sym")
                .long("sym")
                .help("Print the symbol table"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    if let Err(err) = run(input, &matches) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(input: &str, matches: &clap::ArgMatches) -> Result<(), Error> {
    println!("VM16 assembler v{}", crate_version!());
    println!(" - read {}...", input);

    let path = Path::new(input);
    let assembly = assemble(&DiskFs, path).map_err(Error::Asm)?;
    for warning in &assembly.warnings {
        println!("{}", warning);
    }

    if matches.is_present("lst") {
        write_text(&path.with_extension("lst"), &output::listing(&assembly.tokens))?;
    }

    let image = &assembly.image;
    let size = if matches.is_present("com") {
        let words = output::com_words(image).map_err(Error::Asm)?;
        let out = path.with_extension("com");
        println!(" - write {}...", out.display());
        let file = File::create(&out).map_err(|err| Error::Io(out.clone(), err))?;
        let mut writer = BufWriter::new(file);
        output::write_com(&mut writer, &words).map_err(|err| Error::Io(out, err))?;
        words.len()
    } else {
        write_text(&path.with_extension("h16"), &output::h16_text(image))?;
        image.word_count()
    };

    if matches.is_present("tbl") {
        write_text(&path.with_extension("tbl"), &output::tbl_text(image))?;
    }
    if matches.is_present("bin") {
        write_text(&path.with_extension("bin"), &output::bin_text(image))?;
    }
    if matches.is_present("sym") {
        println!();
        println!("Symbol table:");
        println!("{}", output::symbol_table(&assembly.symbols));
    }

    println!();
    println!("Code start address: ${:04X}", image.start);
    println!("Last used address:  ${:04X}", image.last);
    println!("Code size: ${:04X}/{} words", size, size);
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), Error> {
    println!(" - write {}...", path.display());
    std::fs::write(path, text).map_err(|err| Error::Io(path.to_path_buf(), err))
}
