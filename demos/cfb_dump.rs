//! Command-line inspector for compound files.
//!
//! Prints the header geometry and the directory tree of a compound file, and
//! optionally extracts one stream.
//!
//! # Usage
//!
//! Show the tree:
//! ```sh
//! cargo run --example cfb_dump -- document.doc
//! ```
//!
//! Extract a stream (path components separated by `/`):
//! ```sh
//! cargo run --example cfb_dump -- document.doc --extract WordDocument -o word.bin
//! ```
//!
//! Set `RUST_LOG=debug` to see how the tables are built.

use cfbf_reader::ole::{DirectoryEntry, OleFile, OpenOptions, detect_format};
use clap::Parser;
use std::fs;
use std::io::{Read, Seek};
use std::path::PathBuf;

/// Inspect a Compound File Binary Format file
#[derive(Parser, Debug)]
#[command(name = "cfb_dump", about = "Inspect a Compound File Binary Format file", version)]
struct Args {
    /// Input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Stream to extract, e.g. "ObjectPool/_1234/Ole10Native"
    #[arg(short, long, value_name = "PATH")]
    extract: Option<String>,

    /// Where to write the extracted stream (stdout summary if omitted)
    #[arg(short, long, value_name = "OUTPUT", requires = "extract")]
    out: Option<PathBuf>,

    /// Reject nonzero high size words on 512-byte sector files
    #[arg(long)]
    strict: bool,

    /// Match entry names exactly
    #[arg(long)]
    case_sensitive: bool,
}

fn print_tree<R: Read + Seek>(ole: &OleFile<R>, entry: &DirectoryEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    if entry.is_stream() {
        let location = if entry.stream_size < u64::from(ole.header().mini_stream_cutoff) {
            "mini"
        } else {
            "fat"
        };
        println!(
            "{}{:?} ({} bytes, {} from sector {})",
            indent, entry.name, entry.stream_size, location, entry.start_sector
        );
    } else {
        let clsid = entry.clsid_string();
        if clsid.is_empty() {
            println!("{}{}/", indent, entry.name);
        } else {
            println!("{}{}/ {{{}}}", indent, entry.name, clsid);
        }
    }
    for child in entry.members() {
        print_tree(ole, child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let options = OpenOptions::new()
        .with_strict_stream_size(args.strict)
        .with_case_sensitive_names(args.case_sensitive);
    let ole = match OleFile::open_path_with_options(&args.input, options) {
        Ok(ole) => ole,
        Err(e) => {
            eprintln!("✗ {}: {} ({:?} error)", args.input.display(), e, e.category());
            std::process::exit(1);
        },
    };

    if let Some(path) = &args.extract {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let data = ole.open_stream(&components)?;
        match &args.out {
            Some(out) => {
                fs::write(out, &data)?;
                println!("✓ {} -> {} ({} bytes)", path, out.display(), data.len());
            },
            None => println!("{}: {} bytes", path, data.len()),
        }
        return Ok(());
    }

    let header = ole.header();
    println!("File:        {}", args.input.display());
    println!("Format:      {:?}", detect_format(&ole));
    println!("Version:     {}.{}", header.dll_version, header.minor_version);
    println!("Size:        {} bytes, {} sectors of {} bytes", header.file_size, header.sector_count, header.sector_size);
    println!("FAT:         {} entries", ole.fat().len());
    println!("MiniFAT:     {} entries", ole.mini_fat().len());
    println!();
    print_tree(&ole, ole.root(), 0);

    Ok(())
}
