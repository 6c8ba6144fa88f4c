//! `bplist-unpack`: decode a binary property list (stdin) to JSON (stdout).
//!
//! Usage:
//!   bplist-unpack [--pretty] < doc.bplist

use std::io::{self, Read, Write};

use bplist::cli::{init_logging, unpack};

fn main() {
    init_logging();

    let pretty = std::env::args().skip(1).any(|arg| arg == "--pretty");

    let mut buf = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match unpack(&buf, pretty) {
        Ok(json) => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{json}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
