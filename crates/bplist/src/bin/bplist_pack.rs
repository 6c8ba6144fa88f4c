//! `bplist-pack`: encode JSON (stdin) to a binary property list (stdout).
//!
//! Usage:
//!   bplist-pack < doc.json > doc.bplist

use std::io::{self, Read, Write};

use bplist::cli::{init_logging, pack};

fn main() {
    init_logging();

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match pack(buf.trim()) {
        Ok(bytes) => {
            if let Err(e) = io::stdout().write_all(&bytes) {
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
