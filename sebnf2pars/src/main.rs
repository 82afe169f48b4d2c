mod classgen;
mod emit;
mod lexgen;
mod yaccgen;

use std::{env, fs, path::Path, process};

use ebnfgrammar::ebnf::{EbnfGrammar, EbnfGrammarError};
use getopts::Options;

use crate::{classgen::ClassEmitter, lexgen::LexEmitter, yaccgen::YaccEmitter};

fn usage(prog: &str, msg: &str) -> ! {
    let path = Path::new(prog);
    let leaf = match path.file_name() {
        Some(m) => m.to_str().unwrap(),
        None => "sebnf2pars",
    };
    if !msg.is_empty() {
        eprintln!("{}", msg);
    }
    eprintln!("Usage: {} <base file name>", leaf);
    eprintln!("Reads <base>.ebnf; writes <base>classes.hh, <base>classes.cc, <base>.y, <base>.lex");
    process::exit(1);
}

fn read_file<P: AsRef<Path>>(path: P) -> String {
    match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("unable to open file {} for reading: {}", path.as_ref().display(), e);
            process::exit(1);
        }
    }
}

fn write_file<P: AsRef<Path>>(path: P, contents: &str) {
    if let Err(e) = fs::write(&path, contents) {
        eprintln!("Unable to open file {} for writing: {}", path.as_ref().display(), e);
        process::exit(1);
    }
}

// Parse errors carry spans; the grammar format is line oriented, so report
// the line. Analysis errors name productions instead and have no span.
fn report_err(src: &str, e: EbnfGrammarError) -> ! {
    match e.spans().next() {
        Some(span) => eprintln!("{} (line {})", e, span.line_of(src)),
        None => eprintln!("{}", e),
    }
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new().optflag("h", "help", "").parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => usage(prog, f.to_string().as_str()),
    };
    if matches.opt_present("h") || matches.free.len() != 1 {
        usage(prog, "");
    }
    let base = &matches.free[0];
    // Class and file-local names are built from the last path component;
    // output files land next to the input.
    let leaf = match Path::new(base).file_name() {
        Some(m) => m.to_str().unwrap().to_string(),
        None => usage(prog, "bad base file name"),
    };

    let src = read_file(format!("{}.ebnf", base));
    let mut grm = match EbnfGrammar::new(&src) {
        Ok(grm) => grm,
        Err(e) => report_err(&src, e),
    };
    let order = match grm.emit_order() {
        Ok(order) => order,
        Err(e) => report_err(&src, e),
    };

    let (hh, cc) = ClassEmitter::new(&grm, &leaf).emit(&order);
    write_file(format!("{}classes.hh", base), &hh);
    write_file(format!("{}classes.cc", base), &cc);
    write_file(format!("{}.y", base), &YaccEmitter::new(&grm, &leaf).emit());
    write_file(format!("{}.lex", base), &LexEmitter::new(&grm, &leaf).emit());
}
