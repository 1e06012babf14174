use std::{env, fs, io, path::Path};

use recorz::bytecode::compile_error::CompileError;
use recorz::bytecode::disasm::print_bc;
use recorz::bytecode::image::Image;
use recorz::config::Limits;
use recorz::frontend::token_dumper::TokenDumper;
use recorz::pipeline::{self, RunError};
use recorz::runtime::fault::Fault;
use recorz::runtime::sink::IoSink;

/// Flags that take the next argument as their value.
const VALUE_FLAGS: [&str; 4] = ["--emit", "--image", "--stack", "--heap"];

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let tokens_only = args.contains(&"--tokens".to_string());
    let no_color = args.contains(&"--no-color".to_string());
    let pretty = args.contains(&"--pretty".to_string());
    let bytecode = args.contains(&"--bc".to_string()) || args.contains(&"--bytecode".to_string());
    let emit = flag_value(&args, "--emit");
    let image = flag_value(&args, "--image");

    let mut limits = Limits::default();
    if let Some(n) = flag_value(&args, "--stack") {
        limits.stack_max = parse_number("--stack", n);
    }
    if let Some(n) = flag_value(&args, "--heap") {
        limits.heap.size = parse_number("--heap", n);
    }

    if let Some(path) = image {
        run_image_file(path);
        return;
    }

    match source_file(&args) {
        Some(filename) => {
            ensure_extension(filename);
            match fs::read_to_string(filename) {
                Ok(source) => {
                    if tokens_only {
                        dump_tokens(&source, no_color, pretty);
                    } else if let Some(out) = emit {
                        emit_image(&source, out, &limits);
                    } else {
                        run_source(&source, bytecode, &limits);
                    }
                }
                Err(e) => {
                    eprintln!("Failed to read '{}': {}", filename, e);
                    std::process::exit(1);
                }
            }
        }
        None => print_usage(),
    }
}

/// First argument that is neither a flag nor a flag's value.
fn source_file(args: &[String]) -> Option<&String> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    let pos = args.iter().position(|a| a == flag)?;
    match args.get(pos + 1) {
        Some(value) => Some(value),
        None => {
            eprintln!("Error: {} needs a value", flag);
            std::process::exit(1);
        }
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> T {
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: {} expects a number, got '{}'", flag, value);
            std::process::exit(1);
        }
    }
}

fn ensure_extension(filename: &str) {
    let path = Path::new(filename);
    if path.extension().and_then(|e| e.to_str()) != Some("st") {
        eprintln!("Error: expected a .st file, got {}", filename);
        std::process::exit(1);
    }
}

fn dump_tokens(source: &str, no_color: bool, pretty: bool) {
    let mut dumper = TokenDumper::new();

    if no_color {
        dumper = dumper.no_color();
    }
    if pretty {
        dumper = dumper.pretty();
    }

    dumper.dump(source);
}

fn print_usage() {
    println!("RECORZ - a tiny message-passing language");
    println!();
    println!("Usage:");
    println!("  recorz <file.st>                 Compile and run a program");
    println!("  recorz --tokens <file.st>        Show tokens only");
    println!("  recorz --bc <file.st>            Show bytecode, then run");
    println!("  recorz --emit <out> <file.st>    Compile to an image file");
    println!("  recorz --image <file>            Verify and run an image");
    println!("  recorz --stack <n> <file.st>     Operand stack depth (default 256)");
    println!("  recorz --heap <bytes> <file.st>  Heap size (default 1 MiB)");
    println!("  recorz --help, -h                Show this help");
    println!();
    println!("Set RUST_LOG=debug to trace the compiler and VM.");
}

fn compile_or_exit(source: &str, limits: &Limits) -> recorz::bytecode::Program {
    match pipeline::compile(source, limits) {
        Ok(program) => program,
        Err(e) => report_and_exit(e),
    }
}

fn run_source(source: &str, bytecode: bool, limits: &Limits) {
    let program = compile_or_exit(source, limits);

    if bytecode {
        print_bc(&program);
    }

    let mut sink = IoSink::new(io::stdout().lock());
    let result = pipeline::run_program(&program, &mut sink, limits);
    finish_output(sink);
    if let Err(fault) = result {
        report_fault(&fault);
    }
}

fn emit_image(source: &str, out: &str, limits: &Limits) {
    let program = compile_or_exit(source, limits);
    let bytes = match Image::from_program(&program, limits).to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = fs::write(out, &bytes) {
        eprintln!("Failed to write '{}': {}", out, e);
        std::process::exit(1);
    }
    log::info!("wrote {} ({} bytes)", out, bytes.len());
}

fn run_image_file(path: &str) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", path, e);
            std::process::exit(1);
        }
    };
    let image = match Image::from_bytes(&bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut sink = IoSink::new(io::stdout().lock());
    let result = pipeline::run_image(image, &mut sink);
    finish_output(sink);
    if let Err(e) = result {
        report_and_exit(e);
    }
}

fn finish_output<W: io::Write>(sink: IoSink<W>) {
    if let Err(e) = sink.finish() {
        eprintln!("Error: writing output failed: {}", e);
        std::process::exit(1);
    }
}

fn report_and_exit(error: RunError) -> ! {
    match error {
        RunError::Compile(e) => report_compile_error(&e),
        RunError::Fault(f) => report_fault(&f),
        RunError::Check(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn report_compile_error(error: &CompileError) -> ! {
    eprintln!("Error: {}", error);
    eprintln!("Compilation failed.");
    std::process::exit(1);
}

fn report_fault(fault: &Fault) -> ! {
    eprintln!("FATAL: {}", fault);
    std::process::exit(1);
}
