use std::process;

fn main() {
    if let Err(e) = stratus::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
