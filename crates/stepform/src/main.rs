fn main() {
    if let Err(err) = stepform::cli::main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
