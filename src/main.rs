fn main() {
    if let Err(err) = csv_colmatch::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
