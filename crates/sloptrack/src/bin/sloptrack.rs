fn main() {
    if let Err(err) = sloptrack::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
