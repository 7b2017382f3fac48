fn main() {
    if let Err(err) = destination_explorer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
