fn main() {
    if let Err(err) = line_recon::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
