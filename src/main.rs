fn main() {
    env_logger::init();

    if let Err(e) = pipecrm::cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
