// Main entry point that forwards to the bar-forge library
fn main() {
    // Exit with the same code as the app
    std::process::exit(match bar_forge::main() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    });
}
