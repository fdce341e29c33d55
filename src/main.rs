//! This is the main entry point for munin.

use munin::cli;

fn main() {
    if let Err(e) = cli::parse(None) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
