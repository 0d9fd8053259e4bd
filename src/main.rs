// ABOUTME: Entry point for the unified orchestrator command-line tool.
// ABOUTME: Delegates to the library run function and reports errors on stderr.

fn main() {
    if let Err(err) = unified_orchestrator_lib::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
