use household_budget::{cli::run_cli, init};

fn main() {
    init();

    if let Err(err) = run_cli() {
        household_budget::cli::output::error(format!("Error: {err}"));
        std::process::exit(1);
    }
}
