use std::process::ExitCode;

fn main() -> ExitCode {
    callwatch_cli::run()
}
