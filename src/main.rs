use std::process::ExitCode;

fn main() -> ExitCode {
    report_kit_lib::run()
}
