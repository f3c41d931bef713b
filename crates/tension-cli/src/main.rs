#![forbid(unsafe_code)]

fn main() -> std::process::ExitCode {
    tension_cli::main_entry()
}
