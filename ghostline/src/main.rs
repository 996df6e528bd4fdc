use std::process::ExitCode;

fn main() -> ExitCode {
    ghostline::lib_main()
}
