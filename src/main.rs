//! pipeforge CLI binary
//!
//! All logic lives in the library; main only maps the result to a process exit.

fn main() {
    if let Err(code) = pipeforge::cli::run() {
        std::process::exit(code.as_i32());
    }
}
