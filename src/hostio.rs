//! The injectable host-io capability: every observable effect the evaluator
//! can have on the outside world (console output, input, screen clearing,
//! process termination) goes through this trait, so tests can swap in an
//! in-memory double instead of real process streams.

use std::io::{self, BufRead, Write};
use std::process;

pub trait HostIo {
    fn print_line(&mut self, text: &str);
    fn read_token(&mut self) -> String;
    fn read_line(&mut self) -> String;
    fn clear_screen(&mut self);
    fn terminate(&mut self, code: i32) -> !;
}

/// Binds `HostIo` to the real process: stdin/stdout and `process::exit`.
pub struct StdHostIo {
    stdin: io::Stdin,
}

impl Default for StdHostIo {
    fn default() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl HostIo for StdHostIo {
    fn print_line(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_token(&mut self) -> String {
        let mut token = String::new();
        let mut lock = self.stdin.lock();
        let mut byte = [0u8; 1];
        // Skip leading whitespace, then collect non-whitespace bytes, the
        // way `std::cin >> token` does.
        loop {
            match io::Read::read(&mut lock, &mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0].is_ascii_whitespace() => {
                    if !token.is_empty() {
                        break;
                    }
                }
                Ok(_) => token.push(byte[0] as char),
                Err(_) => break,
            }
        }
        token
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        let _ = self.stdin.lock().read_line(&mut line);
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    fn clear_screen(&mut self) {
        print!("\x1B[2J\x1B[H");
        let _ = io::stdout().flush();
    }

    fn terminate(&mut self, code: i32) -> ! {
        process::exit(code);
    }
}

/// An in-memory `HostIo` for tests: `print_line` appends to an output
/// buffer, `read_token`/`read_line` consume from a pre-seeded input queue.
#[derive(Debug, Default)]
pub struct BufferHostIo {
    pub output: String,
    input: Vec<String>,
    cleared: usize,
    terminated: Option<i32>,
}

impl BufferHostIo {
    pub fn with_input(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut input: Vec<String> = lines.into_iter().map(Into::into).collect();
        input.reverse();
        Self {
            output: String::new(),
            input,
            cleared: 0,
            terminated: None,
        }
    }

    pub fn clear_count(&self) -> usize {
        self.cleared
    }

    pub fn terminated_with(&self) -> Option<i32> {
        self.terminated
    }
}

impl HostIo for BufferHostIo {
    fn print_line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn read_token(&mut self) -> String {
        self.input
            .pop()
            .map(|line| line.split_whitespace().next().unwrap_or("").to_string())
            .unwrap_or_default()
    }

    fn read_line(&mut self) -> String {
        self.input.pop().unwrap_or_default()
    }

    fn clear_screen(&mut self) {
        self.cleared += 1;
    }

    fn terminate(&mut self, code: i32) -> ! {
        self.terminated = Some(code);
        panic!("pseudo program called quit({code}) under a BufferHostIo");
    }
}
