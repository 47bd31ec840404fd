use std::io::{self, BufRead, Write};

/// Synchronous operator prompt/response channel. The pipeline's two
/// escalation points (unknown attendee, unresolved timezone) go through
/// this so tests can script the replies.
pub trait Operator {
    fn prompt(&mut self, message: &str) -> String;
}

/// Line-based stdin/stdout operator.
pub struct Console;

impl Operator for Console {
    fn prompt(&mut self, message: &str) -> String {
        println!("{message}");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_string()
    }
}
