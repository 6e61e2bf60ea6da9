//! Line-based interactive input.

use std::io::{BufRead, Write};

use obsimg_core::{InputProvider, ResolveError};

/// Reads one entry per line until an empty line or end of input.
#[derive(Debug)]
pub struct LineInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LineInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl LineInput<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so stdout stays clean for results.
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> InputProvider for LineInput<R, W> {
    fn read_entries(&mut self, prompt: &str) -> Result<Vec<String>, ResolveError> {
        writeln!(self.writer, "{prompt}")?;

        let mut entries = Vec::new();
        loop {
            write!(self.writer, "> ")?;
            self.writer.flush()?;

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            entries.push(line.to_string());
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsimg_core::input::collect_conditions;

    #[test]
    fn stops_at_blank_line() {
        let mut out = Vec::new();
        let mut input = LineInput::new("bash>=5\n  kernel-default \n\nignored\n".as_bytes(), &mut out);

        let entries = input.read_entries("Conditions").unwrap();
        assert_eq!(entries, vec!["bash>=5", "kernel-default"]);
        assert!(String::from_utf8_lossy(&out).starts_with("Conditions\n> "));
    }

    #[test]
    fn stops_at_eof_and_feeds_condition_parser() {
        let mut input = LineInput::new(r#"{"image": "15.6.0"}"#.as_bytes(), Vec::new());
        let conditions = collect_conditions(&mut input).unwrap();
        assert_eq!(conditions, vec![obsimg_schema::Condition::image("15.6.0")]);
    }
}
