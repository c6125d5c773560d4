//! Talking to the GitHub Actions runner: workflow commands on stdout and the
//! `GITHUB_OUTPUT` file.

use anyhow::Context;
use std::io::Write;

pub trait OutputSink {
    fn set_output(&mut self, key: &str, value: &str) -> Result<(), anyhow::Error>;
}

#[derive(Debug)]
pub enum Outputs {
    /// append `key=value` lines to the runner's output file
    File(std::path::PathBuf),
    /// legacy `::set-output` workflow command
    Command,
}

impl Outputs {
    pub fn new(path: Option<std::path::PathBuf>) -> Self {
        match path {
            Some(path) => Outputs::File(path),
            None => Outputs::Command,
        }
    }
}

impl OutputSink for Outputs {
    fn set_output(&mut self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if key.contains(&['\r', '\n'][..]) || value.contains(&['\r', '\n'][..]) {
            return Err(anyhow::anyhow!("output {:?} must be a single line", key));
        }

        match self {
            Outputs::File(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path.as_path())
                    .with_context(|| format!("can't open output file {}", path.display()))?;
                writeln!(file, "{}={}", key, value)
                    .with_context(|| format!("can't write output {}", key))?;
            }
            Outputs::Command => {
                println!(
                    "::set-output name={}::{}",
                    escape_property(key),
                    escape_data(value)
                );
            }
        }

        Ok(())
    }
}

pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Environment variable the runner passes an action input in.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn format_record(level: log::Level, message: &str) -> String {
    match level {
        log::Level::Error => format!("::error::{}", escape_data(message)),
        log::Level::Warn => format!("::warning::{}", escape_data(message)),
        log::Level::Info => message.to_string(),
        log::Level::Debug | log::Level::Trace => format!("::debug::{}", escape_data(message)),
    }
}

pub fn init_logger() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,review_tally=debug"),
    )
    .target(env_logger::Target::Stdout)
    .format(|buf, record| {
        writeln!(
            buf,
            "{}",
            format_record(record.level(), &record.args().to_string())
        )
    })
    .init();
}

/// Report the error to the runner and end the step as failed.
pub fn set_failed(err: &anyhow::Error) -> ! {
    println!("{}", format_record(log::Level::Error, &format!("{:#}", err)));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(escape_data("50% done\r\nnext"), "50%25 done%0D%0Anext");
        assert_eq!(escape_property("a:b,c%"), "a%3Ab%2Cc%25");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn records() {
        assert_eq!(
            format_record(log::Level::Debug, "  approved: 1"),
            "::debug::  approved: 1"
        );
        assert_eq!(
            format_record(log::Level::Info, "Found Review from alice they APPROVED"),
            "Found Review from alice they APPROVED"
        );
        assert_eq!(
            format_record(log::Level::Error, "Failed to extract pull request data."),
            "::error::Failed to extract pull request data."
        );
        assert_eq!(
            format_record(log::Level::Warn, "two\nlines"),
            "::warning::two%0Alines"
        );
    }

    #[test]
    fn input_names() {
        assert_eq!(input_var("repo-token"), "INPUT_REPO-TOKEN");
        assert_eq!(input_var("my input"), "INPUT_MY_INPUT");
    }

    #[test]
    fn output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "earlier=step\n").unwrap();

        let mut outputs = Outputs::new(Some(path.clone()));
        outputs.set_output("approved", "2").unwrap();
        outputs.set_output("valid_reviews", "3").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=step\napproved=2\nvalid_reviews=3\n"
        );
    }

    #[test]
    fn output_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");

        Outputs::new(Some(path.clone()))
            .set_output("pending", "0")
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "pending=0\n");
    }

    #[test]
    fn multiline_output_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");

        let mut outputs = Outputs::new(Some(path.clone()));
        assert!(outputs.set_output("approved", "1\nvalid_reviews=9").is_err());
        assert!(!path.exists());
    }
}
