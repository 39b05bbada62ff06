//! Command line interface for the `lambda-aggregate` binary.
//!
//! The binary replays a single HTTP response through the aggregator and
//! prints the resulting invocation envelope. This module only depends on
//! `clap` so the build script can render the man page from it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Request source the replayed response answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// API Gateway proxy integration.
    #[default]
    ApiGateway,
    /// Application Load Balancer target.
    Alb,
}

/// Command line arguments for the `lambda-aggregate` binary.
#[derive(Debug, Parser)]
#[command(
    name = "lambda-aggregate",
    version,
    about = "Aggregate an HTTP response into a serverless invocation result"
)]
pub struct Cli {
    /// Status code of the response.
    #[arg(short, long, default_value_t = 200)]
    pub status: u16,

    /// Explicit reason phrase; defaults to the canonical phrase.
    #[arg(long)]
    pub reason: Option<String>,

    /// Response header as `NAME:VALUE`; may be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Shorthand for a `Content-Type` header.
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// File streamed as the response body.
    #[arg(short, long)]
    pub body: Option<PathBuf>,

    /// Inline body text, appended after `--body`.
    #[arg(long)]
    pub text: Option<String>,

    /// Request source deciding whether a status description is emitted.
    #[arg(long, value_enum, default_value_t)]
    pub source: Source,

    /// JSON aggregator configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop before the terminal fragment, simulating a dropped connection.
    #[arg(long)]
    pub truncate: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name missing in `{raw}`"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::{Cli, Source, parse_header};

    #[test]
    fn parses_defaults() {
        let cli = Cli::parse_from(["lambda-aggregate"]);
        assert_eq!(cli.status, 200);
        assert_eq!(cli.source, Source::ApiGateway);
        assert!(cli.headers.is_empty());
        assert!(!cli.truncate);
    }

    #[test]
    fn parses_repeated_headers_and_source() {
        let cli = Cli::parse_from([
            "lambda-aggregate",
            "--status",
            "404",
            "-H",
            "X-Test: a",
            "-H",
            "X-Test:b",
            "--source",
            "alb",
        ]);
        assert_eq!(cli.status, 404);
        assert_eq!(cli.source, Source::Alb);
        assert_eq!(
            cli.headers,
            [
                ("X-Test".to_owned(), "a".to_owned()),
                ("X-Test".to_owned(), "b".to_owned())
            ]
        );
    }

    #[rstest]
    #[case("no-colon")]
    #[case(": value")]
    fn rejects_malformed_headers(#[case] raw: &str) { assert!(parse_header(raw).is_err()); }
}
