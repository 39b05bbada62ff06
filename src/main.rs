//! Replay one HTTP response through `lambda_aggregator`.
//!
//! Parses CLI arguments, streams the described response through a
//! [`ResponseAggregator`] and prints the invocation envelope as JSON.

mod cli;

use std::{error::Error, io, process::ExitCode, sync::Arc};

use bytes::Bytes;
use clap::Parser;
use futures::stream;
use http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE};
use lambda_aggregator::{
    AggregatedResponse,
    AggregatorConfig,
    FileBackedRegion,
    Fragment,
    RequestSource,
    ResponseAggregator,
    StatusFragment,
    aggregate,
};

fn request_source(source: cli::Source) -> RequestSource {
    match source {
        cli::Source::ApiGateway => RequestSource::ApiGateway,
        cli::Source::Alb => RequestSource::Alb,
    }
}

fn status_fragment(cli: &cli::Cli) -> Result<StatusFragment, Box<dyn Error>> {
    let mut status = StatusFragment::new(StatusCode::from_u16(cli.status)?);
    if let Some(reason) = &cli.reason {
        status = status.with_reason(reason.clone());
    }
    for (name, value) in &cli.headers {
        status = status.with_header(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
    }
    if let Some(content_type) = &cli.content_type {
        status = status.with_header(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
    }
    Ok(status)
}

fn fragments(cli: &cli::Cli) -> Result<Vec<io::Result<Fragment>>, Box<dyn Error>> {
    let mut fragments = vec![Ok(Fragment::Status(status_fragment(cli)?))];
    if let Some(path) = &cli.body {
        let region = FileBackedRegion::open(path)?;
        fragments.push(Ok(Fragment::FileRegion(Box::new(region))));
    }
    if let Some(text) = &cli.text {
        fragments.push(Ok(Fragment::BodyChunk(Bytes::from(text.clone()))));
    }
    if !cli.truncate {
        fragments.push(Ok(Fragment::Terminal));
    }
    Ok(fragments)
}

async fn run(cli: cli::Cli) -> Result<AggregatedResponse, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => AggregatorConfig::load(path)?,
        None => AggregatorConfig::default(),
    };
    let aggregator = ResponseAggregator::new(&request_source(cli.source), Arc::new(config));
    let fragments = fragments(&cli)?;
    Ok(aggregate(aggregator, stream::iter(fragments)).await?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Enable structured logging for the binary.
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let response = match run(cli).await {
        Ok(response) => response,
        Err(error) => {
            eprintln!("lambda-aggregate: {error}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("lambda-aggregate: {error}");
            ExitCode::FAILURE
        }
    }
}
