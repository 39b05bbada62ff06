//! Serialised invocation envelopes for aggregated responses.

use std::sync::Arc;

use lambda_aggregator::{AggregatorConfig, Fragment, RequestSource, ResponseAggregator, StatusFragment};
use lambda_aggregator_testing::{binary_status, chunk, response_expect, text_status};
use rstest::rstest;
use serde_json::{Value, json};

async fn envelope(source: RequestSource, fragments: Vec<Fragment>) -> Value {
    let mut aggregator = ResponseAggregator::new(&source, Arc::new(AggregatorConfig::default()));
    for fragment in fragments {
        aggregator.consume(fragment);
    }
    let response = response_expect!(aggregator.result());
    serde_json::to_value(&response).expect("serialise envelope")
}

#[rstest]
#[tokio::test]
async fn load_balancer_envelope_has_description() {
    let value = envelope(
        RequestSource::Alb,
        vec![text_status(200), chunk(b"hello"), Fragment::Terminal],
    )
    .await;

    assert_eq!(
        value,
        json!({
            "statusCode": 200,
            "statusDescription": "OK",
            "multiValueHeaders": { "content-type": ["text/plain"] },
            "body": "hello",
            "isBase64Encoded": false,
        })
    );
}

#[rstest]
#[tokio::test]
async fn api_gateway_envelope_omits_description() {
    let value = envelope(
        RequestSource::ApiGateway,
        vec![binary_status(200), chunk(&[0x00, 0xFF, 0x10]), Fragment::Terminal],
    )
    .await;

    assert!(value.get("statusDescription").is_none());
    assert_eq!(value["body"], "AP8Q");
    assert_eq!(value["isBase64Encoded"], true);
}

#[rstest]
#[tokio::test]
async fn empty_response_serialises_null_body() {
    let value = envelope(
        RequestSource::ApiGateway,
        vec![
            Fragment::Status(StatusFragment::new(http::StatusCode::NOT_MODIFIED)),
            Fragment::Terminal,
        ],
    )
    .await;

    assert_eq!(value["statusCode"], 304);
    assert_eq!(value["multiValueHeaders"], json!({}));
    assert!(value["body"].is_null());
    assert_eq!(value["isBase64Encoded"], false);
}
