use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

use super::proto::{
    MatchRequest, MatchResponse, ParseRequest, ParseResponse, MATCH_RESUME_VACANCY_PATH,
    PARSE_RESUME_PATH,
};
use super::{decode_parsed_data, validate_score, ScoringClient, ScoringError};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// gRPC client for the scoring service.
///
/// The channel connects lazily and is shared by all requests; every call is bounded by
/// `timeout`. Transient failures are retried up to `max_retries` times with exponential
/// backoff, and each retry is logged.
#[derive(Clone)]
pub struct GrpcScoringClient {
    channel: Channel,
    timeout: Duration,
    max_retries: u32,
}

impl GrpcScoringClient {
    /// `address` is `host:port`. Must be called inside a Tokio runtime.
    pub fn connect_lazy(
        address: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ScoringError> {
        let endpoint = Endpoint::from_shared(format!("http://{address}"))
            .map_err(|e| {
                ScoringError::Transport(format!("invalid scoring endpoint '{address}': {e}"))
            })?
            .connect_timeout(timeout);

        Ok(Self {
            channel: endpoint.connect_lazy(),
            timeout,
            max_retries,
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, ScoringError>
    where
        Req: prost::Message + Clone + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        with_retries(path, self.timeout, self.max_retries, || {
            self.call_once(path, request.clone())
        })
        .await
    }

    async fn call_once<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, ScoringError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| ScoringError::Transport(e.to_string()))?;

        let response: tonic::Response<Resp> = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                ProstCodec::default(),
            )
            .await?;

        Ok(response.into_inner())
    }
}

/// Delay before retry number `attempt` (1-based): 200ms doubling, capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(RETRY_MAX_DELAY)
}

/// Runs `call` under `timeout`, retrying transient failures up to `max_retries` times.
async fn with_retries<T, F, Fut>(
    path: &'static str,
    timeout: Duration,
    max_retries: u32,
    mut call: F,
) -> Result<T, ScoringError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScoringError>>,
{
    let mut last_error: Option<ScoringError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            warn!(
                path,
                attempt,
                "Scoring call failed ({}), retrying after {}ms",
                last_error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(timeout, call()).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) if e.is_transient() => last_error = Some(e),
            Ok(Err(e)) => return Err(e),
            Err(_) => last_error = Some(ScoringError::Timeout(timeout)),
        }
    }

    Err(last_error.unwrap_or(ScoringError::Timeout(timeout)))
}

#[async_trait]
impl ScoringClient for GrpcScoringClient {
    async fn parse(&self, text: &str) -> Result<Value, ScoringError> {
        let response: ParseResponse = self
            .unary(
                PARSE_RESUME_PATH,
                ParseRequest {
                    text: text.to_string(),
                },
            )
            .await?;

        debug!("Parse returned {} bytes", response.parsed_data.len());
        decode_parsed_data(&response.parsed_data)
    }

    async fn match_score(
        &self,
        resume_text: &str,
        vacancy_text: &str,
    ) -> Result<f32, ScoringError> {
        let response: MatchResponse = self
            .unary(
                MATCH_RESUME_VACANCY_PATH,
                MatchRequest {
                    resume_text: resume_text.to_string(),
                    vacancy_text: vacancy_text.to_string(),
                },
            )
            .await?;

        debug!("Match returned score {}", response.score);
        validate_score(response.score)
    }
}
