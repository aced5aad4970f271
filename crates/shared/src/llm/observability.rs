use std::time::{Duration, Instant};

use tracing::info;

use super::{LlmGateway, LlmGatewayError, LlmGatewayRequest, LlmGatewayResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct LlmTelemetryEvent {
    pub outcome: &'static str,
    pub latency_ms: u64,
    pub model: Option<String>,
    pub provider_request_id: Option<String>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub estimated_cost_usd: Option<f64>,
    pub error_type: Option<&'static str>,
}

pub async fn generate_with_telemetry(
    llm_gateway: &dyn LlmGateway,
    request: LlmGatewayRequest,
) -> (
    Result<LlmGatewayResponse, LlmGatewayError>,
    LlmTelemetryEvent,
) {
    let started_at = Instant::now();
    let result = llm_gateway.generate(request).await;
    let telemetry = telemetry_for_result(started_at.elapsed(), &result);
    (result, telemetry)
}

pub fn log_telemetry(telemetry: &LlmTelemetryEvent) {
    info!(
        outcome = telemetry.outcome,
        model = ?telemetry.model,
        provider_request_id = ?telemetry.provider_request_id,
        latency_ms = telemetry.latency_ms,
        prompt_tokens = ?telemetry.prompt_tokens,
        completion_tokens = ?telemetry.completion_tokens,
        total_tokens = ?telemetry.total_tokens,
        estimated_cost_usd = ?telemetry.estimated_cost_usd,
        error_type = ?telemetry.error_type,
        metric_name = "llm_generation",
        "llm generation metrics"
    );
}

fn telemetry_for_result(
    latency: Duration,
    result: &Result<LlmGatewayResponse, LlmGatewayError>,
) -> LlmTelemetryEvent {
    let latency_ms = duration_to_millis(latency);
    match result {
        Ok(response) => {
            let usage = response.usage.clone().unwrap_or_default();
            let has_usage = response.usage.is_some();
            let estimated_cost_usd = if has_usage {
                estimate_cost_usd(
                    &response.model,
                    usage.prompt_tokens,
                    usage.completion_tokens,
                )
            } else {
                None
            };

            LlmTelemetryEvent {
                outcome: "success",
                latency_ms,
                model: Some(response.model.clone()),
                provider_request_id: response.provider_request_id.clone(),
                prompt_tokens: has_usage.then_some(usage.prompt_tokens),
                completion_tokens: has_usage.then_some(usage.completion_tokens),
                total_tokens: has_usage.then_some(usage.total_tokens),
                estimated_cost_usd,
                error_type: None,
            }
        }
        Err(err) => LlmTelemetryEvent {
            outcome: "failure",
            latency_ms,
            model: None,
            provider_request_id: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            estimated_cost_usd: None,
            error_type: Some(err.kind()),
        },
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn estimate_cost_usd(model: &str, prompt_tokens: u32, completion_tokens: u32) -> Option<f64> {
    let pricing = pricing_for_model(model)?;
    let prompt = f64::from(prompt_tokens);
    let completion = f64::from(completion_tokens);
    let total = (prompt * pricing.input_per_million + completion * pricing.output_per_million)
        / 1_000_000.0;
    Some((total * 1_000_000.0).round() / 1_000_000.0)
}

#[derive(Debug, Clone, Copy)]
struct ModelPricing {
    input_per_million: f64,
    output_per_million: f64,
}

fn pricing_for_model(model: &str) -> Option<ModelPricing> {
    let normalized = model.trim().to_ascii_lowercase();
    if normalized.starts_with("gpt-4o-mini") {
        return Some(ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        });
    }

    if normalized.starts_with("gpt-4o") {
        return Some(ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.00,
        });
    }

    None
}
