//! Tests for retry, backoff and cancellation timing
//!
//! These tests run on a paused tokio clock, so backoff sleeps and attempt
//! timeouts advance virtual time only and the elapsed time is exact.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::error::ErrorKind;
    use crate::fallback::FallbackRegistry;
    use crate::generator::{GenerationStatus, ResultSource};
    use crate::resilience::{backoff_delay, AttemptOutcome, RetryPolicy};
    use crate::tests::support::{generator_with, params_for, reply, sample_response, ScriptedTransport, Step};
    use crate::tools::ToolId;

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected ~{:?}, got {:?}",
            expected,
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_success() {
        for k in 0..=2u32 {
            let mut steps = vec![Step::Fail(ErrorKind::RateLimitExceeded); k as usize];
            steps.push(reply(sample_response(ToolId::SeoAudit)));
            let transport = ScriptedTransport::new(steps);
            let generator = generator_with(transport.clone());

            let start = Instant::now();
            let result = generator.generate(params_for(ToolId::SeoAudit)).await;

            assert_eq!(result.status, GenerationStatus::Success, "k = {}", k);
            assert_eq!(result.source, ResultSource::Live);
            assert_eq!(result.attempts.len(), k as usize + 1);
            assert_eq!(transport.calls(), k + 1);

            // 2^(i+1) * 2000 ms after each rate-limited attempt i
            let expected: u64 = (0..k).map(|i| 2u64.pow(i + 1) * 2000).sum();
            assert_elapsed(start, Duration::from_millis(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_through_budget_falls_back() {
        let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::RateLimitExceeded), 10);
        let generator = generator_with(transport.clone());

        let start = Instant::now();
        let result = generator.generate(params_for(ToolId::AdCopy)).await;

        assert_eq!(result.status, GenerationStatus::Fallback);
        assert_eq!(result.source, ResultSource::Fallback);
        assert_eq!(result.error_kind, Some(ErrorKind::RateLimitExceeded));
        assert_eq!(
            result.content.as_ref(),
            Some(FallbackRegistry::global().template(ToolId::AdCopy))
        );
        assert_eq!(transport.calls(), 3);
        assert!(result
            .attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::RateLimited));
        assert_elapsed(start, Duration::from_secs(4 + 8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_authentication_failure_is_immediate() {
        let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::Authentication), 3);
        let generator = generator_with(transport.clone());

        let start = Instant::now();
        let result = generator.generate(params_for(ToolId::SeoAudit)).await;

        assert_eq!(result.status, GenerationStatus::Error);
        assert_eq!(result.error_kind, Some(ErrorKind::Authentication));
        assert!(result.content.is_none());
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::AuthError);
        assert_eq!(transport.calls(), 1);
        assert_elapsed(start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_backoff_doubles() {
        let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::TransientNetwork), 3);
        let generator = generator_with(transport.clone());

        let start = Instant::now();
        let result = generator.generate(params_for(ToolId::BlogOutline)).await;

        assert_eq!(result.status, GenerationStatus::Fallback);
        assert_eq!(result.error_kind, Some(ErrorKind::TransientNetwork));
        // 2^1 * 1000 ms + 2^2 * 1000 ms
        assert_elapsed(start, Duration::from_secs(2 + 4));

        let policy = RetryPolicy::default();
        for k in 0..2 {
            assert_eq!(
                backoff_delay(ErrorKind::TransientNetwork, k, &policy),
                Some(Duration::from_millis(2u64.pow(k + 1) * 1000))
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_timeouts_serve_seo_template() {
        let transport = ScriptedTransport::repeating(Step::Hang, 3);
        let generator = generator_with(transport.clone());

        let start = Instant::now();
        let result = generator
            .generate(params_for(ToolId::SeoAudit).field("url", "https://example.com"))
            .await;

        assert_eq!(result.status, GenerationStatus::Fallback);
        assert_eq!(result.error_kind, Some(ErrorKind::TransientNetwork));
        assert_eq!(
            result.content.as_ref(),
            Some(FallbackRegistry::global().template(ToolId::SeoAudit))
        );
        assert_eq!(transport.calls(), 3);
        assert!(result
            .attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::TransientError));

        // three 30 s timeouts with 2 s and 4 s of backoff between them
        assert_elapsed(start, Duration::from_secs(30 + 2 + 30 + 4 + 30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_worst_case_latency_bounds_a_call() {
        let transport = ScriptedTransport::repeating(Step::Hang, 3);
        let generator = generator_with(transport);

        let start = Instant::now();
        generator.generate(params_for(ToolId::SeoAudit)).await;

        assert!(start.elapsed() <= RetryPolicy::default().worst_case_latency());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_retry_budget_overrides_default() {
        let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::TransientNetwork), 10);
        let generator = generator_with(transport.clone());

        let result = generator
            .generate(params_for(ToolId::SeoAudit).retry_budget(4))
            .await;

        assert_eq!(result.status, GenerationStatus::Fallback);
        assert_eq!(transport.calls(), 5);
        let indices: Vec<u32> = result.attempts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_one_attempt() {
        let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::RateLimitExceeded), 3);
        let generator = generator_with(transport.clone());

        let start = Instant::now();
        let result = generator
            .generate(params_for(ToolId::SeoAudit).retry_budget(0))
            .await;

        assert_eq!(result.status, GenerationStatus::Fallback);
        assert_eq!(transport.calls(), 1);
        assert_elapsed(start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = ScriptedTransport::new(vec![
            Step::Fail(ErrorKind::RateLimitExceeded),
            reply(sample_response(ToolId::SeoAudit)),
        ]);
        let generator = generator_with(transport.clone());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = generator
            .generate_with_cancel(params_for(ToolId::SeoAudit), &token)
            .await;

        assert_eq!(result.status, GenerationStatus::Error);
        assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
        assert!(result.content.is_none());
        assert_eq!(transport.calls(), 1);
        // released at the cancel, not at the end of the 4 s backoff
        assert_elapsed(start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_attempt() {
        let transport = ScriptedTransport::repeating(Step::Hang, 3);
        let generator = generator_with(transport.clone());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = generator
            .generate_with_cancel(params_for(ToolId::SeoAudit), &token)
            .await;

        assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Cancelled);
        assert_elapsed(start, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_before_first_attempt() {
        let transport = ScriptedTransport::new(vec![reply(sample_response(ToolId::SeoAudit))]);
        let generator = generator_with(transport.clone());

        let token = CancellationToken::new();
        token.cancel();

        let result = generator
            .generate_with_cancel(params_for(ToolId::SeoAudit), &token)
            .await;

        assert_eq!(result.status, GenerationStatus::Error);
        assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
        assert_eq!(transport.calls(), 0);
        assert!(result.attempts.is_empty());
    }
}
