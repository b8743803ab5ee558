//! Tests that every tool yields schema-valid content, live or fallback

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::fallback::FallbackRegistry;
    use crate::generator::{GenerationStatus, ResultSource};
    use crate::normalize::normalize;
    use crate::schema::ToolContent;
    use crate::tests::support::{generator_with, params_for, reply, sample_response, ScriptedTransport, Step};
    use crate::tools::ToolId;

    #[test]
    fn test_every_sample_response_matches_its_schema() {
        for tool in ToolId::ALL {
            let content = normalize(tool, sample_response(tool))
                .unwrap_or_else(|e| panic!("{} sample rejected: {}", tool, e));
            assert_eq!(content.tool(), Some(tool));
        }
    }

    #[test]
    fn test_responses_are_not_accepted_for_the_wrong_tool() {
        // An ad-copy answer has no `score`
        let err = normalize(ToolId::SeoAudit, sample_response(ToolId::AdCopy)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_live_results_conform_for_every_tool() {
        for tool in ToolId::ALL {
            let transport = ScriptedTransport::new(vec![reply(sample_response(tool))]);
            let result = generator_with(transport).generate(params_for(tool)).await;

            assert_eq!(result.status, GenerationStatus::Success, "{}", tool);
            assert_eq!(result.content.as_ref().and_then(ToolContent::tool), Some(tool));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_results_conform_for_every_tool() {
        for tool in ToolId::ALL {
            let transport = ScriptedTransport::repeating(Step::Fail(ErrorKind::TransientNetwork), 3);
            let result = generator_with(transport).generate(params_for(tool)).await;

            assert_eq!(result.status, GenerationStatus::Fallback, "{}", tool);
            assert_eq!(result.source, ResultSource::Fallback);

            let content = result.content.expect("fallback carries content");
            assert_eq!(&content, FallbackRegistry::global().template(tool));

            // The template itself passes the live schema checks
            let value = serde_json::to_value(&content).unwrap();
            assert!(ToolContent::from_value(tool, value).is_ok(), "{} template invalid", tool);
        }
    }

    #[test]
    fn test_unknown_tool_template_is_generic() {
        let content = FallbackRegistry::global().template_for("press-release");
        assert_eq!(content.tool(), None);
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["tool_id"], "press-release");
        assert!(value["message"].as_str().is_some());
    }
}
