/*!
 * Integration tests for the per-text translation pipeline
 */

use std::sync::Arc;

use anyhow::Result;

use chaptrans::errors::{ProviderError, TranslationError};
use chaptrans::providers::mock::MockGateway;

use crate::common;

/// With check and refine disabled, the pipeline is segment + translate +
/// join and the output is exactly the scripted "translation".
#[tokio::test]
async fn test_translate_plainPipeline_shouldReturnTranslatedText() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::uppercase());
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let mut request = common::base_request(false, false);
    request.segment_size = Some(100);

    let result = engine.translate("Hello. World.", &request).await?;

    assert_eq!(result, "HELLO. WORLD.");
    assert_eq!(gateway.call_count(), 1);
    Ok(())
}

/// With check disabled, success never depends on the check route, even
/// against a checker that always fails.
#[tokio::test]
async fn test_translate_checkDisabled_shouldIgnoreCheckRoute() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Err(ProviderError::RequestFailed("checker is down".to_string()))
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let result = engine
        .translate("hello. world.", &common::base_request(false, false))
        .await?;

    assert_eq!(result, "HELLO. WORLD.");
    assert_eq!(gateway.call_count(), 1, "the check route must never be called");
    Ok(())
}

/// Segmented input is translated segment by segment, in order, and joined
/// with a blank line.
#[tokio::test]
async fn test_translate_segmented_shouldJoinWithBlankLine() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::uppercase());
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let mut request = common::base_request(false, false);
    request.segment_size = Some(8);

    let result = engine.translate("First part. Second part.", &request).await?;

    assert_eq!(result, "FIRST PART.\n\nSECOND PART.");
    assert_eq!(gateway.call_count(), 2);
    assert_eq!(
        gateway.prompts(),
        vec!["First part.".to_string(), "Second part.".to_string()]
    );
    Ok(())
}

/// A passing check returns the translation after one check call.
#[tokio::test]
async fn test_translate_checkPasses_shouldSucceedFirstAttempt() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Ok("Check response: yes".to_string())
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let result = engine
        .translate("hello. world.", &common::base_request(true, false))
        .await?;

    assert_eq!(result, "HELLO. WORLD.");
    // One translation call plus one check call.
    assert_eq!(gateway.call_count(), 2);
    Ok(())
}

/// A check that keeps answering "no" exhausts the check retry, triggers
/// one full re-translation, and then fails terminally with the cause.
#[tokio::test]
async fn test_translate_checkAlwaysNo_shouldRetryOnceThenFail() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Ok("Check response: no\nCause: character names were dropped".to_string())
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let err = engine
        .translate("hello. world.", &common::base_request(true, false))
        .await
        .unwrap_err();

    match err {
        TranslationError::CheckFailed { cause } => {
            assert_eq!(cause.as_deref(), Some("character names were dropped"));
        }
        other => panic!("expected CheckFailed, got {:?}", other),
    }

    // Two full attempts, each one translation call plus two check calls.
    assert_eq!(gateway.call_count(), 6);
    Ok(())
}

/// A provider failure on a check call counts as a failed check rather than
/// aborting the file outright.
#[tokio::test]
async fn test_translate_checkCallErrors_shouldFailAsCheckFailure() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Err(ProviderError::ApiError {
                status_code: 503,
                message: "overloaded".to_string(),
            })
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let err = engine
        .translate("hello. world.", &common::base_request(true, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::CheckFailed { cause: Some(_) }));
    Ok(())
}

/// A refine failure is non-fatal: the unrefined segment is kept.
#[tokio::test]
async fn test_translate_refineFails_shouldKeepUnrefinedSegment() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Err(ProviderError::RequestFailed("refine model down".to_string()))
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let result = engine
        .translate("hello. world.", &common::base_request(false, true))
        .await?;

    assert_eq!(result, "HELLO. WORLD.");
    Ok(())
}

/// A successful refine pass replaces each segment with the refined text.
#[tokio::test]
async fn test_translate_refineSucceeds_shouldUseRefinedText() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::by_route(|route, prompt| {
        if route.model == "checker" {
            Ok(format!("polished: {}", prompt))
        } else {
            Ok(prompt.to_uppercase())
        }
    }));
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let result = engine
        .translate("hello. world.", &common::base_request(false, true))
        .await?;

    assert_eq!(result, "polished: HELLO. WORLD.");
    Ok(())
}

/// A provider failure on a translation call aborts the text immediately,
/// with no retry and no partial output.
#[tokio::test]
async fn test_translate_providerFails_shouldAbortWithoutRetry() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    common::install_passthrough_prompts(config_dir.path())?;

    let gateway = Arc::new(MockGateway::failing());
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let err = engine
        .translate("hello. world.", &common::base_request(true, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::Provider(_)));
    assert_eq!(gateway.call_count(), 1);
    Ok(())
}

/// A missing prompt template fails the text with a prompt error.
#[tokio::test]
async fn test_translate_missingPrompts_shouldFailWithPromptError() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    // No templates installed anywhere.

    let gateway = Arc::new(MockGateway::uppercase());
    let engine = common::make_engine(gateway, config_dir.path());

    let err = engine
        .translate("hello. world.", &common::base_request(false, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::Prompt(_)));
    Ok(())
}

/// With check enabled but no check template installed, the text fails
/// with a prompt error before any provider call, instead of burning a
/// translation plus a full re-translation on an unfixable configuration.
#[tokio::test]
async fn test_translate_missingCheckPrompt_shouldFailBeforeTranslating() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let default_dir = config_dir.path().join("prompts").join("default");
    std::fs::create_dir_all(&default_dir)?;
    std::fs::write(default_dir.join("translation.txt"), "{text_to_translate}")?;

    let gateway = Arc::new(MockGateway::uppercase());
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let err = engine
        .translate("hello. world.", &common::base_request(true, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::Prompt(_)));
    assert_eq!(gateway.call_count(), 0);
    Ok(())
}

/// Custom terminology reaches the rendered prompt as normalized bullets.
#[tokio::test]
async fn test_translate_withTerms_shouldInjectTerminology() -> Result<()> {
    let config_dir = common::create_temp_dir()?;
    let default_dir = config_dir.path().join("prompts").join("default");
    std::fs::create_dir_all(&default_dir)?;
    std::fs::write(
        default_dir.join("translation.txt"),
        "{terminology_reference}{text_to_translate}",
    )?;

    let gateway = Arc::new(MockGateway::echo());
    let engine = common::make_engine(gateway.clone(), config_dir.path());

    let mut request = common::base_request(false, false);
    request.custom_terms = Some("Aria -> Aria\nBlackwood -> Bosnoir".to_string());

    let result = engine.translate("hello.", &request).await?;

    assert!(result.contains("- Aria -> Aria"));
    assert!(result.contains("- Blackwood -> Bosnoir"));
    assert!(result.contains("hello."));
    Ok(())
}
