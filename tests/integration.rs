use quizbot_core::config::Config;
use quizbot_core::{PromptMode, QuizError, QuizOptions, QuizPipeline, QuizSettings};
use quizbot_document::{SourceAdapter, SourceText, TextSource};
use quizbot_llm::DecodingStrategy;
use quizbot_llm::mock::MockGenerator;

const PASSAGE: &str = "The Amazon rainforest produces a large share of the world's oxygen \
and is home to millions of species.";

fn pipeline(mock: &MockGenerator, mode: PromptMode) -> QuizPipeline<MockGenerator> {
    QuizPipeline::new(
        mock.clone(),
        QuizSettings {
            mode,
            ..QuizSettings::default()
        },
    )
}

#[tokio::test]
async fn raw_text_to_combined_questions() {
    let mock = MockGenerator::with_responses(vec![
        "What does the Amazon produce? <sep> How many species live there?sep>\n".into(),
    ]);
    let result = pipeline(&mock, PromptMode::Combined)
        .generate_from(TextSource::Raw(PASSAGE.into()), QuizOptions::default())
        .await
        .unwrap();

    let texts: Vec<_> = result.questions.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["What does the Amazon produce?", "How many species live there?"]
    );
    assert_eq!(mock.calls(), 1);
    assert_eq!(
        mock.requests()[0].config.strategy(),
        DecodingStrategy::Nucleus
    );
}

#[tokio::test]
async fn eight_templated_questions_numbered_in_order() {
    let responses = (1..=8).map(|i| format!("  Question {i}?  ")).collect();
    let mock = MockGenerator::with_responses(responses);
    let result = pipeline(&mock, PromptMode::Templated)
        .generate(&SourceText::new(PASSAGE), QuizOptions::default())
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 8);
    for (i, q) in result.questions.iter().enumerate() {
        assert_eq!(q.id, i + 1);
        assert_eq!(q.text, format!("Question {}?", i + 1));
    }

    let prompts: Vec<_> = mock.requests().into_iter().map(|r| r.prompt).collect();
    assert_eq!(prompts.len(), 8);
    assert!(prompts.iter().all(|p| p.ends_with(PASSAGE)));
    // every template is used exactly once
    let unique: std::collections::HashSet<_> = prompts.iter().collect();
    assert_eq!(unique.len(), 8);
}

#[tokio::test]
async fn empty_input_never_calls_generator() {
    let mock = MockGenerator::default();
    let p = pipeline(&mock, PromptMode::Combined);

    let err = p
        .generate_from(TextSource::Raw("  \n ".into()), QuizOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::EmptyInput));

    let err = p
        .generate_from(
            TextSource::upload("blank.txt", b"\n\n\t".to_vec()),
            QuizOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::EmptyInput));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn docx_is_rejected_before_extraction() {
    let mock = MockGenerator::default();
    let err = pipeline(&mock, PromptMode::Combined)
        .generate_from(
            TextSource::upload("essay.docx", b"PK\x03\x04 not really a docx".to_vec()),
            QuizOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::UnsupportedFormat(_)));
    assert_eq!(err.kind(), "unsupported_format");
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn invalid_utf8_text_file_is_extraction_error() {
    let mock = MockGenerator::default();
    let err = pipeline(&mock, PromptMode::Combined)
        .generate_from(
            TextSource::upload("latin1.txt", vec![0x66, 0x6f, 0xff, 0xfe]),
            QuizOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "extraction_failed");
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mock = MockGenerator::default();
    let p = pipeline(&mock, PromptMode::Combined).with_adapter(SourceAdapter::new(16));
    let err = p
        .generate_from(
            TextSource::upload("long.txt", vec![b'a'; 17]),
            QuizOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::FileTooLarge(17)));
}

#[tokio::test]
async fn failure_then_success_on_same_pipeline() {
    let mock = MockGenerator::default().failing_times(1);
    let p = pipeline(&mock, PromptMode::Combined);
    let source = SourceText::new(PASSAGE);

    let err = p.generate(&source, QuizOptions::default()).await.unwrap_err();
    assert!(matches!(err, QuizError::Generation(_)));

    let result = p.generate(&source, QuizOptions::default()).await.unwrap();
    assert_eq!(result.questions.len(), 1);
    assert_eq!(result.questions[0].text, mock.default_response);
}

#[tokio::test]
async fn pipeline_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quizbot.toml");
    std::fs::write(
        &path,
        "[generation]\nmode = \"templated\"\nquestion_count = 3\nseed = 9\n\n[document]\nmax_file_size = 1024\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let mock = MockGenerator::default();
    let p = QuizPipeline::new(mock.clone(), config.generation.quiz_settings())
        .with_adapter(config.document.adapter());

    let result = p
        .generate_from(
            TextSource::upload("notes.txt", PASSAGE.as_bytes().to_vec()),
            QuizOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.mode, PromptMode::Templated);
    assert_eq!(result.questions.len(), 3);

    let seeds: Vec<_> = mock.requests().iter().map(|r| r.config.seed).collect();
    assert_eq!(seeds, vec![Some(9), Some(10), Some(11)]);
}
