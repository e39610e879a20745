mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quizbot_core::config::Config;
use quizbot_core::{QuizOptions, QuizPipeline, QuizResult};
use quizbot_document::TextSource;
use quizbot_gateway::GatewayServer;
use quizbot_llm::QuestionGenerator;
use tokio::sync::watch;

use crate::cli::{Cli, Command, GenerateArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.validate()?;

    start(cli.command.unwrap_or(Command::Serve), &config).await
}

#[cfg(feature = "candle")]
async fn start(command: Command, config: &Config) -> anyhow::Result<()> {
    let generator = create_generator(config)?;
    if config.model.preload && matches!(command, Command::Serve) {
        generator
            .preload()
            .await
            .context("failed to preload the question generation model")?;
    }
    run(command, config, generator).await
}

#[cfg(not(feature = "candle"))]
async fn start(_command: Command, _config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("quizbot was built without a model backend, rebuild with `--features candle`")
}

async fn run<G: QuestionGenerator + 'static>(
    command: Command,
    config: &Config,
    generator: G,
) -> anyhow::Result<()> {
    let pipeline = QuizPipeline::new(generator, config.generation.quiz_settings())
        .with_adapter(config.document.adapter());

    match command {
        Command::Serve => serve(pipeline, config).await,
        Command::Generate(args) => {
            let result = generate_once(&pipeline, args).await?;
            print!("{}", format_questions(&result));
            Ok(())
        }
    }
}

async fn serve<G: QuestionGenerator + 'static>(
    pipeline: QuizPipeline<G>,
    config: &Config,
) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.server.bind,
        config.server.port,
        Arc::new(pipeline),
        shutdown_rx,
    )
    .with_rate_limit(config.server.rate_limit)
    .with_max_body_size(config.server.max_body_size)
    .serve()
    .await?;

    Ok(())
}

async fn generate_once<G: QuestionGenerator>(
    pipeline: &QuizPipeline<G>,
    args: GenerateArgs,
) -> anyhow::Result<QuizResult> {
    let source = match (args.text, args.file) {
        (Some(text), _) => TextSource::Raw(text),
        (None, Some(path)) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            TextSource::upload(filename, bytes)
        }
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };

    let options = QuizOptions {
        count: args.count,
        mode: args.mode,
    };
    Ok(pipeline.generate_from(source, options).await?)
}

fn format_questions(result: &QuizResult) -> String {
    if result.questions.is_empty() {
        return "no questions produced\n".to_owned();
    }
    result
        .questions
        .iter()
        .map(|q| format!("{}. {}\n", q.id, q.text))
        .collect()
}

#[cfg(feature = "candle")]
fn create_generator(config: &Config) -> anyhow::Result<quizbot_llm::candle_provider::CandleGenerator> {
    use quizbot_core::config::ModelSourceKind;
    use quizbot_llm::candle_provider::CandleGenerator;
    use quizbot_llm::candle_provider::loader::ModelSource;

    let source = match config.model.source {
        ModelSourceKind::Local => ModelSource::Local {
            path: PathBuf::from(
                config
                    .model
                    .local_path
                    .as_deref()
                    .context("model.local_path is required for the local source")?,
            ),
        },
        ModelSourceKind::HuggingFace => ModelSource::HuggingFace {
            repo_id: config.model.repo_id.clone(),
            revision: config.model.revision.clone(),
        },
    };

    let device = select_device(&config.model.device)?;
    let generator = CandleGenerator::new(source, device);
    tracing::info!("question generator: candle on {}", generator.device_name());
    Ok(generator)
}

#[cfg(feature = "candle")]
fn select_device(preference: &str) -> anyhow::Result<quizbot_llm::candle_provider::Device> {
    use quizbot_llm::candle_provider::Device;

    match preference {
        "metal" => {
            #[cfg(feature = "metal")]
            return Ok(Device::new_metal(0)?);
            #[cfg(not(feature = "metal"))]
            anyhow::bail!("candle compiled without metal feature");
        }
        "cuda" => {
            #[cfg(feature = "cuda")]
            return Ok(Device::new_cuda(0)?);
            #[cfg(not(feature = "cuda"))]
            anyhow::bail!("candle compiled without cuda feature");
        }
        "auto" => {
            #[cfg(feature = "metal")]
            if let Ok(device) = Device::new_metal(0) {
                return Ok(device);
            }
            #[cfg(feature = "cuda")]
            if let Ok(device) = Device::new_cuda(0) {
                return Ok(device);
            }
            Ok(Device::Cpu)
        }
        "cpu" => Ok(Device::Cpu),
        other => {
            tracing::warn!("unknown device '{other}', using cpu");
            Ok(Device::Cpu)
        }
    }
}

fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("QUIZBOT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries the generated questions, logs go to stderr
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use quizbot_core::{PromptMode, Question, QuizSettings};
    use quizbot_llm::mock::MockGenerator;

    use super::*;

    fn args(text: Option<&str>, file: Option<PathBuf>) -> GenerateArgs {
        GenerateArgs {
            text: text.map(str::to_owned),
            file,
            count: None,
            mode: None,
        }
    }

    #[test]
    fn config_flag_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn config_loading_from_default_toml() {
        let config = Config::load(Path::new("config/default.toml")).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn questions_print_numbered() {
        let result = QuizResult {
            mode: PromptMode::Combined,
            questions: vec![
                Question {
                    id: 1,
                    text: "What is AI?".into(),
                },
                Question {
                    id: 2,
                    text: "How does ML work?".into(),
                },
            ],
        };
        assert_eq!(
            format_questions(&result),
            "1. What is AI?\n2. How does ML work?\n"
        );
    }

    #[test]
    fn empty_result_prints_notice() {
        let result = QuizResult {
            mode: PromptMode::Combined,
            questions: Vec::new(),
        };
        assert_eq!(format_questions(&result), "no questions produced\n");
    }

    #[tokio::test]
    async fn generate_once_from_text() {
        let mock = MockGenerator::with_responses(vec!["Who?sep>Why?".into()]);
        let pipeline = QuizPipeline::new(mock.clone(), QuizSettings::default());
        let result = generate_once(&pipeline, args(Some("Some facts."), None))
            .await
            .unwrap();
        assert_eq!(result.questions.len(), 2);
        assert_eq!(mock.requests()[0].prompt, "generate questions: Some facts.");
    }

    #[tokio::test]
    async fn generate_once_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "Mitochondria make ATP.").unwrap();

        let mock = MockGenerator::default();
        let pipeline = QuizPipeline::new(mock.clone(), QuizSettings::default());
        generate_once(&pipeline, args(None, Some(path))).await.unwrap();
        assert_eq!(
            mock.requests()[0].prompt,
            "generate questions: Mitochondria make ATP."
        );
    }

    #[tokio::test]
    async fn generate_once_missing_file() {
        let pipeline = QuizPipeline::new(MockGenerator::default(), QuizSettings::default());
        let err = generate_once(&pipeline, args(None, Some(PathBuf::from("/nonexistent/x.txt"))))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[cfg(feature = "candle")]
    #[test]
    fn select_device_cpu() {
        let device = select_device("cpu").unwrap();
        assert!(matches!(device, quizbot_llm::candle_provider::Device::Cpu));
        let fallback = select_device("tpu").unwrap();
        assert!(matches!(fallback, quizbot_llm::candle_provider::Device::Cpu));
    }
}
