mod display;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bertqa_ai::{
    AnswerListener, AnswererFactory, BertQaHelper, OrtAnswererFactory, OrtDeviceCapabilities,
};
use bertqa_core::{Answer, Delegate, DeviceCapabilities, QaConfig, select_delegate};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bertqa",
    version,
    about = "Extractive question answering over a bundled BERT model"
)]
struct Cli {
    /// JSON config file; any field may be omitted.
    #[arg(long, env = "BERTQA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the bundled model assets.
    #[arg(long, env = "BERTQA_ASSETS", global = true)]
    assets: Option<PathBuf>,

    /// Platform version reported to delegate selection.
    #[arg(long, env = "BERTQA_PLATFORM_VERSION", global = true)]
    platform_version: Option<u32>,

    /// Force a delegate instead of selecting one: gpu, nnapi, cpu or cpu:<threads>.
    #[arg(long, global = true)]
    delegate: Option<Delegate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question about a context passage.
    Ask {
        #[arg(short, long)]
        question: String,

        /// Context passage text.
        #[arg(
            short,
            long,
            conflicts_with = "context_file",
            required_unless_present = "context_file"
        )]
        context: Option<String>,

        /// Read the context passage from a file.
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Print answers as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show device capabilities and the delegate that would be used.
    Device,
}

/// Prints helper callbacks to the console.
struct ConsoleListener {
    json: bool,
}

impl AnswerListener for ConsoleListener {
    fn on_error(&self, error: &str) {
        eprintln!("error: {error}");
    }

    fn on_result(&self, results: &[Answer], inference_time_ms: u64) {
        if self.json {
            println!("{}", display::answers_json(results, inference_time_ms));
        } else {
            print!("{}", display::render_answers(results, inference_time_ms));
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("bertqa v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let device = OrtDeviceCapabilities::new(config.platform_version.unwrap_or(0));

    match cli.command {
        Command::Ask {
            question,
            context,
            context_file,
            json,
        } => {
            let context = match (context, context_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading context from {}", path.display()))?,
                (None, None) => anyhow::bail!("either --context or --context-file is required"),
            };

            let listener: Arc<dyn AnswerListener> = Arc::new(ConsoleListener { json });
            let mut helper = BertQaHelper::new(config, OrtAnswererFactory, device, Some(listener));
            if let Some(delegate) = cli.delegate {
                helper = helper.with_delegate(delegate);
            }

            // A load failure has already been reported by the listener.
            if !ask(&mut helper, &context, &question)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Device => {
            let delegate = cli
                .delegate
                .unwrap_or_else(|| select_delegate(&device, &config.delegate_policy()));
            print!("{}", display::render_device(&device, delegate));

            let model_dir = config.model_dir();
            println!(
                "  model:            {} ({})",
                model_dir.display(),
                if model_dir.join("model.onnx").exists() {
                    "present"
                } else {
                    "missing"
                }
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run one question through the helper and release the model.
///
/// Returns `false` when the model could not be loaded.
fn ask<F: AnswererFactory, D: DeviceCapabilities>(
    helper: &mut BertQaHelper<F, D>,
    context: &str,
    question: &str,
) -> anyhow::Result<bool> {
    helper.get_question_answer(context, question)?;
    if !helper.is_loaded() {
        return Ok(false);
    }
    helper.clear_question_answerer();
    Ok(true)
}

/// Config file first, then flags and environment on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<QaConfig> {
    let mut config = match &cli.config {
        Some(path) => QaConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => QaConfig::default(),
    };
    if let Some(assets) = &cli.assets {
        config.assets_dir.clone_from(assets);
    }
    if let Some(version) = cli.platform_version {
        config.platform_version = Some(version);
    }
    Ok(config)
}
