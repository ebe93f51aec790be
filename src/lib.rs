// Vocalis - AI-generated speech detector
// Module declarations and command dispatch

use anyhow::Context;
use std::path::Path;

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod scoring;
pub mod server;

use audio::{decode_audio, AudioFormat};
use cli::{AnalyzeArgs, Cli, Command};
use scoring::{DetectionEngine, EngineConfig};

/// Execute a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => {
            let engine = load_engine(args.engine_config.as_deref())?;
            server::serve(args.settings(), engine).await
        }
        Command::Analyze(args) => analyze_file(&args),
        Command::DefaultConfig => {
            let text = toml::to_string_pretty(&EngineConfig::default())
                .context("Failed to serialize default engine config")?;
            print!("{}", text);
            Ok(())
        }
    }
}

/// Build an engine from a policy file, or the built-in policy when none is given
pub fn load_engine(path: Option<&Path>) -> anyhow::Result<DetectionEngine> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Invalid engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(DetectionEngine::new(config)?)
}

fn analyze_file(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let engine = load_engine(args.engine_config.as_deref())?;

    let format = match args.format {
        Some(format) => format,
        None => AudioFormat::from_path(&args.file).with_context(|| {
            format!(
                "Cannot tell the format of {}; pass --format",
                args.file.display()
            )
        })?,
    };

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let audio = decode_audio(&bytes, format)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    log::info!(
        "Decoded {}: {} Hz, {} channel(s), {:.2}s",
        args.file.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs()
    );

    let analysis = engine.analyze(&audio.to_mono(), audio.sample_rate)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_engine_defaults() {
        let engine = load_engine(None).unwrap();
        assert_eq!(engine.config(), &EngineConfig::default());
    }

    #[test]
    fn test_load_engine_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "decision_threshold = 0.6").unwrap();

        let engine = load_engine(Some(file.path())).unwrap();
        assert_eq!(engine.config().decision_threshold, 0.6);
    }

    #[test]
    fn test_load_engine_reports_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rules = []").unwrap();

        let err = load_engine(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid engine config"));
    }
}
