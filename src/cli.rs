// Command-line interface
// Serve the HTTP API, analyze a local file or print the default policy

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::audio::AudioFormat;
use crate::server::{ServiceSettings, DEFAULT_API_KEY, DEFAULT_MAX_BODY_MB};

/// Heuristic detector for AI-generated speech
#[derive(Parser, Debug)]
#[command(name = "vocalis")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the voice detection HTTP service
    Serve(ServeArgs),

    /// Classify a local audio file and print the full analysis as JSON
    Analyze(AnalyzeArgs),

    /// Print the built-in engine policy as TOML
    DefaultConfig,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000, env = "PORT")]
    pub port: u16,

    /// Key clients must send in the x-api-key header
    #[arg(long, default_value = DEFAULT_API_KEY, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Largest accepted request body in megabytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_MB, env = "MAX_BODY_MB")]
    pub max_body_mb: usize,

    /// TOML engine policy; built-in defaults when omitted
    #[arg(long, env = "VOCALIS_ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,
}

impl ServeArgs {
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            host: self.host.clone(),
            port: self.port,
            api_key: self.api_key.clone(),
            max_body_mb: self.max_body_mb,
        }
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Audio file to classify
    pub file: PathBuf,

    /// Container format; guessed from the extension when omitted
    #[arg(short, long)]
    pub format: Option<AudioFormat>,

    /// TOML engine policy; built-in defaults when omitted
    #[arg(long, env = "VOCALIS_ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["vocalis", "analyze", "clip.bin", "--format", "FLAC"]).unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.file, PathBuf::from("clip.bin"));
                assert_eq!(args.format, Some(AudioFormat::Flac));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["vocalis", "analyze", "clip.ogg", "--format", "ogg"]).is_err());
    }

    #[test]
    fn test_serve_settings() {
        let cli = Cli::try_parse_from([
            "vocalis", "serve", "--host", "127.0.0.1", "--port", "9001", "--api-key", "k",
            "--max-body-mb", "8",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(
            args.settings(),
            ServiceSettings {
                host: "127.0.0.1".to_string(),
                port: 9001,
                api_key: "k".to_string(),
                max_body_mb: 8,
            }
        );
        assert_eq!(args.settings().bind_address(), "127.0.0.1:9001");
        assert_eq!(args.settings().max_body_bytes(), 8 * 1024 * 1024);
    }
}
