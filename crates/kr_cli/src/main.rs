use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use kr_core::{KeywordSource, ResearchConfig, Result, SerpSource};
use kr_sources::cli::{handle_command, CommandContext, ResearchCommands, Sources};
use kr_sources::{
    init_logging, DataForSeoClient, DataForSeoCredentials, DataForSeoKeywordSource, DataForSeoSerpSource,
    FixtureSource, Unpaced,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// DataForSEO keyword and SERP APIs
    Dataforseo,
    /// Canned data from a JSON file, no network
    Fixture,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keyword research: expand a seed, cluster by SERP overlap", long_about = None)]
struct Cli {
    /// Where run reports go: memory or csv
    #[arg(long, default_value = "csv", env = "KR_STORAGE")]
    storage: String,
    /// Directory for CSV exports
    #[arg(long, env = "KR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Base URL of the DataForSEO API
    #[arg(long, env = "DATAFORSEO_API_URL")]
    api_url: Option<String>,
    /// Keyword and SERP data provider
    #[arg(long, value_enum, default_value = "dataforseo")]
    source: SourceKind,
    /// Fixture file, required with --source fixture
    #[arg(long, required_if_eq("source", "fixture"))]
    fixture: Option<PathBuf>,
    #[command(subcommand)]
    command: ResearchCommands,
}

fn build_sources(cli: &Cli, config: &ResearchConfig) -> Result<Sources> {
    match cli.source {
        SourceKind::Dataforseo => {
            let credentials = DataForSeoCredentials::from_env()?;
            let mut client = DataForSeoClient::new(credentials)?;
            if let Some(url) = &cli.api_url {
                client = client.with_base_url(url)?;
            }
            info!("🔑 DataForSEO client ready ({})", client.base_url());
            let client = Arc::new(client);
            let keywords = DataForSeoKeywordSource::new(client.clone());
            let serps = DataForSeoSerpSource::new(client).with_page_size(config.page_size);
            Ok(Sources {
                keywords: Arc::new(keywords),
                serps: Arc::new(serps),
            })
        }
        SourceKind::Fixture => {
            let path = cli.fixture.as_ref().ok_or_else(|| {
                kr_core::Error::Config("--fixture is required with --source fixture".to_string())
            })?;
            let fixture = Arc::new(FixtureSource::from_file(path)?);
            info!("📂 Using fixture data from {}", path.display());
            Ok(Sources {
                keywords: fixture.clone() as Arc<dyn KeywordSource>,
                serps: fixture as Arc<dyn SerpSource>,
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_logging();
    let cli = Cli::parse();

    let config = ResearchConfig::from_env()?;
    let storage = kr_storage::create_storage(&cli.storage, cli.output_dir.as_deref())?;

    let sources = match &cli.command {
        ResearchCommands::Research(_) => Some(build_sources(&cli, &config)?),
        ResearchCommands::Runs => None,
    };

    let pacer = match cli.source {
        SourceKind::Fixture => Some(Arc::new(Unpaced) as Arc<dyn kr_sources::Pacer>),
        SourceKind::Dataforseo => None,
    };

    let context = CommandContext {
        sources,
        storage,
        config,
        pacer,
    };
    handle_command(cli.command, context).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixture_run() {
        let cli = Cli::try_parse_from([
            "kr",
            "--storage",
            "memory",
            "--source",
            "fixture",
            "--fixture",
            "data.json",
            "research",
            "ai tools",
        ])
        .unwrap();
        assert_eq!(cli.source, SourceKind::Fixture);
        assert_eq!(cli.fixture, Some(PathBuf::from("data.json")));
        assert!(matches!(cli.command, ResearchCommands::Research(ref args) if args.seed == "ai tools"));
    }

    #[test]
    fn test_fixture_source_needs_a_file() {
        let result = Cli::try_parse_from(["kr", "--source", "fixture", "research", "ai"]);
        assert!(result.is_err());
    }
}
