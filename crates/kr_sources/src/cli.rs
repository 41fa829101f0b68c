use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use kr_core::{Error, KeywordSource, ResearchConfig, ResearchOutcome, ResearchStorage, Result, RunReport, RunStatus, SerpSource};
use tracing::info;

use crate::manager::Researcher;
use crate::pacing::Pacer;

#[derive(Args, Debug, Clone, Default)]
pub struct ResearchArgs {
    /// The seed keyword to expand (e.g. "ai marketing")
    pub seed: String,
    /// Target location name, as the keyword provider spells it
    #[arg(long)]
    pub location: Option<String>,
    /// Target language code or name
    #[arg(long)]
    pub language: Option<String>,
    /// Minimum monthly search volume a candidate needs
    #[arg(long)]
    pub min_volume: Option<u64>,
    /// Maximum competition score a candidate may have, within [0, 1]
    #[arg(long)]
    pub max_competition: Option<f64>,
    /// SERP overlap needed to join a cluster, within [0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Number of keyword ideas to request
    #[arg(long)]
    pub limit: Option<usize>,
    /// Number of filtered keywords to look up and cluster
    #[arg(long)]
    pub serp_limit: Option<usize>,
    /// Number of SERP lookups allowed in flight
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Seconds between two SERP requests
    #[arg(long)]
    pub spacing_secs: Option<f64>,
}

impl ResearchArgs {
    /// Applies the flags given on the command line on top of `config`.
    pub fn apply(&self, config: &mut ResearchConfig) -> Result<()> {
        if let Some(location) = &self.location {
            config.location = location.clone();
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(min_volume) = self.min_volume {
            config.min_search_volume = min_volume;
        }
        if let Some(max_competition) = self.max_competition {
            config.max_competition = max_competition;
        }
        if let Some(threshold) = self.threshold {
            config.overlap_threshold = threshold;
        }
        if let Some(limit) = self.limit {
            config.expansion_limit = limit;
        }
        if let Some(serp_limit) = self.serp_limit {
            config.serp_lookup_limit = serp_limit;
        }
        if let Some(concurrency) = self.concurrency {
            config.serp_concurrency = concurrency;
        }
        if let Some(secs) = self.spacing_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(Error::Config(format!("--spacing-secs must be a non-negative number, got {}", secs)));
            }
            config.serp_spacing = Duration::from_secs_f64(secs);
        }
        config.validate()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ResearchCommands {
    /// Expand a seed keyword and cluster the results
    Research(ResearchArgs),
    /// List stored research runs
    Runs,
}

/// Keyword and SERP providers for a research run.
pub struct Sources {
    pub keywords: Arc<dyn KeywordSource>,
    pub serps: Arc<dyn SerpSource>,
}

/// The collaborators a command runs against. `sources` is only needed by
/// `research`.
pub struct CommandContext {
    pub sources: Option<Sources>,
    pub storage: Arc<dyn ResearchStorage>,
    pub config: ResearchConfig,
    /// Overrides the spacing policy derived from the config.
    pub pacer: Option<Arc<dyn Pacer>>,
}

pub async fn handle_command(command: ResearchCommands, context: CommandContext) -> Result<()> {
    match command {
        ResearchCommands::Research(args) => {
            let mut config = context.config;
            args.apply(&mut config)?;
            let sources = context
                .sources
                .ok_or_else(|| Error::Config("research needs keyword and SERP sources".to_string()))?;

            let mut researcher = Researcher::new(sources.keywords, sources.serps, config)?.with_storage(context.storage);
            if let Some(pacer) = context.pacer {
                researcher = researcher.with_pacer(pacer);
            }

            let report = researcher.run(&args.seed).await?;
            match (&report.status, &report.outcome) {
                (RunStatus::Completed, Some(outcome)) => {
                    print!("{}", format_summary_table(outcome));
                    info!("📦 Run {} stored", report.run_id);
                    Ok(())
                }
                _ => Err(Error::External(anyhow::anyhow!(
                    "research run {} failed: {}",
                    report.run_id,
                    report.error.as_deref().unwrap_or("unknown error")
                ))),
            }
        }
        ResearchCommands::Runs => {
            let mut runs = context.storage.list_runs().await?;
            runs.sort_by_key(|r| r.started_at);
            if runs.is_empty() {
                println!("No research runs stored");
            }
            for run in &runs {
                println!("{}", format_run_line(run));
            }
            Ok(())
        }
    }
}

/// Renders cluster summaries as a plain text table, one row per cluster.
pub fn format_summary_table(outcome: &ResearchOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<40} {:>8} {:>12} {:>12} {:>8}",
        "Cluster", "Pillar Keyword", "Keywords", "Avg Volume", "Total Volume", "Avg Comp"
    );
    for summary in &outcome.summaries {
        let _ = writeln!(
            out,
            "{:<12} {:<40} {:>8} {:>12.1} {:>12} {:>8.3}",
            summary.cluster,
            summary.pillar_keyword,
            summary.keyword_count,
            summary.avg_search_volume,
            summary.total_search_volume,
            summary.avg_competition
        );
    }
    let _ = writeln!(
        out,
        "{} keywords in {} clusters",
        outcome.total_keywords, outcome.total_clusters
    );
    out
}

fn format_run_line(run: &RunReport) -> String {
    let detail = match (&run.outcome, &run.error) {
        (Some(outcome), _) => format!("{} clusters, {} keywords", outcome.total_clusters, outcome.total_keywords),
        (None, Some(error)) => error.clone(),
        (None, None) => String::new(),
    };
    format!(
        "{}  {:<9}  {}  {:<30}  {}",
        run.run_id,
        run.status.to_string(),
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        run.seed_keyword,
        detail
    )
}
