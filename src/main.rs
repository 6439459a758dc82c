use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use journeymap::{
    ColumnMapping, InputMode, MatcherConfig, RuleBook, RunOutputs, RunReport, Stage3Config,
    TermConfig, categorize, category_breakdown, execute_stage3, segment_file, speaker_term_buckets,
};

#[derive(Parser)]
#[command(name = "journeymap")]
#[command(author, version, about = "Categorize call transcripts into customer journeys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment transcripts, apply rules and write journey reports
    Analyze {
        /// Input table (JSON array of row objects)
        #[arg(short, long)]
        input: PathBuf,

        /// Rule table (JSON); defaults to rules/rules_embedded.json
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output directory for result tables
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Column holding the full raw transcript
        #[arg(long, default_value = "transcript")]
        raw_column: String,

        /// Optional call id column for raw transcripts
        #[arg(long)]
        call_id_column: Option<String>,

        /// Input already has one utterance per row
        #[arg(long)]
        structured: bool,

        /// Call id column (structured input)
        #[arg(long, default_value = "call_id")]
        call_id_col: String,

        /// Timestamp column (structured input)
        #[arg(long, default_value = "timestamp")]
        timestamp_col: String,

        /// Speaker column (structured input)
        #[arg(long, default_value = "speaker")]
        speaker_col: String,

        /// Text column (structured input)
        #[arg(long, default_value = "text")]
        text_col: String,

        /// Worker threads for rule matching (0 = all cores)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Include calls without rule hits in the journey summary
        #[arg(long)]
        include_unmatched: bool,

        /// Number of categories kept in the breakdown
        #[arg(long, default_value = "30")]
        top_categories: usize,

        /// Also write a human-readable transcript
        #[arg(long)]
        human_readable: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate the rule table and preview its first rules
    Rules {
        /// Rule table (JSON); defaults to rules/rules_embedded.json
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Number of rules to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

struct AnalyzeArgs {
    input: PathBuf,
    rules: Option<PathBuf>,
    output: PathBuf,
    mode: InputMode,
    matcher: MatcherConfig,
    top_categories: usize,
    render: Stage3Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            rules,
            output,
            raw_column,
            call_id_column,
            structured,
            call_id_col,
            timestamp_col,
            speaker_col,
            text_col,
            threads,
            include_unmatched,
            top_categories,
            human_readable,
            verbose,
        } => {
            setup_logging(verbose);
            let mode = if structured {
                InputMode::Structured(ColumnMapping {
                    call_id: call_id_col,
                    timestamp: timestamp_col,
                    speaker: speaker_col,
                    text: text_col,
                })
            } else {
                InputMode::Raw {
                    raw_column,
                    call_id_column,
                }
            };
            analyze(AnalyzeArgs {
                input,
                rules,
                output,
                mode,
                matcher: MatcherConfig {
                    threads,
                    include_unmatched_calls: include_unmatched,
                },
                top_categories,
                render: Stage3Config {
                    generate_machine: true,
                    generate_human: human_readable,
                },
            })
        }
        Commands::Rules {
            rules,
            limit,
            verbose,
        } => {
            setup_logging(verbose);
            preview_rules(rules.as_deref(), limit)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG overrides the verbosity flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_rulebook(path: Option<&Path>) -> Result<RuleBook> {
    let book = match path {
        Some(path) => RuleBook::load(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
            RuleBook::discover(&cwd)
        }
    };
    book.context("Failed to load rules")
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let started = Instant::now();

    // Rules first: nothing is read or matched against a broken rule table
    let rules = load_rulebook(args.rules.as_deref())?;

    // Stage 0: Segment transcripts
    info!("Stage 0: Splitting transcripts from {:?} into utterances...", args.input);
    let (table, segmentation) =
        segment_file(&args.input, &args.mode).context("Failed to segment input")?;

    let mut report = RunReport::new(table.height(), table.width());
    for warning in &segmentation.warnings {
        report.warnings.push(warning.to_string());
    }
    let utterances = segmentation.utterances;
    info!("Utterances extracted: {}", utterances.len());

    // Stage 1 & 2: Match rules and summarize journeys
    info!("Stage 1: Applying {} rules...", rules.len());
    let categorization = categorize(&utterances, &rules, &args.matcher);
    let term_buckets = speaker_term_buckets(&utterances, &TermConfig::default());
    let breakdown = category_breakdown(&categorization.matches, Some(args.top_categories));

    if categorization.matches.is_empty() {
        warn!("No rule matched any utterance");
    }
    for hits in breakdown.iter().take(5) {
        info!("  {}: {} hits", hits.category, hits.hits);
    }

    report.utterances = utterances.len();
    report.rules = rules.len();
    report.matches = categorization.matches.len();
    report.summarized_calls = categorization.summary.len();
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    // Stage 3: Rendering
    info!("Stage 3: Writing results to {:?}", args.output);
    let outputs = RunOutputs {
        utterances: &utterances,
        categorization: &categorization,
        term_buckets: &term_buckets,
        category_breakdown: &breakdown,
        report: &report,
    };
    let rendered = execute_stage3(&outputs, &args.output, &args.render)?;

    info!(
        "Complete: {} matches across {} calls, {} files written in {:.2}s",
        report.matches,
        report.summarized_calls,
        rendered.written.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(())
}

fn preview_rules(path: Option<&Path>, limit: usize) -> Result<()> {
    let rules = load_rulebook(path)?;

    println!("Rules loaded: {}", rules.len());
    println!("===============");
    for rule in rules.rules().iter().take(limit) {
        println!(
            "{} | {} | {} | {} | {}",
            rule.rule_id, rule.query_name, rule.industry, rule.category, rule.subcategory
        );
    }
    if rules.len() > limit {
        println!("... {} more", rules.len() - limit);
    }

    Ok(())
}
