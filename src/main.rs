use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use paperscreen::llm::Language;
use paperscreen::models::{FallbackPolicy, RecordId, ScreeningReport};
use paperscreen::screen::dedup::dropped_ids;
use paperscreen::screen::pipeline::prefilter;
use paperscreen::screen::{KeywordGate, Prefilter};
use paperscreen::table::list_spreadsheets;
use paperscreen::{
    check_output_path, load_table, output_path_for, write_table, ClaudeProvider, Config, Error,
    OpenAiProvider, PipelineConfig, ProviderKind, ScreeningPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "paperscreen")]
#[command(version = "0.1.0")]
#[command(about = "Deduplicate and relevance-filter a spreadsheet of paper records")]
struct Args {
    /// Spreadsheet to screen (.xlsx, .xls, .ods or .csv). Prompts for one when omitted.
    input: Option<PathBuf>,

    /// Directory to list spreadsheets from when no input is given
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Output file, .xlsx or .csv (defaults to filtered_output_step_gpt.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Console report format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Also write the JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Topic keyword; repeat to give several (overrides PAPERSCREEN_KEYWORDS)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Prompt and label language (ko, en)
    #[arg(long)]
    language: Option<String>,

    /// Drop records whose classification failed or could not be parsed
    #[arg(long)]
    exclude_unclassified: bool,

    /// Run only the rule-based stages; no LLM calls, no output file
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("paperscreen=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if !args.keywords.is_empty() {
        config.keywords = args.keywords.clone();
    }
    if let Some(ref language) = args.language {
        config.language = language.parse::<Language>()?;
    }
    if args.exclude_unclassified {
        config.fallback = FallbackPolicy::Exclude;
    }

    let input = match args.input.clone() {
        Some(path) => path,
        None => select_file(args.dir.as_deref().unwrap_or(&config.directory))?,
    };

    let output_path = args.output.clone().unwrap_or_else(|| output_path_for(&input));
    check_output_path(&output_path)?;

    let table = load_table(&input, &config.columns)?;
    tracing::info!("Columns: {:?}", table.columns);
    if table.is_empty() {
        tracing::warn!("No records found in {}", input.display());
    }

    let pipeline_config = PipelineConfig::from(&config);

    if args.dry_run {
        let prefilter = prefilter(table, &KeywordGate::new(&config.keywords));
        println!("{}", format_prefilter(&prefilter));
        return Ok(());
    }

    let api_key = config.require_api_key()?.to_string();
    let pipeline = match config.provider {
        ProviderKind::OpenAi => ScreeningPipeline::new(
            OpenAiProvider::new(api_key, config.model.clone())?,
            pipeline_config,
        ),
        ProviderKind::Anthropic => ScreeningPipeline::new(
            ClaudeProvider::new(api_key, config.model.clone())?,
            pipeline_config,
        ),
    };

    tracing::info!("Screening {}", input.display());
    let outcome = pipeline.run(table).await;

    write_table(&outcome.kept, &output_path)?;

    if let Some(ref path) = args.report {
        std::fs::write(path, serde_json::to_string_pretty(&outcome.report)?)?;
        tracing::info!("Report written to: {}", path.display());
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome.report)?),
        _ => println!("{}", format_text(&outcome.report, &output_path)),
    }

    Ok(())
}

fn select_file(dir: &Path) -> anyhow::Result<PathBuf> {
    let files = list_spreadsheets(dir)?;
    if files.is_empty() {
        anyhow::bail!("no spreadsheets found in {}", dir.display());
    }

    println!("Spreadsheets in {}:", dir.display());
    for (idx, file) in files.iter().enumerate() {
        let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("{}. {}", idx + 1, name);
    }
    print!("\nNumber of the file to screen: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let choice: usize = line
        .trim()
        .parse()
        .map_err(|_| Error::InvalidSelection(line.trim().to_string()))?;

    choice
        .checked_sub(1)
        .and_then(|i| files.get(i).cloned())
        .ok_or_else(|| Error::InvalidSelection(choice.to_string()).into())
}

fn format_ids(ids: &[RecordId]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", ids.join(", "))
}

fn format_prefilter(prefilter: &Prefilter) -> String {
    let mut output = String::new();
    let no_abstract: Vec<RecordId> = prefilter.no_abstract.iter().copied().collect();
    let no_keyword: Vec<RecordId> = prefilter.no_keyword.iter().copied().collect();

    output.push_str(&format!(
        "Duplicates dropped: {}\n",
        format_ids(&dropped_ids(&prefilter.duplicate_groups))
    ));
    output.push_str(&format!(
        "No abstract ({}): {}\n",
        no_abstract.len(),
        format_ids(&no_abstract)
    ));
    output.push_str(&format!(
        "No keyword ({}): {}\n",
        no_keyword.len(),
        format_ids(&no_keyword)
    ));
    output.push_str(&format!(
        "Would classify: {} record(s)\n",
        prefilter.candidates().len()
    ));
    output
}

fn format_text(report: &ScreeningReport, output_path: &Path) -> String {
    let mut output = String::new();

    output.push_str("\n=== Screening Report ===\n\n");
    output.push_str(&format!("Records loaded: {}\n", report.total_records));

    let groups: Vec<String> = report
        .duplicate_groups
        .iter()
        .map(|g| format_ids(&g.ids))
        .collect();
    output.push_str(&format!("\nDuplicate groups: {}\n", groups.join(" ")));
    output.push_str(&format!("Duplicate records: {}\n", report.duplicate_count()));

    let sections = [
        ("No abstract", &report.no_abstract),
        ("No keyword", &report.no_keyword),
        ("Unrelated", &report.unrelated),
        ("Mentioned only", &report.mentioned_only),
        ("Unparseable answer", &report.unparseable),
        ("Classification failed", &report.errored),
    ];
    output.push('\n');
    for (label, ids) in sections {
        output.push_str(&format!("{} ({}): {}\n", label, ids.len(), format_ids(ids)));
    }

    output.push_str(&format!("\nKept: {}\n", report.kept.len()));
    output.push_str(&format!("Saved to: {}\n", output_path.display()));
    output.push_str(&format!(
        "Finished at: {}\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}
