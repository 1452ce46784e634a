use anno_compare::{
    cache::ParseCache,
    config::CompareOptions,
    error::{CompareError, Result},
    evaluator::{aggregate, compare_logs, evaluate_at_thresholds, find_pair, pair_logs},
    frames,
    primary::compare_primary_labels,
    reconcile::MatchPolicy,
    sink::{ComparisonRecord, JsonLinesSink, RecordSink},
    table::{build_table, TableView},
    threshold::generate_threshold_range,
    types::AnnotationLog,
};
use clap::{Parser, Subcommand};
use polars::prelude::DataFrame;
use std::{path::Path, path::PathBuf, sync::Arc};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Minimum IoU for two boxes to be considered the same object
    #[clap(long, global = true, env = "ANNO_COMPARE_THRESHOLD")]
    threshold: Option<f64>,

    /// Also count images annotated in only one file
    #[clap(long, global = true)]
    all_images: bool,

    /// Match acceptance policy: greedy or one_to_one
    #[clap(long, global = true, env = "ANNO_COMPARE_POLICY")]
    policy: Option<MatchPolicy>,

    /// JSON file with comparison options; flags override its values
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Append a record of each summary run to this JSON-lines file
    #[clap(long, global = true)]
    journal: Option<PathBuf>,

    /// User name stored in journal records
    #[clap(long, global = true, env = "ANNO_COMPARE_USER")]
    user: Option<String>,

    /// Write result tables as CSV files into this directory
    #[clap(long, global = true)]
    csv_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Aggregate agreement statistics over every image both files annotate.
    Summary {
        file1: PathBuf,
        file2: PathBuf,

        /// Print JSON instead of text
        #[clap(long)]
        json: bool,
    },
    /// List the keys of the image pairs shared by both files.
    Pairs { file1: PathBuf, file2: PathBuf },
    /// Compare one image pair: statistics and comparison table.
    Pair {
        file1: PathBuf,
        file2: PathBuf,

        /// Pair key as printed by `pairs`
        key: String,

        /// Only rows of this match group
        #[clap(long)]
        group: Option<u32>,

        /// Only rows of these box ids (repeatable)
        #[clap(long = "box-id")]
        box_ids: Vec<String>,

        /// Only unmatched boxes
        #[clap(long)]
        unmatched: bool,

        /// Print JSON instead of text
        #[clap(long)]
        json: bool,
    },
    /// Primary-label consistency of logs joined by id.
    Primary {
        file1: PathBuf,
        file2: PathBuf,

        /// Print JSON instead of text
        #[clap(long)]
        json: bool,
    },
    /// Aggregate statistics over a range of IoU thresholds.
    Sweep {
        file1: PathBuf,
        file2: PathBuf,

        #[clap(long, default_value_t = 0.1)]
        start: f64,

        #[clap(long, default_value_t = 0.9)]
        end: f64,

        #[clap(long, default_value_t = 9)]
        steps: usize,

        /// Print JSON instead of text
        #[clap(long)]
        json: bool,
    },
}

fn resolve_options(args: &Args) -> Result<CompareOptions> {
    let mut options = match &args.config {
        Some(path) => CompareOptions::from_file(path)?,
        None => CompareOptions::default(),
    };
    if let Some(threshold) = args.threshold {
        options.iou_threshold = threshold;
    }
    if let Some(policy) = args.policy {
        options.policy = policy;
    }
    if args.all_images {
        options.only_shared_images = false;
    }
    options.validate()?;
    log::debug!("Using options {:?}", options);
    Ok(options)
}

fn load_pair(
    cache: &mut ParseCache,
    file1: &Path,
    file2: &Path,
) -> Result<(Arc<Vec<AnnotationLog>>, Arc<Vec<AnnotationLog>>)> {
    let logs1 = cache.load_file(file1)?;
    let logs2 = cache.load_file(file2)?;
    log::info!(
        "Loaded {} logs from {} and {} logs from {}",
        logs1.len(),
        file1.display(),
        logs2.len(),
        file2.display()
    );
    Ok((logs1, logs2))
}

fn write_frame(csv_dir: Option<&Path>, name: &str, mut df: DataFrame) -> Result<()> {
    if let Some(dir) = csv_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        frames::write_csv(&mut df, &path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn handle_summary(
    args: &Args,
    options: &CompareOptions,
    cache: &mut ParseCache,
    file1: &Path,
    file2: &Path,
    json: bool,
) -> Result<()> {
    let (logs1, logs2) = load_pair(cache, file1, file2)?;
    let stats = aggregate(&logs1, &logs2, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", stats.summary_string());
    }

    let csv_dir = args.csv_dir.as_deref();
    write_frame(csv_dir, "tag_confusion.csv", frames::tag_confusion_frame(&stats.primary_confusion)?)?;
    write_frame(csv_dir, "value_confusion.csv", frames::value_confusion_frame(&stats.tertiary_confusion)?)?;
    write_frame(csv_dir, "option_stats.csv", frames::option_stats_frame(&stats.option_stats)?)?;

    if let Some(journal) = &args.journal {
        let mut record =
            ComparisonRecord::new(file_label(file1), file_label(file2), options.iou_threshold, &stats);
        if let Some(user) = &args.user {
            record = record.with_user(user.clone());
        }
        let mut sink = JsonLinesSink::open(journal)?;
        sink.append(record)?;
    }

    Ok(())
}

fn handle_pairs(cache: &mut ParseCache, file1: &Path, file2: &Path) -> Result<()> {
    let (logs1, logs2) = load_pair(cache, file1, file2)?;
    let pairs = pair_logs(&logs1, &logs2);
    if pairs.is_empty() {
        log::warn!("No image is annotated in both files");
    }
    for pair in pairs {
        println!("{}", pair.key);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_pair(
    args: &Args,
    options: &CompareOptions,
    cache: &mut ParseCache,
    file1: &Path,
    file2: &Path,
    key: &str,
    view: TableView,
    json: bool,
) -> Result<()> {
    let (logs1, logs2) = load_pair(cache, file1, file2)?;
    let pairs = pair_logs(&logs1, &logs2);
    let pair = find_pair(&pairs, key)?;
    let comparison = compare_logs(pair.log1, pair.log2, options)?;
    let rows = build_table(&comparison, &view);

    if json {
        let output = serde_json::json!({
            "key": pair.key,
            "stats": comparison.stats,
            "confused": comparison.reconciliation.confused,
            "rows": rows,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", pair.key);
        println!("{}", comparison.stats.summary_string());
        for confused in &comparison.reconciliation.confused {
            println!(
                "Confused: {} ({}) vs {} ({}), IoU {:.2}",
                confused.box_id1, confused.tag1, confused.box_id2, confused.tag2, confused.iou
            );
        }
        if rows.is_empty() {
            println!("No rows for this view");
        } else {
            println!("{}", frames::table_frame(&rows)?);
        }
    }

    write_frame(args.csv_dir.as_deref(), "table.csv", frames::table_frame(&rows)?)
}

fn handle_primary(
    args: &Args,
    cache: &mut ParseCache,
    file1: &Path,
    file2: &Path,
    json: bool,
) -> Result<()> {
    let (logs1, logs2) = load_pair(cache, file1, file2)?;
    let result = compare_primary_labels(&logs1, &logs2);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let stats = &result.stats;
        println!(
            "All rows:   {} / {} consistent ({:.2}%)",
            stats.match_overall, stats.total_overall, stats.consistency_overall
        );
        println!(
            "Valid rows: {} / {} consistent ({:.2}%)",
            stats.match_valid, stats.total_valid, stats.consistency_valid
        );
    }

    write_frame(args.csv_dir.as_deref(), "primary.csv", frames::primary_frame(&result)?)
}

#[allow(clippy::too_many_arguments)]
fn handle_sweep(
    args: &Args,
    options: &CompareOptions,
    cache: &mut ParseCache,
    file1: &Path,
    file2: &Path,
    start: f64,
    end: f64,
    steps: usize,
    json: bool,
) -> Result<()> {
    let (logs1, logs2) = load_pair(cache, file1, file2)?;
    let thresholds = generate_threshold_range(start, end, steps)?;
    let results = evaluate_at_thresholds(&logs1, &logs2, options, &thresholds)?;

    if json {
        let output: Vec<serde_json::Value> = results
            .iter()
            .map(|(threshold, stats)| serde_json::json!({ "threshold": threshold, "stats": stats }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", frames::sweep_frame(&results)?);
    }

    write_frame(args.csv_dir.as_deref(), "sweep.csv", frames::sweep_frame(&results)?)
}

fn main() -> std::result::Result<(), CompareError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = resolve_options(&args)?;
    let mut cache = ParseCache::new();

    match &args.cmd {
        Command::Summary { file1, file2, json } => {
            handle_summary(&args, &options, &mut cache, file1, file2, *json)
        }
        Command::Pairs { file1, file2 } => handle_pairs(&mut cache, file1, file2),
        Command::Pair {
            file1,
            file2,
            key,
            group,
            box_ids,
            unmatched,
            json,
        } => {
            let view = if !box_ids.is_empty() {
                TableView::BoxIds(box_ids.clone())
            } else if *unmatched {
                TableView::Unmatched(Vec::new())
            } else if group.is_some() {
                TableView::Group(*group)
            } else {
                TableView::All
            };
            handle_pair(&args, &options, &mut cache, file1, file2, key, view, *json)
        }
        Command::Primary { file1, file2, json } => {
            handle_primary(&args, &mut cache, file1, file2, *json)
        }
        Command::Sweep {
            file1,
            file2,
            start,
            end,
            steps,
            json,
        } => handle_sweep(
            &args, &options, &mut cache, file1, file2, *start, *end, *steps, *json,
        ),
    }
}
