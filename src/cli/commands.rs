//! Command implementations for the ping processor CLI
//!
//! Each subcommand wires the same pipeline: load reference tables, shape
//! envelope files concurrently, merge the per-file partial results, then
//! produce the dataset CSVs and print the diagnostics report.

use crate::app::adapters::filesystem;
use crate::app::models::{Cohort, PingIdentity};
use crate::app::services::aggregator::{CountTable, OutputKey, RowTag, RunCounters, expand_all};
use crate::app::services::normalizer::{
    summarize_country, summarize_device, summarize_operator, summarize_os,
};
use crate::app::services::payload_shaper::{AppUsageRow, PayloadShaper, SearchRow, ShapedUsage};
use crate::app::services::reference_data::{self, ReferenceData};
use crate::app::services::session_reconciler::{
    InfoRow, ReconcileOutcome, ReconcileStats, SessionReconciler, aggregate_dogfood_appusage,
    summarize_dogfood_devices,
};
use crate::cli::args::{AppusageArgs, Commands, CommonArgs, FtuArgs};
use crate::config::{Config, DuplicatePolicy};
use crate::constants::{
    APP_CSV_FILENAME, AU_APP_CSV_HEADERS, AU_DOGFOOD_APPUSAGE_CSV_HEADERS,
    AU_DOGFOOD_DETAILS_CSV_HEADERS, AU_INFO_CSV_HEADERS, AU_INFO_FIELD_KEYS,
    AU_SEARCH_CSV_HEADERS, COUNTER_RECORDS, DASHBOARD_CSV_FILENAME, DASHBOARD_CSV_HEADERS,
    DOGFOOD_APPUSAGE_CSV_FILENAME, DOGFOOD_DETAILS_CSV_FILENAME, DUMP_CSV_FILENAME,
    FTU_DUMP_CSV_HEADERS, FTU_FINAL_KEYS, INFO_CSV_FILENAME, SEARCH_CSV_FILENAME, conditions,
    fields,
};
use crate::{Error, Result};
use colored::Colorize;
use futures::StreamExt;
use futures::stream;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Filename of the conflict partition written alongside the info table
const INFO_CONFLICTS_CSV_FILENAME: &str = "info_conflicts.csv";

/// Run the selected subcommand
pub async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Ftu(args) => run_ftu(&args).await,
        Commands::Appusage(args) => run_appusage(&args).await,
    }
}

// =============================================================================
// FTU Command
// =============================================================================

/// Process FTU activation pings into the dump and dashboard CSVs
pub async fn run_ftu(args: &FtuArgs) -> Result<()> {
    let mut config = base_config(&args.common);
    if let Some(days) = args.dashboard_window_days {
        config.windows.dashboard_window_days = days;
    }
    if let Some(days) = args.dump_window_days {
        config.windows.dump_window_days = days;
    }
    config.validate()?;

    let tables = Arc::new(reference_data::load_from_dir(&args.common.lookup_dir())?);
    let shaper = PayloadShaper::new(tables.clone(), &config.normalizer)?;
    let files = filesystem::discover_envelope_files(&args.common.input)?;

    info!("Processing {} FTU envelope files", files.len());

    // Shape files concurrently; each worker builds a partial count table
    // that merges additively into the global one.
    let worker_shaper = shaper.clone();
    let partials = process_files(
        files,
        config.workers,
        config.show_progress,
        "Shaping FTU payloads",
        move |path| shape_ftu_file(&path, &worker_shaper),
    )
    .await?;

    let mut table = CountTable::new();
    let mut counters = RunCounters::new();
    for (partial_table, partial_counters) in partials {
        table.merge(partial_table);
        counters.merge(partial_counters);
    }

    // Split the counted tuples into the window-limited datasets.
    let latest = config.windows.latest_date();
    let earliest_dashboard = config.windows.earliest_dashboard_date();
    let earliest_dump = config.windows.earliest_dump_date();

    let submission_idx = field_index(fields::SUBMISSION_DATE);
    let valid_os = config.normalizer.valid_os_regex()?;

    let mut dump_rows = Vec::new();
    let mut dashboard = CountTable::new();

    for (key, count) in table.into_sorted_rows() {
        let record_date = &key.fields[submission_idx];
        if record_date.is_empty() {
            continue;
        }
        if record_date.as_str() > latest.as_str() || record_date.as_str() < earliest_dashboard.as_str() {
            continue;
        }

        accumulate_dashboard_row(
            &mut dashboard,
            &key,
            count,
            &valid_os,
            &tables,
            args.rollup,
        );

        if record_date.as_str() >= earliest_dump.as_str() {
            let mut row = key.fields;
            row.push(count.to_string());
            dump_rows.push(row);
        }
    }

    let dump_written = filesystem::write_csv(
        &args.common.output.join(DUMP_CSV_FILENAME),
        FTU_DUMP_CSV_HEADERS,
        dump_rows,
    )?;
    println!("Wrote dump CSV: {} rows", dump_written);

    let dashboard_rows = dashboard.into_sorted_rows().into_iter().map(|(key, count)| {
        let mut row = key.fields;
        row.push(count.to_string());
        row
    });
    let dashboard_written = filesystem::write_csv(
        &args.common.output.join(DASHBOARD_CSV_FILENAME),
        DASHBOARD_CSV_HEADERS,
        dashboard_rows,
    )?;
    println!("Wrote dashboard CSV: {} rows", dashboard_written);

    print_diagnostics(&counters);
    Ok(())
}

/// Shape one FTU envelope file into a partial count table
fn shape_ftu_file(path: &Path, shaper: &PayloadShaper) -> Result<(CountTable, RunCounters)> {
    let mut table = CountTable::new();
    let mut counters = RunCounters::new();

    for line in filesystem::read_envelope_lines(path)? {
        counters.increment(COUNTER_RECORDS, 1);
        let envelope = match line {
            Ok(envelope) => envelope,
            Err(reason) => {
                counters.record_condition(reason.condition());
                continue;
            }
        };

        match shaper.shape_ftu(&envelope) {
            Ok(shaped) => {
                for diagnostic in shaped.diagnostics {
                    counters.record_condition(diagnostic);
                }
                table.record(OutputKey::new(
                    RowTag::Datum,
                    shaped.record.to_ordered_values(FTU_FINAL_KEYS),
                ));
            }
            Err(reason) => counters.record_condition(reason.condition()),
        }
    }

    Ok((table, counters))
}

/// Summarize one counted FTU tuple into the dashboard dataset
fn accumulate_dashboard_row(
    dashboard: &mut CountTable,
    key: &OutputKey,
    count: u64,
    valid_os: &regex::Regex,
    tables: &ReferenceData,
    rollup: bool,
) {
    let field = |name: &str| key.fields[field_index(name)].as_str();

    let date = field(fields::SUBMISSION_DATE).to_string();
    let os = summarize_os(field(fields::OS), valid_os);
    let country = summarize_country(field(fields::COUNTRY), tables);
    let device = summarize_device(field(fields::PRODUCT_MODEL), tables);
    let operator = summarize_operator(
        field(fields::ICC_NETWORK),
        field(fields::ICC_NAME),
        field(fields::NETWORK_NETWORK),
        field(fields::NETWORK_NAME),
        tables,
    );

    let dimensions = [
        (fields::OS, os),
        (fields::COUNTRY, country),
        ("device", device),
        (fields::OPERATOR, operator),
    ];

    if rollup {
        for tuple in expand_all(&dimensions) {
            let mut row = vec![date.clone()];
            row.extend(tuple);
            dashboard.add(OutputKey::new(RowTag::Datum, row), count);
        }
    } else {
        let mut row = vec![date];
        row.extend(dimensions.into_iter().map(|(_, value)| value));
        dashboard.add(OutputKey::new(RowTag::Datum, row), count);
    }
}

// =============================================================================
// AU Command
// =============================================================================

/// Process AU session pings into the info/app/search CSVs
pub async fn run_appusage(args: &AppusageArgs) -> Result<()> {
    let mut config = base_config(&args.common);
    if let Some(tolerance) = args.overlap_tolerance_ms {
        config.reconciler.overlap_tolerance_ms = tolerance;
    }
    if args.keep_latest_submission {
        config.reconciler.duplicate_policy = DuplicatePolicy::LatestSubmission;
    }
    if let Some(pattern) = &args.dogfood_pattern {
        config.reconciler.dogfood_device_pattern = pattern.clone();
    }
    config.validate()?;

    let tables = Arc::new(reference_data::load_from_dir(&args.common.lookup_dir())?);
    let shaper = PayloadShaper::new(tables, &config.normalizer)?;
    let files = filesystem::discover_envelope_files(&args.common.input)?;

    info!("Processing {} AU envelope files", files.len());

    let worker_shaper = shaper.clone();
    let partials = process_files(
        files,
        config.workers,
        config.show_progress,
        "Shaping AU payloads",
        move |path| shape_appusage_file(&path, &worker_shaper),
    )
    .await?;

    let mut counters = RunCounters::new();
    let mut info_rows = Vec::new();
    let mut derived: HashMap<PingIdentity, (Vec<AppUsageRow>, Vec<SearchRow>)> = HashMap::new();
    for (usages, partial_counters) in partials {
        counters.merge(partial_counters);
        for shaped in usages {
            info_rows.push(InfoRow {
                identity: shaped.identity.clone(),
                submission_date: shaped.submission_date,
                record: shaped.record,
            });
            // Derived rows from duplicate submissions are identical; the
            // first occurrence is enough.
            derived
                .entry(shaped.identity)
                .or_insert((shaped.apps, shaped.searches));
        }
    }

    // Reconciliation requires full visibility into each device's sessions,
    // so it runs once over the complete info-row set.
    let reconciler = SessionReconciler::new(&config.reconciler)?;
    let outcome = reconciler.reconcile(info_rows);

    write_appusage_tables(&args.common.output, &outcome, &derived, &reconciler)?;

    print_diagnostics(&counters);
    print_reconcile_report(&outcome.stats);
    Ok(())
}

/// Shape one AU envelope file
fn shape_appusage_file(
    path: &Path,
    shaper: &PayloadShaper,
) -> Result<(Vec<ShapedUsage>, RunCounters)> {
    let mut usages = Vec::new();
    let mut counters = RunCounters::new();

    for line in filesystem::read_envelope_lines(path)? {
        counters.increment(COUNTER_RECORDS, 1);
        let envelope = match line {
            Ok(envelope) => envelope,
            Err(reason) => {
                counters.record_condition(reason.condition());
                continue;
            }
        };

        match shaper.shape_appusage(&envelope) {
            Ok(shaped) => {
                for diagnostic in &shaped.diagnostics {
                    counters.record_condition(diagnostic.clone());
                }
                usages.push(shaped);
            }
            Err(reason) => counters.record_condition(reason.condition()),
        }
    }

    Ok((usages, counters))
}

/// Write the info/app/search tables plus the conflict partition
fn write_appusage_tables(
    output: &Path,
    outcome: &ReconcileOutcome,
    derived: &HashMap<PingIdentity, (Vec<AppUsageRow>, Vec<SearchRow>)>,
    reconciler: &SessionReconciler,
) -> Result<()> {
    let mut kept = outcome.kept.clone();
    kept.sort_by(|a, b| a.identity.cmp(&b.identity));

    let info_rows = kept.iter().map(|row| {
        let mut values = vec![
            row.identity.device_id.clone(),
            row.identity.start.to_string(),
            row.identity.stop.to_string(),
            row.submission_date.clone(),
        ];
        values.extend(row.record.to_ordered_values(AU_INFO_FIELD_KEYS));
        values.push((row.cohort == Cohort::Dogfood).to_string());
        values.push(row.total_submissions.to_string());
        values
    });
    let info_written =
        filesystem::write_csv(&output.join(INFO_CSV_FILENAME), AU_INFO_CSV_HEADERS, info_rows)?;
    println!("Wrote info CSV: {} rows", info_written);

    // Derived rows are only emitted for identities that survived
    // reconciliation: conflicted identities are ambiguous and pruned
    // pings are gone.
    let mut app_rows = Vec::new();
    let mut search_rows = Vec::new();
    for row in &kept {
        let Some((apps, searches)) = derived.get(&row.identity) else {
            continue;
        };
        for app in apps {
            app_rows.push(vec![
                row.identity.device_id.clone(),
                row.identity.start.to_string(),
                row.identity.stop.to_string(),
                app.usage_date.clone(),
                app.app_url.clone(),
                app.usage_time_s.to_string(),
                app.invocations.to_string(),
                app.installs.to_string(),
                app.uninstalls.to_string(),
                app.activities.clone(),
            ]);
        }
        for search in searches {
            search_rows.push(vec![
                row.identity.device_id.clone(),
                row.identity.start.to_string(),
                row.identity.stop.to_string(),
                search.search_date.clone(),
                search.provider.clone(),
                search.count.to_string(),
            ]);
        }
    }

    let app_written =
        filesystem::write_csv(&output.join(APP_CSV_FILENAME), AU_APP_CSV_HEADERS, app_rows)?;
    println!("Wrote app CSV: {} rows", app_written);

    let search_written = filesystem::write_csv(
        &output.join(SEARCH_CSV_FILENAME),
        AU_SEARCH_CSV_HEADERS,
        search_rows,
    )?;
    println!("Wrote search CSV: {} rows", search_written);

    // Dogfood devices get per-device summaries and aggregated app usage.
    let summaries = summarize_dogfood_devices(&kept);
    if !summaries.is_empty() {
        let mut details_headers: Vec<&str> = AU_DOGFOOD_DETAILS_CSV_HEADERS.to_vec();
        details_headers.extend(&AU_INFO_CSV_HEADERS[4..4 + AU_INFO_FIELD_KEYS.len()]);

        let details_rows = summaries.iter().map(|summary| {
            let mut values = vec![
                summary.device_id.clone(),
                summary.earliest_start.to_string(),
                summary.latest_stop.to_string(),
                summary.earliest_submission.clone(),
                summary.latest_submission.clone(),
                summary.num_pings.to_string(),
                summary.changed_info.to_string(),
            ];
            values.extend(summary.latest_info.iter().cloned());
            values
        });
        let details_written = filesystem::write_csv(
            &output.join(DOGFOOD_DETAILS_CSV_FILENAME),
            &details_headers,
            details_rows,
        )?;
        println!("Wrote dogfood details CSV: {} rows", details_written);

        let usage_rows = aggregate_dogfood_appusage(&kept, derived)
            .into_iter()
            .map(|usage| {
                vec![
                    usage.device_id,
                    usage.usage_date,
                    usage.app_url,
                    usage.usage_time_s.to_string(),
                    usage.invocations.to_string(),
                    usage.installs.to_string(),
                    usage.uninstalls.to_string(),
                    usage.activities,
                ]
            });
        let usage_written = filesystem::write_csv(
            &output.join(DOGFOOD_APPUSAGE_CSV_FILENAME),
            AU_DOGFOOD_APPUSAGE_CSV_HEADERS,
            usage_rows,
        )?;
        println!("Wrote dogfood app-usage CSV: {} rows", usage_written);
    }

    // Conflicting variants are surfaced as their own partition for manual
    // inspection; no winner was picked for them.
    if !outcome.conflicts.is_empty() {
        let conflict_headers = &AU_INFO_CSV_HEADERS[..AU_INFO_CSV_HEADERS.len() - 1];
        let mut conflicts = outcome.conflicts.clone();
        conflicts.sort_by(|a, b| a.identity.cmp(&b.identity));
        let conflict_rows = conflicts.iter().map(|row| {
            let cohort = reconciler.cohort(&row.identity.device_id);
            let mut values = vec![
                row.identity.device_id.clone(),
                row.identity.start.to_string(),
                row.identity.stop.to_string(),
                row.submission_date.clone(),
            ];
            values.extend(row.record.to_ordered_values(AU_INFO_FIELD_KEYS));
            values.push((cohort == Cohort::Dogfood).to_string());
            values
        });
        let conflicts_written = filesystem::write_csv(
            &output.join(INFO_CONFLICTS_CSV_FILENAME),
            conflict_headers,
            conflict_rows,
        )?;
        println!(
            "{}",
            format!(
                "Some payloads had multiple unique info records; wrote {} conflict rows",
                conflicts_written
            )
            .yellow()
        );
    }

    Ok(())
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Build the run configuration from the shared CLI options
fn base_config(common: &CommonArgs) -> Config {
    let mut config = Config::default();
    if let Some(workers) = common.workers {
        config = config.with_workers(workers);
    }
    if common.no_progress {
        config = config.without_progress();
    }
    config
}

/// Process files concurrently on blocking worker threads.
///
/// Each file is handled independently; results arrive in completion order,
/// which is fine because every caller merges them additively.
async fn process_files<T, F>(
    files: Vec<PathBuf>,
    workers: usize,
    show_progress: bool,
    label: &str,
    handler: F,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&Path) -> Result<T> + Send + Sync + Clone + 'static,
{
    let progress = show_progress.then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(label.to_string());
        pb
    });

    let mut tasks = stream::iter(files.into_iter().map(|path| {
        let handler = handler.clone();
        tokio::task::spawn_blocking(move || handler(&path))
    }))
    .buffer_unordered(workers.max(1));

    let mut results = Vec::new();
    while let Some(joined) = tasks.next().await {
        let result = joined.map_err(|e| Error::task(e.to_string()))??;
        results.push(result);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    Ok(results)
}

/// Index of a field within the FTU output schema
fn field_index(name: &str) -> usize {
    FTU_FINAL_KEYS
        .iter()
        .position(|key| *key == name)
        .expect("field must be part of the FTU schema")
}

/// Print run counters and condition counts
fn print_diagnostics(counters: &RunCounters) {
    println!("\n{}", "Counters:".bold());
    for (name, group, count) in counters.sorted_counters() {
        match group {
            Some(group) => println!("{} | {} :  {}", name, group, count),
            None => println!("{} :  {}", name, count),
        }
    }

    println!("\n{}", "Error conditions:".bold());
    if !counters.has_conditions() {
        println!("{}", "none".green());
    }
    for (condition, count) in counters.sorted_conditions() {
        println!("{} :  {}", condition, count);
    }
}

/// Print the reconciliation report: duplicates per cohort and timeline
/// conditions, with per-device detail for dogfood devices
fn print_reconcile_report(stats: &ReconcileStats) {
    let dogfood = stats.duplicates(Cohort::Dogfood);
    let general = stats.duplicates(Cohort::General);
    if dogfood.payloads > 0 || general.payloads > 0 {
        println!("\n{}", "Duplicates:".bold());
        for (group, duplicates) in [(Cohort::Dogfood, dogfood), (Cohort::General, general)] {
            if duplicates.payloads > 0 {
                println!(
                    "* {} payloads had duplicate submissions in the {} group; \
                     {} duplicate records were removed for these payloads.",
                    duplicates.payloads,
                    group,
                    duplicates.removed()
                );
            }
        }
    }

    if stats.conditions.is_empty() {
        return;
    }

    println!("\n{}", "Overlaps:".bold());
    let described: [(&str, &str); 4] = [
        (conditions::CLOCK_SKEW, "pings with clock skew were removed"),
        (conditions::NESTED, "nested pings were removed"),
        (
            conditions::OVERLAP,
            "pings had non-negligible overlap with the previous ping (but were not removed)",
        ),
        (
            conditions::NEGLIGIBLE_OVERLAP,
            "pings had negligible overlap with the previous ping (but were not removed)",
        ),
    ];
    for (condition, description) in described {
        let Some(condition_stats) = stats.conditions.get(condition) else {
            continue;
        };
        let dogfood_devices = condition_stats.dogfood_devices();
        let addendum = if dogfood_devices.is_empty() {
            ".".to_string()
        } else {
            format!(
                ", including {} pings from {} dogfood devices:",
                condition_stats.dogfood_pings(),
                dogfood_devices.len()
            )
        };
        println!(
            "* {} {} from {} devices{}",
            condition_stats.total_pings(),
            description,
            condition_stats.device_count(),
            addendum
        );
        for device in dogfood_devices {
            println!("\t{}", device);
        }
    }
}
