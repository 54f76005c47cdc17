//! Пакетный прогон парсера по каталогу с модулями BSL.

use anyhow::{Context, Result};
use bsl_parser::{parse_module, read_bsl_file};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use walkdir::WalkDir;

/// Сколько первых ошибок показывать в отчёте.
const MAX_REPORTED_FAILURES: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "parseall", about = "Parse every BSL file under a directory")]
struct Args {
    /// Каталог с исходниками
    dir: PathBuf,

    /// Расширение файлов
    #[arg(long, default_value = "bsl")]
    ext: String,

    /// Число потоков (0 — по числу ядер)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Подробный вывод
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.jobs)
            .build_global()
            .context("failed to configure the thread pool")?;
    }

    let files: Vec<PathBuf> = WalkDir::new(&args.dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case(&args.ext))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    println!("Found {} {} files", files.len(), args.ext);

    let failed_files: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let start = Instant::now();

    let (success, failed) = files
        .par_iter()
        .map(|path| {
            let text = match read_bsl_file(path) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "read failed");
                    return (0u64, 1u64);
                }
            };
            match parse_module(&text) {
                Ok(_) => (1, 0),
                Err(err) => {
                    let mut failures = failed_files.lock().unwrap();
                    if failures.len() < MAX_REPORTED_FAILURES {
                        failures.push(format!("{}: {}", path.display(), err));
                    }
                    (0, 1)
                }
            }
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    let elapsed = start.elapsed();

    println!("Success: {success}");
    println!("Failed:  {failed}");
    println!("Time:    {elapsed:.2?}");
    if elapsed.as_secs_f64() > 0.0 {
        println!(
            "Speed:   {:.0} files/sec",
            (success + failed) as f64 / elapsed.as_secs_f64()
        );
    }

    let failures = failed_files.into_inner().unwrap();
    if !failures.is_empty() {
        println!("\nFirst failed files:");
        for failure in &failures {
            println!("   {failure}");
        }
    }

    Ok(())
}
