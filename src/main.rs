use anyhow::Context;
use clap::Parser;
use market_gap_scanner::config::cli::{parse_keyword_lines, Cli, Command, LogFormat};
use market_gap_scanner::utils::error::ErrorSeverity;
use market_gap_scanner::utils::{logger, validation::Validate};
use market_gap_scanner::{GapAnalysisResult, MarketScanner, ResultsBackend, ScanError, ScannerConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("🚀 Starting market-gap scanner");

    // 載入並驗證配置
    let config = match ScannerConfig::load(cli.config.as_deref()).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with_error("Configuration validation failed", &e),
    };

    let mut scanner = match MarketScanner::from_config(&config) {
        Ok(scanner) => scanner,
        Err(e) => exit_with_error("Failed to initialize scanner", &e),
    };

    match cli.command {
        Command::Scan { keyword } => {
            scanner.log_backend_status().await;
            match scanner.scan_keyword(&keyword).await {
                Ok(result) => print_result(&scanner, &result),
                Err(e) => exit_with_error("Scan failed", &e),
            }
        }
        Command::Batch { input_file, output } => {
            let content = std::fs::read_to_string(&input_file)
                .with_context(|| format!("Failed to read keyword file {}", input_file.display()))?;
            let keywords = parse_keyword_lines(&content);
            tracing::info!("📁 Loaded {} keywords from {}", keywords.len(), input_file.display());

            scanner.log_backend_status().await;
            let mut results = scanner.scan_batch(&keywords).await;
            results.sort_by(|a, b| b.gap_score.total_cmp(&a.gap_score));

            for result in &results {
                print_result(&scanner, result);
            }

            if let Some(output) = output {
                write_csv(&output, &results)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!("📁 Results saved to: {}", output.display());
            }
        }
        Command::Related { keyword, market } => {
            let market = market.into();
            match scanner.related_queries(&keyword, market).await {
                Ok(related) if related.is_empty() => println!("No related queries for '{}'", keyword),
                Ok(related) => {
                    println!("Top ({}):", market);
                    for item in &related.top {
                        println!("   {} ({})", item.query, item.value);
                    }
                    println!("Rising ({}):", market);
                    for item in &related.rising {
                        println!("   {} (+{}%)", item.query, item.value);
                    }
                }
                Err(e) => exit_with_error("Related queries failed", &e),
            }
        }
        Command::Status => {
            println!("SERP backend: {}", scanner.backend());
            match scanner.account_status().await {
                Some(status) => {
                    println!("Plan: {}", status.plan);
                    println!("Searches this month: {}/{}", status.used, status.searches_per_month);
                    println!("Remaining: {}", status.remaining);
                }
                None if scanner.backend() == ResultsBackend::SerpApi => {
                    println!("⚠️ SerpAPI account status unavailable");
                }
                None => println!("No paid account configured (set SERPAPI_KEY to enable SerpAPI)"),
            }
        }
    }

    Ok(())
}

fn print_result(scanner: &MarketScanner, result: &GapAnalysisResult) {
    println!("{}", result);
    println!("   {}", scanner.insights_for(result));
}

fn write_csv(path: &Path, results: &[GapAnalysisResult]) -> Result<(), ScanError> {
    let mut writer = csv::Writer::from_path(path)?;

    if let Some(first) = results.first() {
        let headers: Vec<&str> = first.to_flat_record().iter().map(|(key, _)| *key).collect();
        writer.write_record(&headers)?;
    }
    for result in results {
        let values: Vec<String> = result
            .to_flat_record()
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        writer.write_record(&values)?;
    }

    writer.flush()?;
    Ok(())
}

fn exit_with_error(context: &str, e: &ScanError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
