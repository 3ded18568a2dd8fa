use billmend::app::pipelines::artifacts;
use billmend::config::job_config::JobConfig;
use billmend::utils::error::{ErrorSeverity, ReconError};
use billmend::utils::{logger, validation::Validate};
use billmend::{LocalStorage, MergePipeline, PatchPipeline, ReconEngine};
use clap::Parser;

#[derive(Parser)]
#[command(name = "billmend-job")]
#[command(about = "Billing document reconciliation driven by a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "mend-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override sign handling from config: keep, positive or negative
    #[arg(long)]
    polarity: Option<String>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 任務配置
    let mut config = match JobConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌；排程環境輸出結構化日誌
    if args.verbose {
        logger::init_cli_logger(true);
    } else {
        logger::init_job_logger(config.log_level());
    }

    tracing::info!("🚀 Starting billmend job runner");
    tracing::info!("📁 Loaded job file: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(polarity) = &args.polarity {
        let merge = config.merge.get_or_insert_with(|| {
            billmend::config::job_config::MergeSection {
                enabled: None,
                polarity: None,
            }
        });
        merge.polarity = Some(polarity.clone());
        tracing::info!("🔧 Polarity overridden to: {}", polarity);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_job(config, monitor_enabled).await {
        Ok(output_path) => {
            tracing::info!("✅ Job completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Job completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Job failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,      // 警告，但成功
                ErrorSeverity::Medium => 2,   // 配置錯誤
                ErrorSeverity::High => 1,     // 處理錯誤
                ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

/// 依序執行合併與補丁階段。兩個階段都要跑時，補丁階段讀取
/// 合併階段寫出的 JSON，打包壓縮只在最後一個階段進行。
async fn run_job(config: JobConfig, monitor_enabled: bool) -> Result<String, ReconError> {
    let storage = LocalStorage::new(".".to_string());
    let run_merge = config.merge_enabled();
    let run_patch = config.input.edits.is_some();

    if !run_merge && !run_patch {
        return Err(ReconError::ConfigError {
            message: "the job defines neither a source to merge nor edits to apply".to_string(),
        });
    }

    let mut last_output = String::new();

    if run_merge {
        let mut merge_config = config.clone();
        if run_patch {
            // 中間產物保持未壓縮，補丁階段才能直接讀取
            merge_config.output.compression = None;
        }

        tracing::info!("🔗 Stage 1/{}: merge", if run_patch { 2 } else { 1 });
        let pipeline = MergePipeline::new(storage.clone(), merge_config);
        last_output = ReconEngine::new_with_monitoring(pipeline, monitor_enabled)
            .run()
            .await?;
    }

    if run_patch {
        let mut patch_config = config;
        if run_merge {
            patch_config.input.target = format!(
                "{}/{}",
                patch_config.output.path,
                artifacts::DOCUMENT_JSON
            );
            tracing::info!(
                "🔗 Stage 2/2: patch on merged document {}",
                patch_config.input.target
            );
        }

        let pipeline = PatchPipeline::new(storage, patch_config);
        last_output = ReconEngine::new_with_monitoring(pipeline, monitor_enabled)
            .run()
            .await?;
    }

    Ok(last_output)
}

fn display_config_summary(config: &JobConfig, args: &Args) {
    println!("📋 Job Summary:");
    println!("  Job: {} v{}", config.job.name, config.job.version);
    println!("  Target: {}", config.input.target);

    if let Some(source) = &config.input.source {
        println!("  Source: {}", source);
    }
    if let Some(edits) = &config.input.edits {
        println!("  Edits: {}", edits);
    }

    println!("  Merge stage: {}", config.merge_enabled());
    println!("  Output: {}", config.output.path);
    println!("  Formats: {}", config.output.formats.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &JobConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📥 Input Analysis:");
    println!("  Target document: {}", config.input.target);
    match &config.input.source {
        Some(source) => println!("  Source document: {}", source),
        None => println!("  Source document: none (no merge material)"),
    }
    match &config.input.edits {
        Some(edits) => println!("  Edits file: {}", edits),
        None => println!("  Edits file: none"),
    }

    println!();
    println!("⚙️ Stages:");
    if config.merge_enabled() {
        println!("  🔗 Merge: backfill empty service blocks from the source");
        if let Some(polarity) = config.merge.as_ref().and_then(|m| m.polarity.as_deref()) {
            println!("  ➗ Polarity: {}", polarity);
        }
    }
    if config.input.edits.is_some() {
        println!("  🔗 Patch: apply the bulk-edit rows");
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output.path);
    println!("  Formats: {}", config.output.formats.join(", "));

    if let Some(compression) = &config.output.compression {
        if compression.enabled {
            println!(
                "  Compression: {} (ZIP)",
                compression.filename.as_deref().unwrap_or("{job}_{timestamp}.zip")
            );
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
