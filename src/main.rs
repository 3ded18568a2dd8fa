use billmend::utils::error::{ErrorSeverity, ReconError};
use billmend::utils::{logger, validation::Validate};
use billmend::{CliConfig, LocalStorage, MergePipeline, PatchPipeline, ReconEngine};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting billmend CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 所有路徑都相對於工作目錄解析
    let storage = LocalStorage::new(".".to_string());

    // 給了編輯檔就套用編輯，否則執行合併
    let run_result = if config.edits.is_some() {
        tracing::info!("📝 Edits file given, running the patch pipeline");
        let pipeline = PatchPipeline::new(storage, config);
        ReconEngine::new_with_monitoring(pipeline, monitor_enabled)
            .run()
            .await
    } else {
        let pipeline = MergePipeline::new(storage, config);
        ReconEngine::new_with_monitoring(pipeline, monitor_enabled)
            .run()
            .await
    };

    match run_result {
        Ok(output_path) => {
            tracing::info!("✅ Reconciliation completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Reconciliation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            report_failure_and_exit(&e);
        }
    }

    Ok(())
}

/// 記錄詳細錯誤信息並依嚴重程度決定退出碼
fn report_failure_and_exit(e: &ReconError) {
    tracing::error!(
        "❌ Reconciliation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

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
