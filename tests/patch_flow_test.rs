use anyhow::Result;
use billmend::domain::model::Scalar;
use billmend::{CliConfig, Document, LocalStorage, PatchPipeline, ReconEngine};
use tempfile::TempDir;

const TARGET: &str = r#"{
    "noteKind": "credit",
    "beneficiaries": [
        {
            "documentTypeCode": "CC",
            "documentNumber": "123",
            "services": {
                "consultations": [
                    {"serviceValue": 50, "copaymentValue": 5, "codeX": "A"}
                ]
            }
        },
        {
            "documentTypeCode": "TI",
            "documentNumber": "456",
            "services": {}
        }
    ]
}"#;

const SOURCE: &str = r#"{
    "beneficiaries": [
        {
            "documentTypeCode": "CC",
            "documentNumber": "123",
            "services": {
                "consultations": [
                    {"serviceValue": 40, "codeX": "A"}
                ]
            }
        },
        {
            "documentTypeCode": "TI",
            "documentNumber": "456",
            "services": {
                "medications": [
                    {"serviceValue": 30, "codeX": "B"}
                ]
            }
        }
    ]
}"#;

fn base_config(output_path: &str) -> CliConfig {
    CliConfig {
        target: "nota.json".to_string(),
        source: Some("factura.json".to_string()),
        edits: Some("edits.csv".to_string()),
        polarity: "keep".to_string(),
        output_path: output_path.to_string(),
        formats: vec!["json".to_string(), "summary".to_string()],
        bundle: false,
        bundle_name: "{job}_bundle.zip".to_string(),
        verbose: false,
        monitor: false,
    }
}

fn write_inputs(dir: &TempDir, edits: &str) -> Result<()> {
    std::fs::write(dir.path().join("nota.json"), TARGET)?;
    std::fs::write(dir.path().join("factura.json"), SOURCE)?;
    std::fs::write(dir.path().join("edits.csv"), edits)?;
    Ok(())
}

fn load_mended(dir: &TempDir) -> Result<Document> {
    let data = std::fs::read(dir.path().join("out/mended.json"))?;
    Ok(serde_json::from_slice(&data)?)
}

fn load_summary(dir: &TempDir) -> Result<serde_json::Value> {
    let data = std::fs::read(dir.path().join("out/run_summary.json"))?;
    Ok(serde_json::from_slice(&data)?)
}

#[tokio::test]
async fn test_patch_updates_existing_line() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(
        &temp_dir,
        "beneficiaryIndex,categoryLabel,lineIndex,desiredServiceValue\n0,consultations,0,75\n",
    )?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = PatchPipeline::new(storage, base_config("out"));

    ReconEngine::new(pipeline).run().await.unwrap();

    let document = load_mended(&temp_dir)?;
    let line = document.beneficiaries[0]
        .line_at("consultations", 0)
        .unwrap();
    assert_eq!(line["serviceValue"], Scalar::Int(75));
    // Fields other than the service value are untouched.
    assert_eq!(line["copaymentValue"], Scalar::Int(5));
    assert_eq!(line["codeX"], Scalar::Text("A".into()));

    let summary = load_summary(&temp_dir)?;
    assert_eq!(summary["mode"], "patch");
    assert_eq!(summary["patchReport"]["applied"], 1);
    assert_eq!(summary["patchReport"]["synthesized"], 0);

    Ok(())
}

#[tokio::test]
async fn test_patch_synthesizes_missing_line_from_source() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(
        &temp_dir,
        "beneficiaryIndex,categoryLabel,lineIndex,desiredServiceValue\n1,medications,0,60\n",
    )?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = PatchPipeline::new(storage, base_config("out"));

    ReconEngine::new(pipeline).run().await.unwrap();

    let document = load_mended(&temp_dir)?;
    let line = document.beneficiaries[1].line_at("medications", 0).unwrap();
    assert_eq!(line["serviceValue"], Scalar::Int(60));
    // The rest of the line was borrowed from the source at the same position.
    assert_eq!(line["codeX"], Scalar::Text("B".into()));

    let summary = load_summary(&temp_dir)?;
    assert_eq!(summary["patchReport"]["applied"], 1);
    assert_eq!(summary["patchReport"]["synthesized"], 1);

    Ok(())
}

#[tokio::test]
async fn test_bad_rows_are_reported_and_skipped() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(
        &temp_dir,
        concat!(
            "beneficiaryIndex,categoryLabel,lineIndex,desiredServiceValue\n",
            "9,consultations,0,75\n",
            "0,consultations,0,abc\n",
            "0,consultations,0,\n",
        ),
    )?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = PatchPipeline::new(storage, base_config("out"));

    ReconEngine::new(pipeline).run().await.unwrap();

    // Nothing changed on disk.
    let document = load_mended(&temp_dir)?;
    let line = document.beneficiaries[0]
        .line_at("consultations", 0)
        .unwrap();
    assert_eq!(line["serviceValue"], Scalar::Int(50));

    let summary = load_summary(&temp_dir)?;
    assert_eq!(summary["patchReport"]["applied"], 0);
    assert_eq!(summary["patchReport"]["skipped"], 3);
    let issues = summary["patchReport"]["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_missing_edits_file_fails_the_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("nota.json"), TARGET)?;
    std::fs::write(temp_dir.path().join("factura.json"), SOURCE)?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = PatchPipeline::new(storage, base_config("out"));

    let result = ReconEngine::new(pipeline).run().await;
    assert!(result.is_err());
    assert!(!temp_dir.path().join("out").exists());

    Ok(())
}
