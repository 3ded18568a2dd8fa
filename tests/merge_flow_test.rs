use anyhow::Result;
use billmend::{CliConfig, Document, LocalStorage, MergePipeline, PatchPipeline, ReconEngine};
use tempfile::TempDir;

const TARGET: &str = r#"{
    "invoiceNumber": "F-901",
    "noteKind": "credit",
    "beneficiaries": [
        {
            "documentTypeCode": "CC",
            "documentNumber": "123",
            "services": {}
        },
        {
            "documentTypeCode": "TI",
            "documentNumber": "456",
            "services": {
                "procedures": [
                    {"serviceValue": 80, "copaymentValue": 5, "codeX": "P2"}
                ]
            }
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
                    {"serviceValue": 100, "copaymentValue": 10, "codeX": "C1"}
                ]
            }
        }
    ]
}"#;

fn base_config(output_path: &str) -> CliConfig {
    CliConfig {
        target: "nota.json".to_string(),
        source: Some("factura.json".to_string()),
        edits: None,
        polarity: "negative".to_string(),
        output_path: output_path.to_string(),
        formats: vec!["json".to_string(), "summary".to_string()],
        bundle: false,
        bundle_name: "{job}_bundle.zip".to_string(),
        verbose: false,
        monitor: false,
    }
}

fn write_inputs(dir: &TempDir) -> Result<()> {
    std::fs::write(dir.path().join("nota.json"), TARGET)?;
    std::fs::write(dir.path().join("factura.json"), SOURCE)?;
    Ok(())
}

#[tokio::test]
async fn test_merge_backfills_and_negates_monetary_values() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = MergePipeline::new(storage, base_config("out"));
    let engine = ReconEngine::new(pipeline);

    let output_path = engine.run().await.unwrap();
    assert_eq!(output_path, "out");

    let mended = std::fs::read(temp_dir.path().join("out/mended.json"))?;
    let document: Document = serde_json::from_slice(&mended)?;

    // Document-level metadata survives round-trip.
    assert_eq!(
        document.meta.get("invoiceNumber").and_then(|v| v.as_str()),
        Some("F-901")
    );

    // The empty entry received the source block with negated monetary values.
    let line = document.beneficiaries[0]
        .line_at("consultations", 0)
        .unwrap();
    assert_eq!(line["serviceValue"], billmend::domain::model::Scalar::Int(-100));
    assert_eq!(line["copaymentValue"], billmend::domain::model::Scalar::Int(-10));
    assert_eq!(line["codeX"], billmend::domain::model::Scalar::Text("C1".into()));

    // The already satisfied entry is untouched.
    let line = document.beneficiaries[1].line_at("procedures", 0).unwrap();
    assert_eq!(line["serviceValue"], billmend::domain::model::Scalar::Int(80));

    let summary: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("out/run_summary.json"))?)?;
    assert_eq!(summary["mode"], "merge");
    assert_eq!(summary["mergeSummary"]["modified"], 1);
    assert_eq!(summary["mergeSummary"]["fullMatches"], 1);
    assert_eq!(summary["mergeSummary"]["alreadySatisfied"], 1);
    assert_eq!(summary["invalidEntries"].as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_unmatched_entries_are_reported_not_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("nota.json"),
        r#"{"beneficiaries": [{"documentTypeCode": "CC", "documentNumber": "999", "services": {}}]}"#,
    )?;
    std::fs::write(temp_dir.path().join("factura.json"), SOURCE)?;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = MergePipeline::new(storage, base_config("out"));

    ReconEngine::new(pipeline).run().await.unwrap();

    let summary: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("out/run_summary.json"))?)?;
    assert_eq!(summary["mergeSummary"]["modified"], 0);
    assert_eq!(summary["mergeSummary"]["unmatched"][0]["number"], "999");
    // The entry keeps its empty block and stays structurally invalid.
    assert_eq!(summary["invalidEntries"][0], 0);

    Ok(())
}

#[tokio::test]
async fn test_bundle_collects_all_artifacts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    let mut config = base_config("out");
    config.formats = vec![
        "json".to_string(),
        "template".to_string(),
        "xml".to_string(),
        "summary".to_string(),
    ];
    config.bundle = true;

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = MergePipeline::new(storage, config);

    let output_path = ReconEngine::new(pipeline).run().await.unwrap();
    assert_eq!(output_path, "out/billmend_bundle.zip");

    let zip_data = std::fs::read(temp_dir.path().join("out/billmend_bundle.zip"))?;
    let cursor = std::io::Cursor::new(zip_data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let file_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(file_names.contains(&"mended.json".to_string()));
    assert!(file_names.contains(&"edit_template.csv".to_string()));
    assert!(file_names.contains(&"document.xml".to_string()));
    assert!(file_names.contains(&"run_summary.json".to_string()));
    assert!(file_names.contains(&"metadata.json".to_string()));

    let mut metadata_file = archive.by_name("metadata.json")?;
    let mut metadata_content = String::new();
    std::io::Read::read_to_string(&mut metadata_file, &mut metadata_content)?;
    let metadata: serde_json::Value = serde_json::from_str(&metadata_content)?;
    assert_eq!(metadata["job"], "billmend");
    assert_eq!(metadata["mode"], "merge");

    Ok(())
}

#[tokio::test]
async fn test_template_round_trip_is_a_noop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    // First pass: merge and emit the bulk-edit template.
    let mut config = base_config("out");
    config.formats = vec!["json".to_string(), "template".to_string()];

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    ReconEngine::new(MergePipeline::new(storage.clone(), config))
        .run()
        .await
        .unwrap();

    let mended_before: Document =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("out/mended.json"))?)?;

    // Second pass: apply the untouched template back onto the merged output.
    let mut config = base_config("out2");
    config.target = "out/mended.json".to_string();
    config.edits = Some("out/edit_template.csv".to_string());

    ReconEngine::new(PatchPipeline::new(storage, config))
        .run()
        .await
        .unwrap();

    let mended_after: Document =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("out2/mended.json"))?)?;
    assert_eq!(mended_before, mended_after);

    Ok(())
}
