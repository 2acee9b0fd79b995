// Schema Validation Integration Tests
// Upload-shaped CSV text through the loader and the validator

use anyhow::Result;
use perfdash::{
    validate, validate_and_parse, Dataset, DatasetBuilder, SchemaError, CONSTANT_COLUMNS,
    REQUIRED_COLUMNS,
};
use pretty_assertions::assert_eq;

#[test]
fn test_header_order_does_not_matter() -> Result<()> {
    let csv = "KPI Value,KPI Name,feature,Load,OS Version,Target Device,Build Number,OS\n\
               1.5,Latency,Login,Low,14,Pixel 8,1001,Android\n";
    let dataset = Dataset::from_csv_str(csv)?;
    assert_eq!(validate(&dataset), Ok(()));
    Ok(())
}

#[test]
fn test_extra_columns_are_ignored() -> Result<()> {
    let csv = "OS,Build Number,Target Device,OS Version,Load,feature,KPI Name,KPI Value,Notes\n\
               Android,1001,Pixel 8,14,Low,Login,Latency,1.5,warm cache\n";
    let dataset = Dataset::from_csv_str(csv)?;
    let records = validate_and_parse(&dataset)?;
    assert_eq!(records.len(), 1);
    Ok(())
}

#[test]
fn test_headerless_upload_reports_all_columns() -> Result<()> {
    let dataset = Dataset::from_csv_str("")?;
    let err = validate(&dataset).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingColumns {
            missing: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
        }
    );
    Ok(())
}

#[test]
fn test_missing_columns_take_precedence_over_constants() -> Result<()> {
    let dataset = DatasetBuilder::new()
        .without_column("KPI Value")
        .measurement("Low", "Login", "Latency", "1.0")
        .row_with("OS", "iOS", "Low", "Login", "Latency", "1.0")
        .build()?;
    let err = validate(&dataset).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingColumns {
            missing: vec!["KPI Value".to_string()]
        }
    );
    Ok(())
}

#[test]
fn test_headers_only_fails_constant_rule() -> Result<()> {
    let csv = DatasetBuilder::new().build_csv()?;
    let dataset = Dataset::from_csv_str(&csv)?;
    assert!(dataset.is_empty());

    match validate(&dataset) {
        Err(SchemaError::InconsistentConstants { columns }) => {
            assert_eq!(columns.len(), CONSTANT_COLUMNS.len());
        }
        other => panic!("expected InconsistentConstants, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_each_constant_column_is_checked() -> Result<()> {
    for column in CONSTANT_COLUMNS {
        let dataset = DatasetBuilder::new()
            .measurement("Low", "Login", "Latency", "1.0")
            .row_with(column, "something-else", "High", "Login", "Latency", "2.0")
            .build()?;
        assert_eq!(
            validate(&dataset),
            Err(SchemaError::InconsistentConstants {
                columns: vec![column.to_string()]
            }),
            "column {column}"
        );
    }
    Ok(())
}

#[test]
fn test_several_inconsistent_constants_are_all_listed() -> Result<()> {
    let dataset = DatasetBuilder::new()
        .measurement("Low", "Login", "Latency", "1.0")
        .row_with("OS", "iOS", "Low", "Login", "Latency", "1.0")
        .row_with("OS Version", "15", "Low", "Login", "Latency", "1.0")
        .build()?;
    assert_eq!(
        validate(&dataset),
        Err(SchemaError::InconsistentConstants {
            columns: vec!["OS".to_string(), "OS Version".to_string()]
        })
    );
    Ok(())
}

#[test]
fn test_non_numeric_kpi_value_is_reported_with_row() -> Result<()> {
    let dataset = DatasetBuilder::new()
        .measurement("Low", "Login", "Latency", "1.0")
        .measurement("Low", "Login", "Latency", "2.0")
        .measurement("Low", "Login", "Latency", "")
        .build()?;
    // the shape is fine, only typed conversion fails
    assert_eq!(validate(&dataset), Ok(()));
    assert_eq!(
        validate_and_parse(&dataset).unwrap_err(),
        SchemaError::InvalidKpiValue {
            row: 3,
            value: String::new()
        }
    );
    Ok(())
}

#[test]
fn test_error_messages_and_guidance() {
    let err = SchemaError::MissingColumns {
        missing: vec!["Load".to_string(), "feature".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "The uploaded CSV file is missing the following required columns: Load, feature"
    );
    assert_eq!(
        err.guidance(),
        "Please ensure that the CSV file contains all required columns: \
         OS, Build Number, Target Device, OS Version, Load, feature, KPI Name, KPI Value"
    );

    let err = SchemaError::InconsistentConstants {
        columns: vec!["OS".to_string()],
    };
    assert!(err
        .guidance()
        .ends_with("OS, Build Number, Target Device, OS Version"));

    let err = SchemaError::MalformedCsv {
        line: 3,
        message: "invalid utf-8".to_string(),
    };
    assert!(!err.guidance().contains("required columns"));
    assert!(err.guidance().contains("UTF-8"));
}

#[test]
fn test_load_from_file() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("results.csv");
    std::fs::write(
        &path,
        DatasetBuilder::new()
            .measurement("Low", "Login", "Latency", "1.0")
            .build_csv()?,
    )?;

    let dataset = Dataset::from_path(&path)?;
    assert_eq!(validate(&dataset), Ok(()));

    let missing = Dataset::from_path(dir.path().join("nope.csv")).unwrap_err();
    assert!(missing.downcast_ref::<SchemaError>().is_none());
    assert!(missing.to_string().contains("nope.csv"));
    Ok(())
}
