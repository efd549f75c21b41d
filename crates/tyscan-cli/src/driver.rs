//! CLI driver: load the export, run the scan, emit the snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use tyscan_common::ScanMode;
use tyscan_front::FrontendExport;
use tyscan_scan::{ScanConfig, ScanError, Scanner};

use crate::args::CliArgs;

/// Run a scan for the parsed arguments and return the snapshot.
pub fn run_scan(args: &CliArgs) -> Result<Value, ScanError> {
    let mode = ScanMode::parse_list(&args.scan_mode)
        .map_err(|flag| ScanError::Config(format!("unknown scan-mode flag {flag:?}")))?;

    let export = load_export(args)
        .map_err(|e| ScanError::Config(format!("{:#}", e)))?;

    let mut scanner = Scanner::new(ScanConfig {
        packages: args.patterns.clone(),
        mode,
        include_unexported: args.include_unexported,
    });
    let output = scanner.scan(&export)?;
    Ok(output.snapshot())
}

fn load_export(args: &CliArgs) -> Result<FrontendExport> {
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open input {}", args.input.display()))?;
    let export: FrontendExport = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse frontend export {}", args.input.display()))?;
    debug!(
        packages = export.packages.len(),
        descriptors = export.table.len(),
        "export loaded"
    );
    Ok(export)
}

/// Write the snapshot to the chosen destination.
pub fn write_output(args: &CliArgs, snapshot: &Value) -> Result<()> {
    let rendered = if args.pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(rendered.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write as _;
    use tyscan_front::{BasicKind, Decl, Package, SourceFile, TypeDecl, TypeTable};

    fn demo_export_json() -> String {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let my_int = table.named("example.com/demo", "MyInt", int);

        let mut pkg = Package::new("example.com/demo", "demo");
        let mut file = SourceFile::new("demo.go");
        file.decls.push(Decl::Type(TypeDecl::new("MyInt", my_int)));
        pkg.files.push(file);

        serde_json::to_string(&FrontendExport::new(table, vec![pkg])).unwrap()
    }

    fn args_for(input: &std::path::Path, pattern: &str) -> CliArgs {
        CliArgs::try_parse_from([
            "tyscan",
            pattern,
            "--input",
            input.to_str().unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_scan_end_to_end() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(demo_export_json().as_bytes()).unwrap();

        let args = args_for(input.path(), "example.com/demo");
        let snapshot = run_scan(&args).unwrap();

        let my_int = &snapshot["types"]["example.com/demo.MyInt"];
        assert_eq!(my_int["kind"], "basic");
        assert_eq!(my_int["named"], true);
        assert_eq!(snapshot["packages"]["example.com/demo"]["name"], "demo");
    }

    #[test]
    fn test_run_scan_bad_mode_is_config_error() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(demo_export_json().as_bytes()).unwrap();

        let mut args = args_for(input.path(), "example.com/demo");
        args.scan_mode = "types,wibble".to_string();
        let err = run_scan(&args).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_run_scan_missing_input_is_config_error() {
        let args = args_for(std::path::Path::new("/nonexistent/export.json"), "x");
        let err = run_scan(&args).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_write_output_to_file() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(demo_export_json().as_bytes()).unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();

        let mut args = args_for(input.path(), "example.com/demo");
        args.out = Some(out.path().to_path_buf());
        args.pretty = true;

        let snapshot = run_scan(&args).unwrap();
        write_output(&args, &snapshot).unwrap();

        let written = std::fs::read_to_string(out.path()).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert!(parsed["types"]
            .as_object()
            .unwrap()
            .contains_key("example.com/demo.MyInt"));
    }
}
