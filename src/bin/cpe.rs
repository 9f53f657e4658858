//! `cpe`: validate, convert and verify SUNAT electronic documents.
//!
//! Usage:
//!   cpe validate invoice.json
//!   cpe convert invoice.json --cert cert.pem --key key.pem [--out-dir ./xml_output]
//!   cpe convert invoice.json --cert cert.b64 --key key.b64 --base64
//!   cpe verify xml_output/20123456786-01-F001-1.xml
//!
//! The document is read as JSON in the camelCase business-document shape.
//! Results are printed to stdout as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sunat_ubl::core::{BusinessDocument, validate_document};
use sunat_ubl::pipeline::{ConversionReport, ConversionStatus, ConvertOptions, DocumentStore, FsStore, convert};
use sunat_ubl::signature::{SigningCredentials, verify_signed_xml};

#[derive(Parser, Debug)]
#[command(name = "cpe", version, about = "SUNAT UBL 2.1 document converter")]
struct Cli {
    /// Log filter (e.g. "info", "sunat_ubl=debug"). RUST_LOG takes precedence.
    #[arg(long, env = "CPE_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the field-level validator on a JSON document.
    Validate {
        document: PathBuf,
    },
    /// Build, sign and store a JSON document.
    Convert {
        document: PathBuf,
        /// Signer certificate (PEM).
        #[arg(long)]
        cert: PathBuf,
        /// Private key (PKCS#1 or PKCS#8 PEM).
        #[arg(long)]
        key: PathBuf,
        /// Certificate and key files hold base64-encoded PEM.
        #[arg(long)]
        base64: bool,
        #[arg(long, env = "CPE_OUTPUT_DIR", default_value = "./xml_output")]
        out_dir: PathBuf,
        /// Skip the validator.
        #[arg(long)]
        no_validate: bool,
    },
    /// Check the embedded signature of a signed XML document.
    Verify {
        xml: PathBuf,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_document(path: &Path) -> Result<BusinessDocument> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_credentials(cert: &Path, key: &Path, base64: bool) -> Result<SigningCredentials> {
    let cert = fs::read_to_string(cert).with_context(|| format!("reading {}", cert.display()))?;
    let key = fs::read_to_string(key).with_context(|| format!("reading {}", key.display()))?;
    let credentials = if base64 {
        SigningCredentials::from_base64_pem(&cert, &key)?
    } else {
        SigningCredentials::from_pem(&cert, &key)?
    };
    Ok(credentials)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Validate { document } => {
            let doc = read_document(&document)?;
            let errors = validate_document(&doc);
            print_json(&errors)?;
            Ok(errors.is_empty())
        }
        Command::Convert {
            document,
            cert,
            key,
            base64,
            out_dir,
            no_validate,
        } => {
            let doc = read_document(&document)?;
            let credentials = load_credentials(&cert, &key, base64)?;
            let options = ConvertOptions {
                validate: !no_validate,
                ..ConvertOptions::default()
            };

            let result = convert(&doc, &credentials, &options);
            let mut report = ConversionReport::from_result(&doc, &result);
            if let Ok(signed) = &result {
                let store = FsStore::new(&out_dir);
                match store.store(signed) {
                    Ok(path) => info!(path = %path.display(), "stored"),
                    Err(e) => {
                        report = ConversionReport::from_result(&doc, &Err(e));
                    }
                }
            }
            print_json(&report)?;
            Ok(report.status == ConversionStatus::Success)
        }
        Command::Verify { xml } => {
            let signed = fs::read_to_string(&xml).with_context(|| format!("reading {}", xml.display()))?;
            let verified = verify_signed_xml(&signed)?;
            print_json(&serde_json::json!({
                "status": "valid",
                "signatureId": verified.id,
                "digest": hex::encode(&verified.digest),
                "subject": verified.subject,
            }))?;
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
