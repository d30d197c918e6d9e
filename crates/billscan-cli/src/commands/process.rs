//! Process command - extract data from a single bill.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use billscan_core::{BillField, BillParser, Extraction, RawText, TallyBillParser, Validator};

use super::{BillReport, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file (OCR output), or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print validation errors to stderr
    #[arg(long)]
    validate: bool,

    /// Exit with an error when the bill fails validation
    #[arg(long)]
    strict: bool,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let text = read_input(&args.input)?;
    info!("Processing {}", args.input.display());

    let parser = TallyBillParser::from_config(&config.extraction)?;
    let validator = Validator::new(config.validation.clone());

    let extraction = parser.parse(&RawText::from(text));
    let validation = validator.validate_extraction(&extraction);

    if (args.validate || args.strict) && !validation.is_valid {
        eprintln!("{}", style("Validation issues:").yellow());
        for error in &validation.errors {
            eprintln!("  - {}", error);
        }
    }

    let is_valid = validation.is_valid;
    let report = BillReport::new(&extraction, validation);
    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        print_confidence(&extraction);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if args.strict && !is_valid {
        anyhow::bail!("Bill failed validation");
    }

    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    Ok(fs::read_to_string(input)?)
}

fn print_confidence(extraction: &Extraction) {
    println!();
    println!(
        "{} Extraction confidence: {:.1}%",
        style("ℹ").blue(),
        extraction.confidence * 100.0
    );
    for field in BillField::ALL {
        let marker = if extraction.is_derived(field) {
            " (derived)"
        } else {
            ""
        };
        println!(
            "   {:<16} {:.2}{}",
            field.as_str(),
            extraction.field_confidence(field),
            marker
        );
    }
}

pub fn format_report(report: &BillReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &BillReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "buyer",
        "total_before_tax",
        "cgst",
        "sgst",
        "grand_total",
        "invoice_no",
        "bill_date",
        "confidence",
        "is_valid",
        "errors",
    ])?;

    let record = &report.record;
    wtr.write_record([
        record.buyer.clone().unwrap_or_default(),
        opt_to_string(record.total_before_tax),
        opt_to_string(record.cgst),
        opt_to_string(record.sgst),
        opt_to_string(record.grand_total),
        report.invoice_no.clone().unwrap_or_default(),
        opt_to_string(report.bill_date),
        format!("{:.2}", report.confidence),
        report.validation.is_valid.to_string(),
        report.validation.errors.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &BillReport) -> String {
    let record = &report.record;
    let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", show(report.invoice_no.clone())));
    output.push_str(&format!(
        "Date: {}\n",
        show(report.bill_date.map(|d| d.to_string()))
    ));
    output.push_str(&format!("Buyer: {}\n", show(record.buyer.clone())));
    output.push('\n');

    output.push_str("Amounts:\n");
    output.push_str(&format!(
        "  Taxable: {} INR\n",
        show(record.total_before_tax.map(|v| v.to_string()))
    ));
    output.push_str(&format!(
        "  CGST:    {} INR\n",
        show(record.cgst.map(|v| v.to_string()))
    ));
    output.push_str(&format!(
        "  SGST:    {} INR\n",
        show(record.sgst.map(|v| v.to_string()))
    ));
    output.push_str(&format!(
        "  Total:   {} INR\n",
        show(record.grand_total.map(|v| v.to_string()))
    ));
    output.push('\n');

    if report.validation.is_valid {
        output.push_str("Validation: OK\n");
    } else {
        output.push_str("Validation: FAILED\n");
        for error in &report.validation.errors {
            output.push_str(&format!("  - {}\n", error));
        }
    }

    output
}

pub fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
