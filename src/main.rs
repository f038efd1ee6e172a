//! invoice-forge – command-line invoice → PDF exporter.
//!
//! Usage:
//!   invoice-forge <invoice.json> [output.pdf] [--endpoint URL] [--client-only] ...
//!
//! If `output.pdf` is omitted the PDF is written next to the input file under
//! the export's filename (e.g. `invoice-INV-1.pdf`).

use std::{env, fs, path::Path, path::PathBuf, process, sync::Arc};

use invoice_forge::format::{format_currency, format_timestamp};
use invoice_forge::fonts::FontBook;
use invoice_forge::labels::LabelKey;
use invoice_forge::model::{InvoiceDocument, InvoiceTheme, TemplateVariant};
use invoice_forge::pagination::PaginationMode;
use invoice_forge::pipeline::{export_pdf_with, render_export_html, PipelineConfig};
use invoice_forge::raster::SvgRasterizer;
use invoice_forge::totals::compute_totals;

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => fail(&format!("{flag} requires a value")),
    }
}

fn write_file(path: &Path, bytes: &[u8]) {
    // Create output directory if necessary.
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                fail(&format!("creating output directory: {e}"));
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        fail(&format!("writing '{}': {e}", path.display()));
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut html_path: Option<PathBuf> = None;
    let mut font_path: Option<PathBuf> = None;
    let mut template: Option<TemplateVariant> = None;
    let mut client_only = false;
    let mut totals_only = false;
    let mut positional = 0usize;

    let mut config = PipelineConfig::from_env();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--html" => html_path = Some(PathBuf::from(flag_value(&mut iter, arg))),
            "--font" => font_path = Some(PathBuf::from(flag_value(&mut iter, arg))),
            "--title" | "-t" => config.title = Some(flag_value(&mut iter, arg)),
            "--endpoint" => config.print_endpoint = Some(flag_value(&mut iter, arg)),
            "--client-only" => client_only = true,
            "--single-page" => config.pagination = PaginationMode::SinglePage,
            "--banded" => config.pagination = PaginationMode::Banded,
            "--pagination" => {
                let v = flag_value(&mut iter, arg);
                config.pagination = PaginationMode::parse(&v)
                    .unwrap_or_else(|| fail(&format!("unknown pagination mode '{v}'")));
            }
            "--template" => {
                let v = flag_value(&mut iter, arg);
                template = Some(
                    TemplateVariant::parse(&v)
                        .unwrap_or_else(|| fail(&format!("unknown template '{v}'"))),
                );
            }
            "--theme" => {
                let v = flag_value(&mut iter, arg);
                config.app_theme = match v.to_ascii_lowercase().as_str() {
                    "light" => InvoiceTheme::Light,
                    "dark" => InvoiceTheme::Dark,
                    _ => fail(&format!("unknown theme '{v}'")),
                };
            }
            "--totals" => totals_only = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let json = fs::read_to_string(&input)
        .unwrap_or_else(|e| fail(&format!("reading '{}': {e}", input.display())));
    let mut doc = InvoiceDocument::from_json(&json)
        .unwrap_or_else(|e| fail(&format!("parsing '{}': {e}", input.display())));
    if let Some(variant) = template {
        doc.preferences.template = variant;
    }
    if client_only {
        config.print_endpoint = None;
    }

    if totals_only {
        print_totals(&doc);
        return;
    }

    if let Some(path) = &html_path {
        let html = render_export_html(&doc, &config);
        write_file(path, html.as_bytes());
        eprintln!("Wrote '{}' ({} bytes)", path.display(), html.len());
    }

    let mut fonts = FontBook::new();
    if let Some(path) = &font_path {
        let bytes = fs::read(path)
            .unwrap_or_else(|e| fail(&format!("reading '{}': {e}", path.display())));
        for bold in [false, true] {
            if let Err(e) = fonts.load_font(&doc.style.font_family, bold, bytes.clone()) {
                fail(&e);
            }
        }
    }
    let rasterizer = Arc::new(SvgRasterizer::new(fonts, true));

    let exported = match export_pdf_with(&doc, &config, rasterizer, &mut |p| eprintln!("{p}")) {
        Ok(pdf) => pdf,
        Err(e) => {
            for (method, err) in &e.attempts {
                eprintln!("  {method}: {err}");
            }
            fail(&format!("exporting PDF: {}", e.message));
        }
    };

    // Default output: input directory + export filename.
    let output = output_path.unwrap_or_else(|| {
        input
            .parent()
            .map(|dir| dir.join(&exported.filename))
            .unwrap_or_else(|| PathBuf::from(&exported.filename))
    });
    write_file(&output, &exported.bytes);

    match exported.pages {
        Some(pages) => eprintln!(
            "Wrote '{}' ({} bytes, {} page{}, {} export)",
            output.display(),
            exported.bytes.len(),
            pages,
            if pages == 1 { "" } else { "s" },
            exported.method
        ),
        None => eprintln!(
            "Wrote '{}' ({} bytes, {} export)",
            output.display(),
            exported.bytes.len(),
            exported.method
        ),
    }
}

fn print_totals(doc: &InvoiceDocument) {
    let totals = compute_totals(&doc.items, &doc.fees);
    let currency = &doc.preferences.currency;
    let rows = [
        (LabelKey::Subtotal, totals.subtotal),
        (LabelKey::Tax, totals.tax),
        (LabelKey::Discount, totals.discount),
        (LabelKey::Shipping, totals.shipping),
        (LabelKey::Total, totals.total),
        (LabelKey::AmountPaid, totals.amount_paid),
        (LabelKey::BalanceDue, totals.amount_due),
    ];
    println!("{} ({})", doc.id, format_timestamp(&doc.updated_at));
    for (key, amount) in rows {
        println!("{:<16}{:>16}", doc.labels.get(key), format_currency(amount, currency));
    }
}

fn print_usage(prog: &str) {
    eprintln!("invoice-forge – invoice to PDF exporter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <invoice.json> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <invoice.json>       Invoice document to export");
    eprintln!("  [output.pdf]         Output path (default: export filename next to the input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --html <file>        Also write the standalone print HTML");
    eprintln!("  --template <name>    modern, classic or minimal (default: the document's)");
    eprintln!("  --theme <name>       Application theme, light or dark");
    eprintln!("  --endpoint <url>     Print service URL (env: INVOICE_FORGE_PRINT_ENDPOINT)");
    eprintln!("  --client-only        Skip the print service and rasterize locally");
    eprintln!("  --single-page        Put the whole invoice on one page");
    eprintln!("  --banded             Always slice into US-Letter pages");
    eprintln!("  --pagination <mode>  auto, single or banded");
    eprintln!("  --font <file>        TTF/OTF face for the document font family");
    eprintln!("  --title, -t          Document title in PDF metadata");
    eprintln!("  --totals             Print the computed totals and exit");
    eprintln!("  --help               Print this message");
}
