use anyhow::Context;
use dotenv::dotenv;
use earnings_insight::{build_statement_sheets, ChatCompletionsClient, FinancialExtractor, PortalConfig};
use std::fs::File;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: extract_financials <statement.txt> [output-dir]")?;
    let output_dir = args.next().unwrap_or_else(|| ".".to_string());

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let source_name = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.txt");

    let config = PortalConfig::from_env()?;
    let client = ChatCompletionsClient::from_config(&config)?;
    let extractor = FinancialExtractor::new(client)
        .with_chunking(config.chunking.clone())
        .with_sampling(config.sampling.clone());

    println!("📊 Extracting income statement from {}...", source_name);
    let statement = extractor.extract(&text, source_name).await?;
    println!(
        "✅ {} line items for {} ({} {})",
        statement.line_items.len(),
        statement.metadata.periods.join(", "),
        statement.metadata.currency.as_str(),
        statement.metadata.unit.as_str()
    );

    for sheet in build_statement_sheets(&statement.line_items, &statement.metadata) {
        let file_name = format!("{}.csv", sheet.name.to_lowercase().replace(' ', "_"));
        let out_path = Path::new(&output_dir).join(file_name);
        sheet.write_csv(File::create(&out_path)?)?;
        println!("💾 Wrote {}", out_path.display());
    }

    Ok(())
}
