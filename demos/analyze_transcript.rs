use anyhow::Context;
use dotenv::dotenv;
use earnings_insight::{ChatCompletionsClient, PortalConfig, ResearchPortal};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: analyze_transcript <path-to-transcript.txt>")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let filename = Path::new(&path).file_name().and_then(|n| n.to_str());

    let config = PortalConfig::from_env()?;
    let client = ChatCompletionsClient::from_config(&config)?;
    println!("🤖 Using model {}", client.model());

    let portal = ResearchPortal::new(client, config);
    let receipt = portal.upload(text, filename)?;
    println!(
        "📄 Uploaded {} ({} characters) as {}",
        receipt.filename, receipt.text_length, receipt.document_id
    );

    match portal.analyze(&receipt.document_id).await {
        Ok(response) => {
            println!("✅ Analysis complete\n");
            println!("{}", serde_json::to_string_pretty(&response.analysis)?);
        }
        Err(e) => {
            eprintln!("❌ {}", serde_json::to_string_pretty(&e.report())?);
            std::process::exit(1);
        }
    }

    Ok(())
}
