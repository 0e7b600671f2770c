use anyhow::Context;
use earnings_insight::{PortalConfig, TextDiagnostics};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: diagnose_text <path-to-text-file>")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;

    println!("🔍 Inspecting {}\n", path);
    let report = TextDiagnostics::inspect(&text, &PortalConfig::default().chunking);
    println!("{}", report);

    Ok(())
}
