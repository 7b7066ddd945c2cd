use rankscrap::{process::process_site, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let summary = process_site(Config::default()).await?;
    println!(
        "Wrote {} records from {}/{} pages.",
        summary.records_written, summary.pages_fetched, summary.total_pages
    );

    Ok(())
}
