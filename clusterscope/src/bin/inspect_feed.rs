use clusterscope::ingestion::{FeedSource, HttpFeedSource};

/// Prints how each entry of the given feeds resolves into an article.
/// Usage: inspect_feed URL [URL...]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let feeds: Vec<String> = std::env::args().skip(1).collect();
    if feeds.is_empty() {
        anyhow::bail!("usage: inspect_feed URL [URL...]");
    }

    let source = HttpFeedSource::new(10, "Clusterscope/0.1.0")?;

    for url in &feeds {
        println!("\n{}", "=".repeat(60));
        println!("Feed: {}", url);
        println!("{}", "=".repeat(60));

        match source.fetch_entries(url).await {
            Ok(entries) => {
                println!("✓ {} entries", entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    let article = entry.to_article();
                    let origin = if entry.summary.is_some() {
                        "summary"
                    } else if entry.description.is_some() {
                        "description"
                    } else if entry.content.is_some() {
                        "content"
                    } else {
                        "none"
                    };
                    println!("  {}. {}", i + 1, article.title);
                    println!("     URL: {}", article.link);
                    println!("     Summary from {}: {} chars", origin, article.summary.len());
                }
            }
            Err(e) => {
                println!("✗ Failed: {:#}", e);
            }
        }
    }

    Ok(())
}
