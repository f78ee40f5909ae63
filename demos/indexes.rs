//! Creates an index, fills it, queries it with a filter, and cleans up.

use dotenv::dotenv;
use opperai::{ApiKey, Document, EventFeedback, Filter, Opper, Query};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opper = Opper::new(ApiKey::Default)?;
    let indexes = opper.indexes();

    let index = indexes.create("rust-sdk-support").await?;
    println!("Created index {} ({})", index.name, index.id);

    for (key, content, category) in [
        ("refunds", "Refunds are processed within 5 business days.", "billing"),
        ("shipping", "Orders ship within 24 hours.", "logistics"),
        ("invoices", "Invoices are emailed at the start of each month.", "billing"),
    ] {
        let document = Document::new(content)?
            .with_key(key)
            .with_metadata("category", category);
        indexes.add(index.id, document).await?;
    }

    let query = Query::new("When do I get my money back?")
        .top_k(2)
        .filter(Filter::parse("category", "=", "billing")?);
    for hit in indexes.query(index.id, query).await? {
        println!("{} {:?}", hit.content, hit.metadata);
    }

    if let Ok(span_id) = std::env::var("OPPER_SPAN_ID") {
        opper
            .spans()
            .save_feedback(&span_id, EventFeedback::new(1.0)?)
            .await?;
        println!("Saved feedback for span {span_id}");
    }

    println!("Deleted: {}", indexes.delete(index.id).await?);
    Ok(())
}
