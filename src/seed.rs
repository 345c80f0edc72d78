//! Demo seeding against a running server.
//!
//! Posts three listings whose location strings are inconsistent spellings
//! of the same area, then runs the verification search to show they all
//! landed in one bucket. Useful after `geobucket init` + `geobucket serve`
//! to confirm normalization end to end.

use anyhow::{Context, Result};
use serde_json::json;

pub async fn run_seed(base_url: &str) -> Result<()> {
    let client = reqwest::Client::new();

    let demo_listings = [
        json!({"title": "Villa A", "location": "Sangotedo", "lat": 6.4698, "lng": 3.6285}),
        json!({"title": "Condo B", "location": "Sangotedo, Ajah", "lat": 6.4720, "lng": 3.6301}),
        json!({"title": "Flat C", "location": "sangotedo lagos", "lat": 6.4705, "lng": 3.6290}),
    ];

    for body in &demo_listings {
        let resp = client
            .post(format!("{}/api/properties", base_url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("is the server running at {}?", base_url))?;

        let status = resp.status();
        let reply: serde_json::Value = resp.json().await?;
        println!("POST /api/properties {} -> {}", body["title"], status);
        if let Some(bucket) = reply.get("bucket") {
            println!("  bucket: {}", bucket);
        }
    }

    // The verification search: one variation should find all three.
    let resp = client
        .get(format!("{}/api/properties/search", base_url))
        .query(&[("location", "sangotedo")])
        .send()
        .await?;

    let results: serde_json::Value = resp.json().await?;
    let count = results.as_array().map(|a| a.len()).unwrap_or(0);
    println!("Search response: {}", results);
    println!("Properties found: {}", count);

    Ok(())
}
