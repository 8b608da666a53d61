use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use reqwest::Client;
use serde_json::{Value, json};

/// Smoke test a running server: intake -> withdraw -> intake -> list.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://localhost:1111")]
    base_url: String,

    #[arg(long, default_value = "smoke-business")]
    user_id: String,

    #[arg(long, default_value = "smoke-campaign")]
    campaign_id: String,

    #[arg(long, default_value = "smoke-kol")]
    kol_id: String,
}

async fn expect_success(response: reqwest::Response, step: &str) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.with_context(|| format!("{step}: bad body"))?;

    if !status.is_success() || body["success"] != true {
        bail!("{step}: {status} {body}");
    }

    println!("{step}: {status} {body}");

    Ok(body)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let collection = format!("{}/api/contact-requests", args.base_url);
    let id = format!("{}:{}", args.campaign_id, args.kol_id);

    let intake = json!({
        "userId": args.user_id,
        "campaignId": args.campaign_id,
        "campaignTitle": "Smoke test campaign",
        "kol": { "id": args.kol_id, "handle": "@smoke", "display_name": "Smoke Kol" }
    });

    expect_success(client.post(&collection).json(&intake).send().await?, "intake").await?;
    expect_success(
        client
            .post(format!("{collection}/{id}/withdraw"))
            .send()
            .await?,
        "withdraw",
    )
    .await?;
    expect_success(client.post(&collection).json(&intake).send().await?, "re-intake").await?;

    let listed = expect_success(
        client
            .get(&collection)
            .query(&[("userId", &args.user_id), ("campaignId", &args.campaign_id)])
            .send()
            .await?,
        "list",
    )
    .await?;

    let found = listed["data"]
        .as_array()
        .context("list: data is not an array")?
        .iter()
        .find(|record| record["id"] == id.as_str())
        .context("list: re-requested record missing")?;

    ensure!(
        found["status"] == "in_progress",
        "list: expected in_progress, got {}",
        found["status"]
    );

    println!("Smoke test passed");

    Ok(())
}
