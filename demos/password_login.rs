use reddit_oauth::{AuthClient, Config, RequestOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional: enable basic logging for the example
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // REDDIT_APP_ID, REDDIT_APP_SECRET, REDDIT_REDIRECT_URI
    let cfg = Config::from_env()?;
    let client = AuthClient::new(cfg)?;

    let username = std::env::var("REDDIT_USERNAME")?;
    let password = std::env::var("REDDIT_PASSWORD")?;
    client.password_authenticate(&username, &password).await?;

    let me = client.request("/api/v1/me", RequestOptions::new()).await?;
    println!("logged in as {}", me.json["name"]);

    let hot = client.get("/r/rust/hot", [("limit", "3")]).await?;
    if let Some(children) = hot.json["data"]["children"].as_array() {
        for post in children {
            println!("- {}", post["data"]["title"]);
        }
    }
    Ok(())
}
