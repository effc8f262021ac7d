#![allow(clippy::expect_used, clippy::doc_markdown)]
//! Example: list unseen INBOX messages with their sender and text body.
//!
//! ## Running
//!
//! ```bash
//! IMAP_HOST=imap.gmail.com IMAP_USER=me@gmail.com IMAP_PASSWORD=app-password \
//!     RUST_LOG=mailtap_imap=debug \
//!     cargo run --package mailtap-imap --example read_inbox
//! ```
//!
//! Set `IMAP_MARK_SEEN=1` to flag each printed message as `\Seen`.

use mailtap_imap::{Client, Config, INBOX, SEEN};
use mailtap_mime::{get_body, parse_address};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("IMAP_HOST").expect("IMAP_HOST is required");
    let user = std::env::var("IMAP_USER").expect("IMAP_USER is required");
    let password = std::env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD is required");
    let mark_seen = std::env::var("IMAP_MARK_SEEN").is_ok_and(|v| v == "1");

    let config = Config::new(host);
    let mut client = Client::connect(&config).await?;
    client.login(&user, &password).await?;

    client.select(INBOX).await?.into_result()?;
    let ids = client.search("UNSEEN").await?;
    println!("{} unseen message(s)\n", ids.len());

    for id in &ids {
        let message = client.get_message(id).await?;

        let from = message
            .headers
            .get("from")
            .map(parse_address)
            .transpose()?
            .unwrap_or_default();
        let senders: Vec<String> = from.iter().map(ToString::to_string).collect();

        println!("#{id} from {}", senders.join(", "));
        println!("Subject: {}", message.headers.get("subject").unwrap_or_default());

        match get_body(&message, "text/plain") {
            Ok(body) => println!("[{}]\n{}\n", body.media_type, body.text()?),
            Err(e) => println!("(no readable body: {e})\n"),
        }

        if mark_seen {
            client.store_flag(id, SEEN).await?;
        }
    }

    client.logout().await?;
    Ok(())
}
