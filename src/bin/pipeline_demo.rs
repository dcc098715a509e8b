//! Offline demo: pushes a few scripted posts through the real pipeline using the mock client.

use std::sync::Arc;

use chrono::{Duration, Utc};
use launch_repost_bot::social::mock::MockSocialClient;
use launch_repost_bot::social::{Identity, SearchPage, SocialClient};
use launch_repost_bot::{AccountId, AppContext, Post, PostId};

fn post(id: &str, author: &str, minutes_ago: i64, original: bool) -> Post {
    Post {
        id: PostId::from(id),
        author_id: AccountId::from(author),
        author_screen_name: format!("user{author}"),
        author_name: format!("User {author}"),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        text: "#StarshipLaunchIn10min".into(),
        is_original: original,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mock = Arc::new(
        MockSocialClient::new()
            .with_friends(["42"])
            .with_latest_post(Some(Utc::now() - Duration::hours(2))),
    );
    mock.push_page(SearchPage {
        posts: vec![
            post("104", "42", 2, true),
            post("103", "42", 3, false),
            post("102", "99", 4, true),
            post("101", "42", 45, true),
        ],
        max_id: Some("104".into()),
    });

    let client: Arc<dyn SocialClient> = mock.clone();
    let ctx = AppContext::with_identity(
        client,
        Identity {
            screen_name: "demo".into(),
            name: "Demo".into(),
        },
    );
    let mut listener = ctx.listener(vec!["#StarshipLaunchIn10min".into()]);
    let pipeline = ctx.pipeline();

    for p in listener.poll_once().await? {
        let verdict = pipeline.handle(&p, Utc::now()).await;
        println!("{} by {} -> {:?}", p.id, p.author_id, verdict);
    }

    println!(
        "cursor={} reposted={:?}",
        listener.cursor().as_str(),
        mock.reposts()
    );
    Ok(())
}
