// tests/pipeline_filters.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use launch_repost_bot::social::mock::MockSocialClient;
use launch_repost_bot::social::{Identity, SocialClient};
use launch_repost_bot::{AccountId, AppContext, IgnoreReason, Post, PostId, Verdict};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 13, 0, 0).unwrap()
}

fn post(author: &str, age: Duration, original: bool) -> Post {
    Post {
        id: PostId::from("1700"),
        author_id: AccountId::from(author),
        author_screen_name: format!("user{author}"),
        author_name: format!("User {author}"),
        created_at: now() - age,
        text: "#StarshipLaunchIn10min T-10".into(),
        is_original: original,
    }
}

/// Friends = {"42"}, last own post `last_post_ago` before `now()`.
fn setup(last_post_ago: Option<Duration>) -> (Arc<MockSocialClient>, AppContext) {
    let mock = Arc::new(
        MockSocialClient::new()
            .with_friends(["42"])
            .with_latest_post(last_post_ago.map(|d| now() - d)),
    );
    let client: Arc<dyn SocialClient> = mock.clone();
    let ctx = AppContext::with_identity(
        client,
        Identity {
            screen_name: "operator".into(),
            name: "Operator".into(),
        },
    );
    (mock, ctx)
}

#[tokio::test]
async fn retweets_are_always_dropped() {
    let (mock, ctx) = setup(Some(Duration::hours(5)));
    let verdict = ctx
        .pipeline()
        .handle(&post("42", Duration::minutes(1), false), now())
        .await;

    assert_eq!(verdict, Verdict::Ignore(IgnoreReason::NotOriginal));
    assert!(mock.reposts().is_empty());
    assert_eq!(mock.friend_calls(), 0, "originality is checked first");
}

#[tokio::test]
async fn strangers_are_dropped() {
    let (mock, ctx) = setup(Some(Duration::hours(5)));
    let verdict = ctx
        .pipeline()
        .handle(&post("99", Duration::minutes(1), true), now())
        .await;

    assert_eq!(verdict, Verdict::Ignore(IgnoreReason::NotFriend));
    assert!(mock.reposts().is_empty());
    assert_eq!(mock.latest_calls(), 0, "cooldown is not consulted for strangers");
}

#[tokio::test]
async fn recency_boundary_is_thirty_minutes() {
    let (_mock, ctx) = setup(Some(Duration::hours(5)));
    let pipeline = ctx.pipeline();

    let at_limit = pipeline
        .evaluate(&post("42", Duration::minutes(30), true), now())
        .await;
    assert_eq!(at_limit, Verdict::Repost);

    let too_old = pipeline
        .evaluate(&post("42", Duration::minutes(31), true), now())
        .await;
    assert_eq!(
        too_old,
        Verdict::Ignore(IgnoreReason::TooOld { age_secs: 31 * 60 })
    );
}

#[tokio::test]
async fn cooldown_blocks_at_34_minutes() {
    let (mock, ctx) = setup(Some(Duration::minutes(34)));
    let verdict = ctx
        .pipeline()
        .handle(&post("42", Duration::minutes(5), true), now())
        .await;

    assert_eq!(
        verdict,
        Verdict::Ignore(IgnoreReason::CoolingDown {
            since_last_post_secs: 34 * 60
        })
    );
    assert!(mock.reposts().is_empty());
}

#[tokio::test]
async fn cooldown_passes_at_36_minutes() {
    let (mock, ctx) = setup(Some(Duration::minutes(36)));
    let verdict = ctx
        .pipeline()
        .handle(&post("42", Duration::minutes(5), true), now())
        .await;

    assert_eq!(verdict, Verdict::Repost);
    assert_eq!(mock.reposts(), vec![PostId::from("1700")]);
}

#[tokio::test]
async fn cooldown_passes_exactly_at_35_minutes() {
    let (_mock, ctx) = setup(Some(Duration::minutes(35)));
    let verdict = ctx
        .pipeline()
        .evaluate(&post("42", Duration::minutes(5), true), now())
        .await;
    assert_eq!(verdict, Verdict::Repost);
}

#[tokio::test]
async fn never_posted_means_no_cooldown() {
    let (_mock, ctx) = setup(None);
    let verdict = ctx
        .pipeline()
        .evaluate(&post("42", Duration::minutes(5), true), now())
        .await;
    assert_eq!(verdict, Verdict::Repost);
}

#[tokio::test(start_paused = true)]
async fn friend_post_reposts_and_starts_cooldown() {
    let (mock, ctx) = setup(Some(Duration::minutes(40)));
    let pipeline = ctx.pipeline();

    let verdict = pipeline
        .handle(&post("42", Duration::minutes(5), true), now())
        .await;
    assert!(verdict.is_repost());
    assert_eq!(mock.reposts(), vec![PostId::from("1700")]);

    // the cache now reflects our own post without another remote lookup
    assert_eq!(ctx.last_post.get().await, now());
    assert_eq!(mock.latest_calls(), 1);

    // a second matching post right after is suppressed
    let mut again = post("42", Duration::minutes(4), true);
    again.id = PostId::from("1701");
    let second = pipeline
        .handle(&again, now() + Duration::seconds(10))
        .await;
    assert_eq!(
        second,
        Verdict::Ignore(IgnoreReason::CoolingDown {
            since_last_post_secs: 10
        })
    );
    assert_eq!(mock.reposts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cooldown_starts_when_the_repost_completes() {
    let mock = Arc::new(
        MockSocialClient::new()
            .with_friends(["42"])
            .with_latest_post(Some(now() - Duration::minutes(40)))
            .with_latency(std::time::Duration::from_secs(2)),
    );
    let client: Arc<dyn SocialClient> = mock.clone();
    let ctx = AppContext::with_identity(
        client,
        Identity {
            screen_name: "operator".into(),
            name: "Operator".into(),
        },
    );

    let verdict = ctx
        .pipeline()
        .handle(&post("42", Duration::minutes(5), true), now())
        .await;
    assert_eq!(verdict, Verdict::Repost);

    // friends load, last-post load and the retweet each take 2s
    assert_eq!(ctx.last_post.get().await, now() + Duration::seconds(6));
}

#[tokio::test]
async fn non_friend_leaves_last_post_untouched() {
    let (mock, ctx) = setup(Some(Duration::minutes(40)));
    let verdict = ctx
        .pipeline()
        .handle(&post("99", Duration::minutes(5), true), now())
        .await;

    assert_eq!(verdict, Verdict::Ignore(IgnoreReason::NotFriend));
    assert!(mock.reposts().is_empty());
    assert_eq!(ctx.last_post.get().await, now() - Duration::minutes(40));
}

#[tokio::test]
async fn failed_repost_does_not_start_cooldown() {
    let (mock, ctx) = setup(Some(Duration::minutes(40)));
    mock.fail_repost(true);

    let verdict = ctx
        .pipeline()
        .handle(&post("42", Duration::minutes(5), true), now())
        .await;

    assert_eq!(verdict, Verdict::RepostFailed);
    assert_eq!(ctx.last_post.get().await, now() - Duration::minutes(40));
}

#[tokio::test]
async fn every_verdict_lands_in_history() {
    let (_mock, ctx) = setup(Some(Duration::minutes(40)));
    let pipeline = ctx.pipeline();

    pipeline
        .handle(&post("42", Duration::minutes(1), false), now())
        .await;
    pipeline
        .handle(&post("42", Duration::minutes(1), true), now())
        .await;

    let rows = ctx.history.snapshot_last_n(10);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].verdict, Verdict::Ignore(IgnoreReason::NotOriginal));
    assert_eq!(rows[1].verdict, Verdict::Repost);
}
