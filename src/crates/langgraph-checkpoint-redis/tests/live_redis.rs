//! Tests against a real Redis server
//!
//! Ignored by default. Run with a disposable database:
//!
//! ```bash
//! REDIS_URL=redis://127.0.0.1:6379/15 cargo test -p langgraph-checkpoint-redis -- --ignored
//! ```

mod common;

use common::{checkpoint, init_tracing, metadata, thread, ts};
use futures::TryStreamExt;
use langgraph_checkpoint::{BlockingCheckpointSaver, CheckpointSaver};
use langgraph_checkpoint_redis::{AsyncRedisSaver, RedisSaver};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

/// Thread id unique to this run so repeated runs do not see each other's data
fn unique_thread(name: &str) -> String {
    format!("{name}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[test]
#[ignore = "requires a running Redis server (REDIS_URL)"]
fn test_blocking_saver_round_trip() {
    init_tracing();
    let client = redis::Client::open(redis_url()).unwrap();
    let saver = RedisSaver::from_pool(r2d2::Pool::builder().max_size(2).build(client).unwrap());
    let thread_id = unique_thread("blocking");

    let mut config = thread(&thread_id);
    for i in 1..=5 {
        config = saver.put(&config, checkpoint(i), metadata(i as i32)).unwrap();
    }

    let latest = saver.get_tuple(&thread(&thread_id)).unwrap().unwrap();
    assert_eq!(latest.checkpoint.ts, ts(5));
    assert_eq!(latest.parent_ts(), Some(ts(4).as_str()));

    let versions: Vec<_> = saver
        .list(Some(&thread(&thread_id)), None, Some(3))
        .unwrap()
        .map(|t| t.unwrap().checkpoint.ts)
        .collect();
    assert_eq!(versions, vec![ts(5), ts(4), ts(3)]);
}

#[tokio::test]
#[ignore = "requires a running Redis server (REDIS_URL)"]
async fn test_async_saver_round_trip() {
    init_tracing();
    let saver = AsyncRedisSaver::from_url(&redis_url(), Some(4)).unwrap();
    let thread_id = unique_thread("async");

    let id1 = saver.put(&thread(&thread_id), checkpoint(1), metadata(0)).await.unwrap();
    let id2 = saver.put(&id1, checkpoint(2), metadata(1)).await.unwrap();

    let tuple = saver.get_tuple(&id2).await.unwrap().unwrap();
    assert_eq!(tuple.parent_config, Some(id1));

    let before = thread(&thread_id).with_thread_ts(ts(2));
    let older: Vec<_> = saver
        .list(Some(&thread(&thread_id)), Some(&before), None)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(older.len(), 1);
    assert_eq!(older[0].checkpoint.ts, ts(1));
}

#[tokio::test]
#[ignore = "requires a running Redis server (REDIS_URL)"]
async fn test_async_saver_over_multiplexed_connection() {
    init_tracing();
    let client = redis::Client::open(redis_url()).unwrap();
    let saver = AsyncRedisSaver::from_client(&client).await.unwrap();
    let thread_id = unique_thread("multiplexed");

    saver.put(&thread(&thread_id), checkpoint(1), metadata(0)).await.unwrap();
    assert!(saver.get_tuple(&thread(&thread_id)).await.unwrap().is_some());
}
