//! Dual backend: drain previous, write primary

mod common;

use common::Fixture;
use pending_core::application::DualPendingQueue;
use pending_core::domain::{Message, PipelineConfigKey};
use pending_core::port::PendingExecutionQueue;
use std::sync::Arc;

#[tokio::test]
async fn test_previous_entry_is_served_before_primary() {
    let fx = Fixture::new().await;
    let key = PipelineConfigKey::from("cutover");

    let previous = Arc::new(fx.memory_queue(10));
    let primary = Arc::new(fx.sqlite_queue(&Fixture::config(10)).await);
    let dual = DualPendingQueue::new(previous.clone(), primary.clone(), fx.metrics.clone());

    previous
        .enqueue(&key, Message::start_execution("left-behind"))
        .await
        .unwrap();
    dual.enqueue(&key, Message::start_execution("fresh"))
        .await
        .unwrap();

    assert_eq!(previous.depth(&key).await.unwrap(), 1);
    assert_eq!(primary.depth(&key).await.unwrap(), 1);
    assert_eq!(dual.depth(&key).await.unwrap(), 2);

    assert_eq!(
        dual.pop_oldest(&key).await.unwrap(),
        Some(Message::start_execution("left-behind"))
    );
    assert_eq!(
        dual.pop_oldest(&key).await.unwrap(),
        Some(Message::start_execution("fresh"))
    );
    assert!(dual.pop_oldest(&key).await.unwrap().is_none());
    assert_eq!(fx.metrics.snapshot().served_from_previous, 1);
}

#[tokio::test]
async fn test_durable_to_durable_cutover_drains_old_database() {
    let old = Fixture::new().await;
    let new = Fixture::new().await;
    let key = PipelineConfigKey::from("cutover");

    let previous = Arc::new(old.sqlite_queue(&Fixture::config(10)).await);
    for i in 0..2 {
        previous
            .enqueue(&key, Message::advisory(format!("old-{}", i)))
            .await
            .unwrap();
    }

    let primary = Arc::new(new.sqlite_queue(&Fixture::config(10)).await);
    let dual = DualPendingQueue::new(previous.clone(), primary, new.metrics.clone());
    dual.enqueue(&key, Message::advisory("new-0")).await.unwrap();

    let mut drained = Vec::new();
    let purged = dual
        .purge(&key, &mut |message: Message| drained.push(message))
        .await
        .unwrap();

    assert_eq!(purged, 3);
    assert_eq!(
        drained,
        vec![
            Message::advisory("old-0"),
            Message::advisory("old-1"),
            Message::advisory("new-0"),
        ]
    );
    assert_eq!(previous.depth(&key).await.unwrap(), 0);
    assert_eq!(dual.depth(&key).await.unwrap(), 0);
}
