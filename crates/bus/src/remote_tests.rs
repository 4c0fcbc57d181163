// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use actl_core::Target;

#[tokio::test]
async fn publish_crosses_the_fake_transport() {
    let (side_a, side_b) = FakeWireTransport::pair();
    let bus_a = RemoteBus::new(side_a);
    let bus_b = RemoteBus::new(side_b);

    let (tx, mut rx) = mpsc::channel(8);
    bus_b.connect("listener", tx).await.unwrap();

    let driver = tokio::spawn(async move { bus_b.run().await });

    bus_a
        .send(BusMessage {
            from: "sender".to_string(),
            to: Target::agent("listener"),
            content: "hi".to_string(),
            ts: 0,
        })
        .await
        .unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.content, "hi");
    driver.abort();
}

#[tokio::test]
async fn malformed_frame_does_not_stop_the_driver() {
    let (side_a, side_b) = FakeWireTransport::pair();
    let bus_b = RemoteBus::new(side_b);

    side_a.send_frame("not json".to_string()).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    bus_b.connect("listener", tx).await.unwrap();

    side_a
        .send_frame(
            serde_json::to_string(&WireFrame {
                kind: WireFrameKind::Publish,
                agent_id: "sender".to_string(),
                channel: None,
                message: Some(BusMessage {
                    from: "sender".to_string(),
                    to: Target::agent("listener"),
                    content: "after garbage".to_string(),
                    ts: 0,
                }),
            })
            .unwrap(),
        )
        .await
        .unwrap();

    let driver = tokio::spawn(async move { bus_b.run().await });
    let received = rx.recv().await.unwrap();
    assert_eq!(received.content, "after garbage");
    driver.abort();
}
