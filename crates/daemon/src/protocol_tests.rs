// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn requests_round_trip_through_the_wire_encoding() {
    let requests = vec![
        Request::Ping,
        Request::Status,
        Request::ListTimeouts,
        Request::Confirm {
            change_id: "ssh_1700000000".into(),
        },
        Request::Cancel {
            change_id: "network_1700000000".into(),
        },
        Request::CancelAll,
        Request::ListSnapshots,
        Request::CreateSnapshot {
            description: "manual".into(),
        },
        Request::DeleteSnapshot {
            id: SnapshotId::Manual("confguard_20260110_120000".into()),
        },
        Request::CleanupSnapshots,
        Request::Shutdown,
    ];

    for request in requests {
        let bytes = encode(&request).unwrap();
        let parsed: Request = decode(&bytes).unwrap();
        assert_eq!(parsed, request);
    }
}

#[test]
fn requests_are_tagged_by_type() {
    let bytes = encode(&Request::Confirm {
        change_id: "ssh_1".into(),
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], "Confirm");
    assert_eq!(value["change_id"], "ssh_1");
}

#[tokio::test]
async fn framed_messages_survive_a_duplex_pipe() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    write_message(&mut client, &Request::Ping).await.unwrap();
    let bytes = read_message(&mut server).await.unwrap();
    let parsed: Request = decode(&bytes).unwrap();
    assert_eq!(parsed, Request::Ping);
}

#[tokio::test]
async fn closed_connection_is_reported_as_such() {
    let (client, mut server) = tokio::io::duplex(1024);
    drop(client);

    assert!(matches!(
        read_message(&mut server).await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    let huge = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut client, &huge)
        .await
        .unwrap();

    assert!(matches!(
        read_message(&mut server).await,
        Err(ProtocolError::MessageTooLarge { .. })
    ));
}
