//! Integration tests for the line-protocol sender's flush policy.
//!
//! These tests run a sender against the fake QuestDB and count the `/write`
//! requests produced by appends under each auto-flush setting.

mod common;

use common::FakeQuestDb;
use questdb_mcp_server::db::{LineSender, Row};
use questdb_mcp_server::models::FieldValue;
use std::time::Duration;

fn row(value: i64) -> Row {
    let mut row = Row::new("metrics");
    row.field("v", FieldValue::Long(value));
    row
}

fn sender(fake: &FakeQuestDb, options: &str) -> LineSender {
    LineSender::from_conf(&format!("http::addr=127.0.0.1:{};{}", fake.port, options)).unwrap()
}

/// Test that rows stay buffered until an explicit flush when auto-flush is off.
#[tokio::test]
async fn test_auto_flush_off_buffers_until_flush() {
    let fake = FakeQuestDb::start().await;
    let mut sender = sender(&fake, "auto_flush=off;auto_flush_rows=1;");

    sender.append(&row(1)).await.unwrap();
    sender.append(&row(2)).await.unwrap();
    assert_eq!(sender.pending_rows(), 2);
    assert!(fake.requests().is_empty());

    sender.flush().await.unwrap();
    assert_eq!(sender.pending_rows(), 0);

    let writes = fake.requests_to("/write");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].body, "metrics v=1i\nmetrics v=2i\n");
}

/// Test that reaching the row threshold sends every buffered row at once.
#[tokio::test]
async fn test_auto_flush_by_row_count() {
    let fake = FakeQuestDb::start().await;
    let mut sender = sender(&fake, "auto_flush_rows=2;");

    sender.append(&row(1)).await.unwrap();
    assert_eq!(sender.pending_rows(), 1);
    assert!(fake.requests().is_empty());

    sender.append(&row(2)).await.unwrap();
    assert_eq!(sender.pending_rows(), 0);

    let writes = fake.requests_to("/write");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].body, "metrics v=1i\nmetrics v=2i\n");

    // Nothing left to send.
    sender.flush().await.unwrap();
    assert_eq!(fake.requests_to("/write").len(), 1);
}

/// Test that the first append after the interval has elapsed flushes.
#[tokio::test]
async fn test_auto_flush_by_interval() {
    let fake = FakeQuestDb::start().await;
    let mut sender = sender(&fake, "auto_flush_interval=200;");

    sender.append(&row(1)).await.unwrap();
    assert_eq!(sender.pending_rows(), 1);
    assert!(fake.requests().is_empty());

    tokio::time::sleep(Duration::from_millis(250)).await;
    sender.append(&row(2)).await.unwrap();
    assert_eq!(sender.pending_rows(), 0);

    let writes = fake.requests_to("/write");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].body, "metrics v=1i\nmetrics v=2i\n");
}

/// Test that a closed sender refuses further rows and closing again is a no-op.
#[tokio::test]
async fn test_close_flushes_then_refuses_appends() {
    let fake = FakeQuestDb::start().await;
    let mut sender = sender(&fake, "auto_flush=off;");

    sender.append(&row(1)).await.unwrap();
    sender.close().await.unwrap();
    assert_eq!(fake.requests_to("/write").len(), 1);

    assert!(sender.append(&row(2)).await.is_err());
    sender.close().await.unwrap();
    assert_eq!(fake.requests_to("/write").len(), 1);
}
