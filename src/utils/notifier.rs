use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use sqlx::MySqlPool;

/// A side-effect write queued off the request path. Handlers enqueue and
/// move on; the worker owns persistence and its failure policy.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<OutboundNotification>,
}

impl Notifier {
    pub fn channel() -> (Self, UnboundedReceiver<OutboundNotification>) {
        let (tx, rx) = mpsc::unbounded();
        (Notifier { tx }, rx)
    }

    /// Never fails the caller; a closed queue drops the message with a log.
    pub fn enqueue(&self, notification: OutboundNotification) {
        if self.tx.unbounded_send(notification).is_err() {
            tracing::warn!("Notification queue closed, dropping message");
        }
    }
}

/// Background worker draining the queue: one retry per message, then drop.
/// A lost notification never rolls back the request that produced it.
pub async fn run_worker(pool: MySqlPool, mut rx: UnboundedReceiver<OutboundNotification>) {
    while let Some(msg) = rx.next().await {
        if let Err(first) = insert(&pool, &msg).await {
            tracing::warn!(error = %first, user_id = msg.user_id, "Notification insert failed, retrying");

            if let Err(second) = insert(&pool, &msg).await {
                tracing::error!(error = %second, user_id = msg.user_id, "Notification dropped after retry");
            }
        }
    }

    tracing::info!("Notification worker stopped");
}

async fn insert(pool: &MySqlPool, msg: &OutboundNotification) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT INTO notifications (user_id, title, body) VALUES (?, ?, ?)"#)
        .bind(msg.user_id)
        .bind(&msg.title)
        .bind(&msg.body)
        .execute(pool)
        .await?;

    Ok(())
}
