//! # Mail Dispatch
//!
//! `notify` only enqueues; a background worker hands each message to a
//! [`MailTransport`]. A failed delivery is logged and never reaches the
//! booking that triggered it. The queue is bounded: when the transport falls
//! behind, new mails are dropped with an error log.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{MailData, Notifier};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &MailData) -> anyhow::Result<()>;
}

/// Writes each message to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, mail: &MailData) -> anyhow::Result<()> {
        tracing::info!(
            to = %mail.to,
            from = %mail.from,
            subject = %mail.subject,
            "mail delivered to log transport"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailDispatcher {
    queue: mpsc::Sender<MailData>,
}

impl MailDispatcher {
    /// Starts the delivery worker with room for `capacity` pending mails.
    /// It stops once every dispatcher clone has been dropped and the queue
    /// is drained.
    pub fn spawn(transport: Arc<dyn MailTransport>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, mut inbox) = mpsc::channel::<MailData>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(mail) = inbox.recv().await {
                if let Err(err) = transport.deliver(&mail).await {
                    tracing::error!(to = %mail.to, subject = %mail.subject, error = %err, "mail delivery failed");
                }
            }
            tracing::debug!("mail worker stopped");
        });
        (Self { queue }, worker)
    }
}

impl Notifier for MailDispatcher {
    fn notify(&self, mail: MailData) {
        match self.queue.try_send(mail) {
            Ok(()) => {}
            Err(TrySendError::Full(mail)) => {
                tracing::error!(to = %mail.to, subject = %mail.subject, "mail queue full, message dropped");
            }
            Err(TrySendError::Closed(mail)) => {
                tracing::error!(to = %mail.to, "mail worker is gone, message dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailTransport for Recording {
        async fn deliver(&self, mail: &MailData) -> anyhow::Result<()> {
            if mail.to.is_empty() {
                anyhow::bail!("no recipient");
            }
            self.sent.lock().unwrap().push(mail.to.clone());
            Ok(())
        }
    }

    fn mail(to: &str) -> MailData {
        MailData {
            to: to.to_string(),
            from: "reservations@bookings.local".to_string(),
            subject: "Reservation Confirmation".to_string(),
            content: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_worker() {
        let transport = Arc::new(Recording::default());
        let (dispatcher, worker) = MailDispatcher::spawn(transport.clone(), 8);

        dispatcher.notify(mail(""));
        dispatcher.notify(mail("john@smith.com"));
        drop(dispatcher);
        worker.await.unwrap();

        assert_eq!(*transport.sent.lock().unwrap(), vec!["john@smith.com".to_string()]);
    }

    /// Holds every delivery until released.
    struct Stalled {
        release: tokio::sync::Notify,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailTransport for Stalled {
        async fn deliver(&self, mail: &MailData) -> anyhow::Result<()> {
            self.release.notified().await;
            self.sent.lock().unwrap().push(mail.to.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn a_full_queue_drops_instead_of_growing() {
        let transport = Arc::new(Stalled {
            release: tokio::sync::Notify::new(),
            sent: Mutex::new(Vec::new()),
        });
        let (dispatcher, worker) = MailDispatcher::spawn(transport.clone(), 1);

        dispatcher.notify(mail("first@smith.com"));
        // Let the worker take the first mail and block in the transport.
        tokio::task::yield_now().await;
        while dispatcher.queue.capacity() == 0 {
            tokio::task::yield_now().await;
        }
        dispatcher.notify(mail("second@smith.com"));
        dispatcher.notify(mail("third@smith.com"));
        drop(dispatcher);

        transport.release.notify_one();
        transport.release.notify_one();
        worker.await.unwrap();

        assert_eq!(
            *transport.sent.lock().unwrap(),
            vec!["first@smith.com".to_string(), "second@smith.com".to_string()]
        );
    }
}
