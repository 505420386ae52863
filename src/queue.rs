//! Outbound task queue linking the control surface to the dispatcher.

use poise::serenity_prelude::{ChannelId, UserId};
use tokio::sync::mpsc;

/// A unit of work asking the bot to proactively send a message. Created by
/// the control surface, consumed exactly once by the dispatcher's poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundTask {
    ChannelMessage { channel_id: ChannelId, content: String },
    DirectMessage { user_id: UserId, content: String },
}

/// Producer half of the queue. Cloneable; every control-surface handler
/// holds one.
#[derive(Debug, Clone)]
pub struct TaskSender {
    tx: mpsc::UnboundedSender<OutboundTask>,
}

/// Consumer half of the queue; exactly one exists.
#[derive(Debug)]
pub struct TaskReceiver {
    rx: mpsc::UnboundedReceiver<OutboundTask>,
}

/// Creates the unbounded FIFO pair. Pushes never block and never apply
/// backpressure.
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskSender { tx }, TaskReceiver { rx })
}

impl TaskSender {
    /// Enqueues a task. Fails only when the consumer is gone, in which
    /// case the task is returned to the caller.
    pub fn push(&self, task: OutboundTask) -> std::result::Result<(), OutboundTask> {
        self.tx.send(task).map_err(|err| err.0)
    }
}

impl TaskReceiver {
    /// Non-blocking pop; `None` when the queue is currently empty.
    pub fn try_pop(&mut self) -> Option<OutboundTask> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_task(n: u64) -> OutboundTask {
        OutboundTask::ChannelMessage {
            channel_id: ChannelId::new(100),
            content: format!("message {n}"),
        }
    }

    #[test]
    fn pops_in_push_order() {
        let (tx, mut rx) = task_queue();
        for n in 1..=3 {
            tx.push(channel_task(n)).expect("push");
        }

        assert_eq!(rx.try_pop(), Some(channel_task(1)));
        assert_eq!(rx.try_pop(), Some(channel_task(2)));
        assert_eq!(rx.try_pop(), Some(channel_task(3)));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn push_fails_once_consumer_is_dropped() {
        let (tx, rx) = task_queue();
        drop(rx);
        let task = channel_task(1);
        assert_eq!(tx.push(task.clone()), Err(task));
    }

    #[tokio::test]
    async fn concurrent_producers_deliver_every_task_exactly_once() {
        const PRODUCERS: u64 = 8;
        const PER_PRODUCER: u64 = 50;

        let (tx, mut rx) = task_queue();

        let mut handles = Vec::new();
        for producer in 0..PRODUCERS {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..PER_PRODUCER {
                    tx.push(OutboundTask::DirectMessage {
                        user_id: UserId::new(producer + 1),
                        content: n.to_string(),
                    })
                    .expect("push");
                }
            }));
        }
        for handle in handles {
            handle.await.expect("producer");
        }
        drop(tx);

        // Drain and check per-producer FIFO order with no loss or
        // duplication.
        let mut next_expected = vec![0u64; PRODUCERS as usize];
        let mut total = 0u64;
        while let Some(task) = rx.try_pop() {
            let OutboundTask::DirectMessage { user_id, content } = task else {
                panic!("unexpected task variant");
            };
            let producer = (user_id.get() - 1) as usize;
            let n: u64 = content.parse().expect("sequence number");
            assert_eq!(n, next_expected[producer], "per-producer order broken");
            next_expected[producer] += 1;
            total += 1;
        }

        assert_eq!(total, PRODUCERS * PER_PRODUCER);
        assert!(next_expected.iter().all(|&n| n == PER_PRODUCER));
    }
}
