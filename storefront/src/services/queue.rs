// storefront/src/services/queue.rs

//! At-least-once message queue between the CSV parser and the catalog
//! batch consumer.
//!
//! A received message stays in flight until it is acknowledged or released.
//! Released messages go back to the tail of the queue, unless they have
//! already been received `max_receives` times, in which case they move to the
//! dead-letter list.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
  pub id: Uuid,
  pub body: String,
  /// Deliveries so far, including the current one.
  pub receive_count: u32,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
  async fn send(&self, body: String) -> Result<Uuid>;
  /// Up to `max` messages; an empty vector when the queue is idle.
  async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;
  async fn ack(&self, id: Uuid) -> Result<()>;
  async fn release(&self, id: Uuid) -> Result<()>;
}

#[derive(Debug, Default)]
struct QueueState {
  ready: VecDeque<QueueMessage>,
  in_flight: HashMap<Uuid, QueueMessage>,
  dead_letters: Vec<QueueMessage>,
}

#[derive(Debug)]
pub struct MemoryQueue {
  state: Mutex<QueueState>,
  max_receives: u32,
  fail_sends: Mutex<bool>,
}

impl MemoryQueue {
  pub fn new(max_receives: u32) -> Self {
    Self {
      state: Mutex::new(QueueState::default()),
      max_receives: max_receives.max(1),
      fail_sends: Mutex::new(false),
    }
  }

  /// Makes `send` fail with `StoreUnavailable` until reset.
  pub fn set_fail_sends(&self, fail: bool) {
    *self.fail_sends.lock() = fail;
  }

  pub fn ready_len(&self) -> usize {
    self.state.lock().ready.len()
  }

  pub fn in_flight_len(&self) -> usize {
    self.state.lock().in_flight.len()
  }

  pub fn dead_letters(&self) -> Vec<QueueMessage> {
    self.state.lock().dead_letters.clone()
  }
}

impl Default for MemoryQueue {
  fn default() -> Self {
    Self::new(5)
  }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
  async fn send(&self, body: String) -> Result<Uuid> {
    if *self.fail_sends.lock() {
      return Err(AppError::StoreUnavailable("queue refused the message".to_string()));
    }
    let id = Uuid::new_v4();
    self.state.lock().ready.push_back(QueueMessage {
      id,
      body,
      receive_count: 0,
    });
    Ok(id)
  }

  async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
    let mut state = self.state.lock();
    let take = max.min(state.ready.len());
    let mut batch = Vec::with_capacity(take);
    for _ in 0..take {
      if let Some(mut message) = state.ready.pop_front() {
        message.receive_count += 1;
        state.in_flight.insert(message.id, message.clone());
        batch.push(message);
      }
    }
    Ok(batch)
  }

  async fn ack(&self, id: Uuid) -> Result<()> {
    if self.state.lock().in_flight.remove(&id).is_none() {
      debug!(message_id = %id, "Ack for a message that is not in flight.");
    }
    Ok(())
  }

  async fn release(&self, id: Uuid) -> Result<()> {
    let mut state = self.state.lock();
    let message = state
      .in_flight
      .remove(&id)
      .ok_or_else(|| AppError::NotFound(format!("Message {} is not in flight", id)))?;

    if message.receive_count >= self.max_receives {
      warn!(message_id = %id, receives = message.receive_count, "Message moved to dead letters.");
      state.dead_letters.push(message);
    } else {
      state.ready.push_back(message);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn released_messages_are_redelivered_until_dead_lettered() {
    let queue = MemoryQueue::new(2);
    let id = queue.send("{}".to_string()).await.unwrap();

    let first = queue.receive(10).await.unwrap();
    assert_eq!(first[0].receive_count, 1);
    queue.release(id).await.unwrap();
    assert_eq!(queue.ready_len(), 1);

    let second = queue.receive(10).await.unwrap();
    assert_eq!(second[0].receive_count, 2);
    queue.release(id).await.unwrap();

    assert_eq!(queue.ready_len(), 0);
    assert_eq!(queue.dead_letters().len(), 1);
  }

  #[tokio::test]
  async fn receive_respects_the_batch_limit() {
    let queue = MemoryQueue::default();
    for i in 0..7 {
      queue.send(format!("{{\"n\":{}}}", i)).await.unwrap();
    }
    assert_eq!(queue.receive(5).await.unwrap().len(), 5);
    assert_eq!(queue.in_flight_len(), 5);
    assert_eq!(queue.receive(5).await.unwrap().len(), 2);
    assert!(queue.receive(5).await.unwrap().is_empty());
  }
}
