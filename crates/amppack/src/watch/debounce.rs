use std::{future::Future, path::PathBuf, time::Duration};

use rustc_hash::FxHashSet;
use tokio::{
  select,
  sync::mpsc::UnboundedReceiver,
  task::JoinHandle,
  time::sleep,
};

pub(crate) struct DebouncedReceiver {
  // Kept on the struct so items received by an unfinished `recv` are not lost.
  received_items: FxHashSet<PathBuf>,
  receiver: UnboundedReceiver<Vec<PathBuf>>,
  delay: Duration,
}

impl DebouncedReceiver {
  pub fn new(receiver: UnboundedReceiver<Vec<PathBuf>>, delay: Duration) -> Self {
    Self { received_items: FxHashSet::default(), receiver, delay }
  }

  /// Waits for a change, then until `delay` passes without another one.
  pub async fn recv(&mut self) -> Option<Vec<PathBuf>> {
    if self.received_items.is_empty() {
      self.received_items.extend(self.receiver.recv().await?);
    }

    loop {
      select! {
        items = self.receiver.recv() => match items {
          Some(items) => self.received_items.extend(items),
          None => return Some(self.received_items.drain().collect()),
        },
        () = sleep(self.delay) => {
          return Some(self.received_items.drain().collect());
        }
      }
    }
  }
}

/// Calls `on_change` once per burst of changes, never while a previous call is
/// still running. Stops when the senders are gone or `on_change` returns `false`.
pub(crate) fn spawn_debounced<F, Fut>(mut receiver: DebouncedReceiver, mut on_change: F) -> JoinHandle<()>
where
  F: FnMut(Vec<PathBuf>) -> Fut + Send + 'static,
  Fut: Future<Output = bool> + Send,
{
  tokio::spawn(async move {
    while let Some(changed) = receiver.recv().await {
      if !on_change(changed).await {
        break;
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn bursts_collapse_into_one_call() {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let task = spawn_debounced(DebouncedReceiver::new(receiver, Duration::from_millis(1000)), {
      let calls = Arc::clone(&calls);
      move |_| {
        let calls = Arc::clone(&calls);
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          true
        }
      }
    });

    for _ in 0..5 {
      sender.send(vec![PathBuf::from("src/amp.js")]).unwrap();
      sleep(Duration::from_millis(100)).await;
    }
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sender.send(vec![PathBuf::from("src/amp.js")]).unwrap();
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    drop(sender);
    task.await.unwrap();
  }
}
