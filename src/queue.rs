//! Mutex + condition-variable FIFO shared between producer threads and one
//! draining consumer.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug)]
pub struct ThreadSafeQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ThreadSafeQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, value: T) {
        self.items.lock().push_back(value);
        self.ready.notify_one();
    }

    /// Block until an item is available.
    pub fn wait_and_pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(v) = items.pop_front() {
                return v;
            }
            self.ready.wait(&mut items);
        }
    }

    /// Block for at most `timeout`.
    pub fn wait_and_pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items.lock();
        if items.is_empty() {
            self.ready.wait_while_for(&mut items, |q| q.is_empty(), timeout);
        }
        items.pop_front()
    }

    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Take everything queued so far in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl<T: Clone> Clone for ThreadSafeQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: Mutex::new(self.items.lock().clone()),
            ready: Condvar::new(),
        }
    }
}
