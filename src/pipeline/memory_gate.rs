use parking_lot::{Condvar, Mutex};

/// Backpressure gate for decoded-frame memory.
///
/// Producers acquire the byte size of each raw frame before queueing it and
/// the consuming worker releases it once the frame is hashed, so the total
/// outstanding unconsumed frame data never exceeds the budget. An item
/// larger than the whole budget is admitted once the gate is empty rather
/// than deadlocking.
#[derive(Debug)]
pub struct MemoryGate {
    budget: u64,
    outstanding: Mutex<u64>,
    released: Condvar,
}

impl MemoryGate {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            outstanding: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Block until `bytes` fits within the budget, then claim it.
    pub fn acquire(&self, bytes: u64) {
        let mut outstanding = self.outstanding.lock();
        while *outstanding > 0 && *outstanding + bytes > self.budget {
            self.released.wait(&mut outstanding);
        }
        *outstanding += bytes;
    }

    /// Return `bytes` to the budget and wake blocked producers.
    pub fn release(&self, bytes: u64) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(bytes);
        drop(outstanding);
        self.released.notify_all();
    }

    #[cfg(test)]
    fn outstanding(&self) -> u64 {
        *self.outstanding.lock()
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use super::*;

    #[test]
    fn test_acquire_within_budget_does_not_block() {
        let gate = MemoryGate::new(100);
        gate.acquire(40);
        gate.acquire(60);
        assert_eq!(gate.outstanding(), 100);
    }

    #[test]
    fn test_oversize_item_admitted_when_gate_empty() {
        let gate = MemoryGate::new(100);
        gate.acquire(10_000);
        assert_eq!(gate.outstanding(), 10_000);
        gate.release(10_000);
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn test_blocked_producer_wakes_on_release() {
        let gate = Arc::new(MemoryGate::new(100));
        gate.acquire(80);

        let gate_2 = Arc::clone(&gate);
        let producer = std::thread::spawn(move || {
            //cannot fit until the consumer releases
            gate_2.acquire(50);
        });

        std::thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());

        gate.release(80);
        producer.join().unwrap();
        assert_eq!(gate.outstanding(), 50);
    }
}
