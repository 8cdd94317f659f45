use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

/// Creates an unbounded FIFO split into a cloneable write end and a single
/// read end.
pub fn event_queue<T>() -> (QueueWriter<T>, QueueReader<T>) {
    let (tx, rx) = unbounded();
    (QueueWriter { tx }, QueueReader { rx })
}

#[derive(Debug)]
pub struct QueueWriter<T> {
    tx: Sender<T>,
}

impl<T> Clone for QueueWriter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueWriter<T> {
    /// Never blocks. Returns `false` when the reader is gone and the item was
    /// dropped.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }
}

/// The only consumer of a queue. Deliberately not `Clone`.
#[derive(Debug)]
pub struct QueueReader<T> {
    rx: Receiver<T>,
}

impl<T> QueueReader<T> {
    /// Oldest pending item, or `None` without waiting.
    pub fn try_pop(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn empty_queue_returns_none_immediately() {
        let (_writer, reader) = event_queue::<u32>();
        let started = Instant::now();
        for _ in 0..1_000 {
            assert_eq!(reader.try_pop(), None);
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(reader.is_empty());
    }

    #[test]
    fn drained_queue_returns_none_again() {
        let (writer, reader) = event_queue();
        writer.push("only");
        assert_eq!(reader.try_pop(), Some("only"));
        assert_eq!(reader.try_pop(), None);
    }

    #[test]
    fn single_producer_order_is_preserved() {
        let (writer, reader) = event_queue();
        for value in 0..64 {
            assert!(writer.push(value));
        }
        assert_eq!(reader.len(), 64);
        let drained: Vec<_> = std::iter::from_fn(|| reader.try_pop()).collect();
        assert_eq!(drained, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn push_after_reader_dropped_reports_failure() {
        let (writer, reader) = event_queue();
        drop(reader);
        assert!(!writer.push(1u8));
    }

    #[test]
    fn concurrent_producers_never_lose_or_duplicate() {
        const PER_PRODUCER: u32 = 5_000;
        let (writer, reader) = event_queue::<(u8, u32)>();

        let producers: Vec<_> = (0..2u8)
            .map(|producer| {
                let writer = writer.clone();
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        writer.push((producer, seq));
                    }
                })
            })
            .collect();
        drop(writer);

        let consumer = thread::spawn(move || {
            let mut popped = Vec::new();
            let expected = (PER_PRODUCER * 2) as usize;
            let deadline = Instant::now() + Duration::from_secs(30);
            while popped.len() < expected && Instant::now() < deadline {
                match reader.try_pop() {
                    Some(item) => popped.push(item),
                    None => thread::yield_now(),
                }
            }
            popped
        });

        for producer in producers {
            producer.join().unwrap();
        }
        let popped = consumer.join().unwrap();

        let mut counts: HashMap<(u8, u32), usize> = HashMap::new();
        for item in &popped {
            *counts.entry(*item).or_default() += 1;
        }
        assert_eq!(popped.len(), (PER_PRODUCER * 2) as usize);
        assert!(counts.values().all(|&count| count == 1));

        // Per-producer order survives interleaving.
        for producer in 0..2u8 {
            let seqs: Vec<u32> = popped
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }
}
