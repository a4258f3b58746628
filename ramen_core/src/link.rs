//! Host command transport: a reader thread feeding a bounded channel.
//!
//! The polling loop must never block on I/O, so line reads happen on a
//! dedicated thread and the loop drains a bounded crossbeam channel with
//! `try_recv`. If the host floods faster than the loop drains, newly read
//! lines are dropped with a warning instead of growing an unbounded queue.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, TrySendError, bounded};
use tracing::{debug, warn};

const QUEUE_DEPTH: usize = 32;

pub struct CommandLink {
    rx: Receiver<String>,
    shutdown: Arc<AtomicBool>,
}

impl CommandLink {
    /// Spawn the reader thread over any line source (stdin in production,
    /// a cursor in tests). The thread exits on EOF, on a read error, or
    /// when the link is dropped.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = bounded::<String>(QUEUE_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = shutdown.clone();
        thread::spawn(move || {
            for line in reader.lines() {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "command link read failed, stopping");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match tx.try_send(line) {
                    Ok(()) => {}
                    Err(TrySendError::Full(dropped)) => {
                        warn!(line = %dropped, "command queue full, dropping line");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            debug!("command link reader exiting");
        });

        Self { rx, shutdown }
    }

    /// Non-blocking fetch of the next pending line.
    pub fn poll(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for CommandLink {
    fn drop(&mut self) {
        // No join: a reader blocked in read_line cannot be interrupted.
        // The flag makes it exit on its next completed read.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    fn poll_until(link: &CommandLink) -> Option<String> {
        for _ in 0..100 {
            if let Some(line) = link.poll() {
                return Some(line);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn delivers_lines_in_order_and_skips_blanks() {
        let link = CommandLink::spawn(Cursor::new("first\n\n  \nsecond\n"));
        assert_eq!(poll_until(&link).as_deref(), Some("first"));
        assert_eq!(poll_until(&link).as_deref(), Some("second"));
    }

    #[test]
    fn poll_is_nonblocking_after_eof() {
        let link = CommandLink::spawn(Cursor::new("only\n"));
        assert_eq!(poll_until(&link).as_deref(), Some("only"));
        assert_eq!(link.poll(), None);
    }
}
