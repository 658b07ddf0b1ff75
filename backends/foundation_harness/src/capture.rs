//! Output capture.
//!
//! [`CaptureStream`] tees every write to the real stream and, while its
//! capture is active, to an in-memory buffer. [`CaptureOutput`] pairs one
//! for stdout and one for stderr; hand its streams to the code under test
//! in place of the process streams, then inspect [`CaptureOutput::out`] and
//! [`CaptureOutput::err`].
//!
//! Only writes made through [`CaptureOutput::stdout`] and
//! [`CaptureOutput::stderr`] are captured. `println!`, `eprintln!` and
//! direct use of [`std::io::stdout`] bypass the capture, so code under test
//! must take its output writer as a parameter for its output to be seen.

use core::fmt;
use std::io::{self, Stderr, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A cloneable writer duplicating writes into a capture buffer.
pub struct CaptureStream<W> {
    inner: Arc<Mutex<W>>,
    buffer: Arc<Mutex<Vec<u8>>>,
    active: Arc<AtomicBool>,
}

impl<W> Clone for CaptureStream<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            buffer: Arc::clone(&self.buffer),
            active: Arc::clone(&self.active),
        }
    }
}

impl<W: Write> CaptureStream<W> {
    fn new(inner: W, active: Arc<AtomicBool>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            active,
        }
    }

    /// Everything captured so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn getvalue(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }

    /// Gives access to the real stream, e.g. to check what it received.
    pub fn with_inner<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        let inner = lock(&self.inner);
        f(&*inner)
    }
}

impl<W: Write> Write for CaptureStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = lock(&self.inner).write(buf)?;
        if self.active.load(Ordering::SeqCst) {
            lock(&self.buffer).extend_from_slice(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.inner).flush()
    }
}

/// Captures a stdout/stderr pair.
pub struct CaptureOutput<O: Write = Stdout, E: Write = Stderr> {
    out: CaptureStream<O>,
    err: CaptureStream<E>,
    active: Arc<AtomicBool>,
}

impl CaptureOutput<Stdout, Stderr> {
    /// Wraps the process stdout and stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(io::stdout(), io::stderr())
    }
}

impl Default for CaptureOutput<Stdout, Stderr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> CaptureOutput<O, E> {
    /// Wraps arbitrary writers standing in for stdout and stderr.
    pub fn with_streams(out: O, err: E) -> Self {
        let active = Arc::new(AtomicBool::new(false));
        Self {
            out: CaptureStream::new(out, Arc::clone(&active)),
            err: CaptureStream::new(err, Arc::clone(&active)),
            active,
        }
    }

    /// Starts capturing until the returned guard is dropped.
    #[must_use = "capture stops as soon as the guard is dropped"]
    pub fn activate(&self) -> CaptureGuard<'_, O, E> {
        self.active.store(true, Ordering::SeqCst);
        tracing::debug!("output capture activated");
        CaptureGuard { capture: self }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Writer to hand out in place of stdout.
    #[must_use]
    pub fn stdout(&self) -> CaptureStream<O> {
        self.out.clone()
    }

    /// Writer to hand out in place of stderr.
    #[must_use]
    pub fn stderr(&self) -> CaptureStream<E> {
        self.err.clone()
    }

    #[must_use]
    pub fn out(&self) -> String {
        self.out.getvalue()
    }

    #[must_use]
    pub fn err(&self) -> String {
        self.err.getvalue()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.out().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scope of an active capture; deactivates on drop.
pub struct CaptureGuard<'a, O: Write, E: Write> {
    capture: &'a CaptureOutput<O, E>,
}

impl<O: Write, E: Write> Drop for CaptureGuard<'_, O, E> {
    fn drop(&mut self) {
        self.capture.active.store(false, Ordering::SeqCst);
        tracing::debug!("output capture deactivated");
    }
}

impl<O: Write, E: Write> fmt::Display for CaptureOutput<O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out())
    }
}

impl<O: Write, E: Write> PartialEq<&str> for CaptureOutput<O, E> {
    fn eq(&self, other: &&str) -> bool {
        self.out() == *other
    }
}

impl<O: Write, E: Write> PartialEq<str> for CaptureOutput<O, E> {
    fn eq(&self, other: &str) -> bool {
        self.out() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_inside_scope_are_captured_and_forwarded() {
        let capture = CaptureOutput::with_streams(Vec::new(), Vec::new());
        let mut out = capture.stdout();
        {
            let _scope = capture.activate();
            write!(out, "hello").expect("write");
        }

        assert_eq!(capture.out(), "hello");
        assert!(capture == "hello");
        assert_eq!(capture.to_string(), "hello");
        assert_eq!(capture.len(), 5);
        out.with_inner(|real| assert_eq!(real.as_slice(), b"hello"));
    }

    #[test]
    fn test_writes_after_scope_are_not_captured() {
        let capture = CaptureOutput::with_streams(Vec::new(), Vec::new());
        let mut err = capture.stderr();
        {
            let _scope = capture.activate();
            assert!(capture.is_active());
            err.write_all(b"inside").expect("write");
        }
        assert!(!capture.is_active());
        err.write_all(b" outside").expect("write");

        assert_eq!(capture.err(), "inside");
        assert!(capture.out().is_empty());
        err.with_inner(|real| assert_eq!(real.as_slice(), b"inside outside"));
    }

    #[test]
    fn test_writes_before_activation_are_not_captured() {
        let capture = CaptureOutput::with_streams(Vec::new(), Vec::new());
        let mut out = capture.stdout();
        out.write_all(b"early").expect("write");
        assert!(capture.is_empty());
    }
}
