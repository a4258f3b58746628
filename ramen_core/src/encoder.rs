//! Quadrature encoder tracking for the lift axis.
//!
//! Two edge handlers update a shared atomic counter from interrupt
//! context; the polled reporter takes a consistent snapshot and derives
//! rate and cumulative angle. Handlers do nothing beyond the
//! increment/decrement and a direction store, so they stay safe to run
//! at any preemption point.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

use ramen_traits::Hal;
use tracing::trace;

use crate::error::Result;
use crate::hal_error::hal;

/// Counter/direction pair shared between interrupt and polling contexts.
#[derive(Debug, Default)]
pub struct EncoderShared {
    count: AtomicI64,
    direction: AtomicI32,
}

impl EncoderShared {
    fn step(&self, clockwise: bool) {
        if clockwise {
            self.count.fetch_add(1, Ordering::Relaxed);
            self.direction.store(1, Ordering::Relaxed);
        } else {
            self.count.fetch_sub(1, Ordering::Relaxed);
            self.direction.store(-1, Ordering::Relaxed);
        }
    }

    /// Atomic snapshot of (count, last direction).
    pub fn snapshot(&self) -> (i64, i32) {
        (
            self.count.load(Ordering::SeqCst),
            self.direction.load(Ordering::SeqCst),
        )
    }
}

/// One polled report: rate and position derived from the counter delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderReport {
    pub count: i64,
    pub direction: i32,
    pub rev_per_sec: f32,
    pub angle_deg: f32,
}

pub struct EncoderMonitor {
    shared: Arc<EncoderShared>,
    cpr: i64,
    report_interval_ms: u64,
    last_report_ms: u64,
    last_count: i64,
}

impl EncoderMonitor {
    /// Register both channel handlers and return the polled side.
    ///
    /// On every edge of either channel the handler samples both channel
    /// levels; A==B on an A edge (or A!=B on a B edge) is clockwise.
    pub fn attach(
        h: &Arc<dyn Hal>,
        pin_a: u8,
        pin_b: u8,
        cpr: i64,
        report_interval_ms: u64,
    ) -> Result<Self> {
        let shared = Arc::new(EncoderShared::default());

        let s = shared.clone();
        let hal_a = h.clone();
        hal(h.on_edge(
            pin_a,
            Box::new(move |_level| {
                let a = hal_a.read_digital(pin_a).unwrap_or(false);
                let b = hal_a.read_digital(pin_b).unwrap_or(false);
                s.step(a == b);
            }),
        ))?;

        let s = shared.clone();
        let hal_b = h.clone();
        hal(h.on_edge(
            pin_b,
            Box::new(move |_level| {
                let a = hal_b.read_digital(pin_a).unwrap_or(false);
                let b = hal_b.read_digital(pin_b).unwrap_or(false);
                s.step(a != b);
            }),
        ))?;

        Ok(Self {
            shared,
            cpr: cpr.max(1),
            report_interval_ms,
            last_report_ms: 0,
            last_count: 0,
        })
    }

    /// Shared cell, e.g. for tests that drive the handlers directly.
    pub fn shared(&self) -> Arc<EncoderShared> {
        self.shared.clone()
    }

    /// Cumulative angle in whole degrees from the current counter value.
    pub fn angle_deg_now(&self) -> i32 {
        let (count, _) = self.shared.snapshot();
        (count * 360 / self.cpr) as i32
    }

    /// Polled reporter. Returns `None` until the report interval has
    /// elapsed; otherwise computes the rate from the counter delta and
    /// advances the baseline.
    pub fn report(&mut self, now_ms: u64) -> Option<EncoderReport> {
        if now_ms.saturating_sub(self.last_report_ms) < self.report_interval_ms {
            return None;
        }
        let (count, direction) = self.shared.snapshot();
        let dt_s = (now_ms - self.last_report_ms) as f32 / 1000.0;
        let d_count = count - self.last_count;
        let rev_per_sec = d_count as f32 / self.cpr as f32 / dt_s;
        let angle_deg = count as f32 * 360.0 / self.cpr as f32;

        self.last_report_ms = now_ms;
        self.last_count = count;

        trace!(count, direction, rev_per_sec, angle_deg, "encoder report");
        Some(EncoderReport {
            count,
            direction,
            rev_per_sec,
            angle_deg,
        })
    }
}
