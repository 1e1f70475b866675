//! Simple profiling macros using thread-local storage
//!
//! This module provides lightweight profiling without changing function signatures.
//! Enable with environment variable: SNAKE_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Profiled categories, in report order
pub const CATEGORIES: [&str; 6] = ["move_gen", "apply_move", "eval", "flood_fill", "territory", "search"];

thread_local! {
    static LOCAL_TIME: RefCell<[u64; 6]> = RefCell::new([0; 6]);
    static LOCAL_COUNT: RefCell<[usize; 6]> = RefCell::new([0; 6]);
}

// Global aggregators
static GLOBAL_TIME: [AtomicU64; 6] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static GLOBAL_COUNT: [AtomicUsize; 6] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether SNAKE_PROFILE was set; read once per process
#[inline]
pub fn is_profiling_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var_os("SNAKE_PROFILE").is_some())
}

fn category_index(category: &str) -> Option<usize> {
    CATEGORIES.iter().position(|c| *c == category)
}

pub struct ProfileGuard {
    start: Instant,
    slot: usize,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if !is_profiling_enabled() {
            return None;
        }
        category_index(category).map(|slot| ProfileGuard {
            start: Instant::now(),
            slot,
        })
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let slot = self.slot;
        LOCAL_TIME.with(|t| t.borrow_mut()[slot] += elapsed_ns);
        LOCAL_COUNT.with(|c| c.borrow_mut()[slot] += 1);
    }
}

/// Folds this thread's counters into the global totals and clears them.
/// Call at the end of every unit of work scheduled on a worker thread.
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    LOCAL_TIME.with(|t| {
        let mut local = t.borrow_mut();
        for (slot, value) in local.iter_mut().enumerate() {
            GLOBAL_TIME[slot].fetch_add(*value, Ordering::Relaxed);
            *value = 0;
        }
    });
    LOCAL_COUNT.with(|c| {
        let mut local = c.borrow_mut();
        for (slot, value) in local.iter_mut().enumerate() {
            GLOBAL_COUNT[slot].fetch_add(*value, Ordering::Relaxed);
            *value = 0;
        }
    });
}

/// Merged (total nanoseconds, calls) for a category
pub fn totals(category: &str) -> (u64, usize) {
    match category_index(category) {
        Some(slot) => (
            GLOBAL_TIME[slot].load(Ordering::Relaxed),
            GLOBAL_COUNT[slot].load(Ordering::Relaxed),
        ),
        None => (0, 0),
    }
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }
    merge_thread_local();

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for category in CATEGORIES.iter() {
        let (time_ns, count) = totals(category);
        let ms = time_ns as f64 / 1_000_000.0;
        // Nested categories (flood fill inside eval, everything inside
        // search) overlap, so percentages do not add up to 100
        let pct = if total_ns > 0 { 100.0 * time_ns as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time_ns as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!("{}:", category);
        eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
        eprintln!("  Calls:    {}", count);
        eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
    }

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    for slot in 0..CATEGORIES.len() {
        GLOBAL_TIME[slot].store(0, Ordering::Relaxed);
        GLOBAL_COUNT[slot].store(0, Ordering::Relaxed);
    }
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_is_ignored() {
        assert_eq!(category_index("alpha_beta"), None);
        assert_eq!(totals("alpha_beta"), (0, 0));
    }

    #[test]
    fn test_enabled_flag_is_read_once() {
        let before = is_profiling_enabled();
        if before {
            std::env::remove_var("SNAKE_PROFILE");
        } else {
            std::env::set_var("SNAKE_PROFILE", "1");
        }
        let after = is_profiling_enabled();

        if before {
            std::env::set_var("SNAKE_PROFILE", "1");
        } else {
            std::env::remove_var("SNAKE_PROFILE");
        }
        assert_eq!(before, after);
    }

    #[test]
    fn test_every_category_has_a_slot() {
        for (i, c) in CATEGORIES.iter().enumerate() {
            assert_eq!(category_index(c), Some(i));
        }
    }
}
