//! State shared between interrupt handlers and the poll loop
//!
//! The engine, the response queue and the SPI link are each touched from
//! the step tick, the control tick, the SPI completion interrupt and the
//! poll loop. Every access goes through a critical section, so the borrow
//! inside [`with_shared`] can never be contended.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Interrupt-safe cell
pub type Shared<T> = Mutex<CriticalSectionRawMutex, RefCell<T>>;

/// Create a [`Shared`] cell, usable in a `static`
pub const fn shared<T>(value: T) -> Shared<T> {
    Mutex::new(RefCell::new(value))
}

/// Run `f` with interrupts masked
pub fn with_critical_section<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}

/// Run `f` on the contents of `cell` inside a critical section
pub fn with_shared<T, R>(cell: &Shared<T>, f: impl FnOnce(&mut T) -> R) -> R {
    cell.lock(|inner| f(&mut inner.borrow_mut()))
}
