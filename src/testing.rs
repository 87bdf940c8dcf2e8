//! A referent for tests that records its claims and its destruction.

use alloc::{boxed::Box, rc::Rc};
use core::{
    cell::{Cell, UnsafeCell},
    ptr::NonNull,
};

use crate::{impl_upcast, Referenceable};

// Every field is interior-mutable so that `decrement` can free the probe
// through the `&self` it was called on.
pub(crate) struct Probe {
    claims: Cell<usize>,
    destroyed: UnsafeCell<Rc<Cell<usize>>>,
    label: Cell<u32>,
    panics_on_destroy: Cell<bool>,
}

impl Probe {
    /// Allocates a probe with no claims on it. The returned counter tracks
    /// how many times the probe has been destroyed.
    pub(crate) fn spawn(label: u32) -> (NonNull<Probe>, Rc<Cell<usize>>) {
        Self::spawn_with(label, false)
    }

    /// Like [`Self::spawn`], but the probe panics right after it has been
    /// freed.
    pub(crate) fn spawn_fragile(label: u32) -> (NonNull<Probe>, Rc<Cell<usize>>) {
        Self::spawn_with(label, true)
    }

    fn spawn_with(label: u32, panics_on_destroy: bool) -> (NonNull<Probe>, Rc<Cell<usize>>) {
        let destroyed = Rc::new(Cell::new(0));
        let probe = Box::new(Probe {
            claims: Cell::new(0),
            destroyed: UnsafeCell::new(Rc::clone(&destroyed)),
            label: Cell::new(label),
            panics_on_destroy: Cell::new(panics_on_destroy),
        });
        (NonNull::from(Box::leak(probe)), destroyed)
    }

    /// Reads the claim count of a probe that is known to be alive.
    pub(crate) fn claims_of(probe: NonNull<Probe>) -> usize {
        unsafe { probe.as_ref() }.claims.get()
    }
}

unsafe impl Referenceable for Probe {
    fn increment(&self) {
        self.claims.set(self.claims.get() + 1);
    }

    unsafe fn decrement(&self) {
        let claims = self.claims.get();
        assert!(claims > 0, "probe {} released more often than claimed", self.label());
        self.claims.set(claims - 1);
        if claims == 1 {
            let destroyed = unsafe { &*self.destroyed.get() };
            destroyed.set(destroyed.get() + 1);
            let label = self.label();
            let panics = self.panics_on_destroy.get();
            drop(unsafe { Box::from_raw(self as *const Self as *mut Self) });
            if panics {
                panic!("probe {label} failed while being destroyed");
            }
        }
    }
}

pub(crate) trait Labelled: Referenceable {
    fn label(&self) -> u32;
}

impl Labelled for Probe {
    fn label(&self) -> u32 {
        self.label.get()
    }
}

impl_upcast!(Probe => dyn Labelled);
