#[cfg(feature = "local")]
use core::cell::Cell;
#[cfg(feature = "sync")]
use core::sync::atomic::{self, AtomicUsize, Ordering};

/// Counts above this are treated as a leak of handles rather than wrapped.
#[allow(unused)]
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// The storage for a claim count, shared by the two `RefCounted` flavors.
#[allow(unused)]
trait Counter {
    fn zero() -> Self;

    fn increment(&self);

    /// Returns true if this released the last claim.
    fn decrement(&self) -> bool;

    fn get(&self) -> usize;
}

#[cfg(feature = "local")]
struct LocalCount(Cell<usize>);

#[cfg(feature = "local")]
impl Counter for LocalCount {
    #[inline(always)]
    fn zero() -> Self {
        Self(Cell::new(0))
    }

    #[inline(always)]
    fn increment(&self) {
        let n = self.0.get();
        if n >= MAX_REFCOUNT {
            panic!("reference count overflow");
        }
        self.0.set(n + 1);
    }

    #[inline(always)]
    fn decrement(&self) -> bool {
        let n = self.0.get();
        debug_assert!(n > 0, "released more claims than were registered");
        self.0.set(n - 1);
        n == 1
    }

    #[inline(always)]
    fn get(&self) -> usize {
        self.0.get()
    }
}

#[cfg(feature = "sync")]
struct AtomicCount(AtomicUsize);

#[cfg(feature = "sync")]
impl Counter for AtomicCount {
    #[inline(always)]
    fn zero() -> Self {
        Self(AtomicUsize::new(0))
    }

    #[inline(always)]
    fn increment(&self) {
        // A new claim is always made from an existing one, which already
        // keeps the referent alive, so no ordering is needed here.
        let old = self.0.fetch_add(1, Ordering::Relaxed);
        if old >= MAX_REFCOUNT {
            panic!("reference count overflow");
        }
    }

    #[inline(always)]
    fn decrement(&self) -> bool {
        if self.0.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        // Every use of the value through other claims happens-before its
        // destruction.
        atomic::fence(Ordering::Acquire);
        true
    }

    #[inline(always)]
    fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(feature = "log")]
#[allow(unused)]
#[inline(always)]
fn trace_destroyed<T: ?Sized>(flavor: &str) {
    log::trace!(
        "{flavor}::RefCounted<{}> released its last claim",
        core::any::type_name::<T>()
    );
}

#[cfg(not(feature = "log"))]
#[allow(unused)]
#[inline(always)]
fn trace_destroyed<T: ?Sized>(_flavor: &str) {}

#[allow(unused)]
macro_rules! counted_wrapper {
    ($modname:ident, $counter:ident, $threading:literal) => {
        pub mod $modname {
            use alloc::boxed::Box;
            use core::{cell::UnsafeCell, fmt};

            use super::{trace_destroyed, $counter, Counter};
            use crate::{Referenceable, ScopedRef};

            #[doc = concat!("A heap-allocated value together with its own ", $threading, " claim count.

Values are only ever reachable through a [`ScopedRef`]: [`RefCounted::new`]
returns the first handle, and the value is dropped and its allocation freed
when the last claim is released. Any `&RefCounted<T>` can be turned back into a
new handle with [`ScopedRef::from_ref`].
")]
            pub struct RefCounted<T> {
                count: $counter,
                // Interior-mutable so that the `&self` passed to `decrement`
                // may free the allocation.
                value: UnsafeCell<T>,
            }

            impl<T> RefCounted<T> {
                /// Moves the value into a new allocation and returns the first
                /// handle to it.
                pub fn new(value: T) -> ScopedRef<Self> {
                    let raw = Box::into_raw(Box::new(Self {
                        count: $counter::zero(),
                        value: UnsafeCell::new(value),
                    }));
                    // Freshly allocated, so alive until its first claim goes.
                    unsafe { ScopedRef::from_raw(raw) }
                }

                /// Gets the number of outstanding claims on the value.
                #[inline(always)]
                pub fn claim_count(this: &Self) -> usize {
                    this.count.get()
                }

                /// Returns true if exactly one claim is outstanding.
                #[inline(always)]
                pub fn has_one_ref(this: &Self) -> bool {
                    this.count.get() == 1
                }
            }

            unsafe impl<T> Referenceable for RefCounted<T> {
                #[inline(always)]
                fn increment(&self) {
                    self.count.increment();
                }

                unsafe fn decrement(&self) {
                    if self.count.decrement() {
                        trace_destroyed::<T>(stringify!($modname));
                        let raw = self as *const Self as *mut Self;
                        drop(unsafe { Box::from_raw(raw) });
                    }
                }
            }

            impl<T> core::ops::Deref for RefCounted<T> {
                type Target = T;

                #[inline(always)]
                fn deref(&self) -> &T {
                    // Never mutated until the last claim frees it.
                    unsafe { &*self.value.get() }
                }
            }

            impl<T: fmt::Debug> fmt::Debug for RefCounted<T> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(&**self, f)
                }
            }
        }
    };
}

#[cfg(feature = "local")]
counted_wrapper!(local, LocalCount, "non-atomic");
#[cfg(feature = "sync")]
counted_wrapper!(sync, AtomicCount, "atomic");
