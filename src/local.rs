//! Ready-made referents with a non-atomic claim count, for values that stay
//! on one thread.
//!
//! This module is only included when the "local" feature is enabled, but that feature is enabled by default.

pub use crate::macroed::local::*;

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::{impl_upcast, Referenceable, ScopedRef};
    use alloc::rc::Rc;
    use core::cell::Cell;

    struct Lamp {
        watts: u32,
        dropped: Rc<Cell<usize>>,
    }

    impl Drop for Lamp {
        fn drop(&mut self) {
            self.dropped.set(self.dropped.get() + 1);
        }
    }

    trait Glow: Referenceable {
        fn watts(&self) -> u32;
    }

    impl Glow for RefCounted<Lamp> {
        fn watts(&self) -> u32 {
            self.watts
        }
    }

    impl_upcast!(RefCounted<Lamp> => dyn Glow);

    fn lamp(watts: u32) -> (ScopedRef<RefCounted<Lamp>>, Rc<Cell<usize>>) {
        let dropped = Rc::new(Cell::new(0));
        let p = RefCounted::new(Lamp {
            watts,
            dropped: Rc::clone(&dropped),
        });
        (p, dropped)
    }

    #[test]
    pub fn new() {
        let p = RefCounted::new(24_u64);
        assert_eq!(**p, 24);
        assert_eq!(RefCounted::claim_count(&p), 1);
        assert!(RefCounted::has_one_ref(&p));
    }

    #[test]
    pub fn clone_and_drop() {
        let (p, dropped) = lamp(40);
        let q = p.clone();
        assert_eq!(RefCounted::claim_count(&p), 2, "clone did not register a claim");
        assert!(!RefCounted::has_one_ref(&q));
        drop(p);
        assert_eq!(RefCounted::claim_count(&q), 1);
        assert_eq!(dropped.get(), 0);
        drop(q);
        assert_eq!(dropped.get(), 1, "value not dropped exactly once");
    }

    #[test]
    pub fn handle_from_borrowed_value() {
        let (p, dropped) = lamp(60);
        let inner: &RefCounted<Lamp> = &p;
        let q = ScopedRef::from_ref(inner);
        assert_eq!(RefCounted::claim_count(&p), 2);
        drop(p);
        assert_eq!(q.watts, 60);
        drop(q);
        assert_eq!(dropped.get(), 1);
    }

    #[test]
    pub fn released_claim_outlives_handle() {
        let (mut p, dropped) = lamp(75);
        let raw = ScopedRef::release(&mut p).unwrap();
        drop(p);
        assert_eq!(dropped.get(), 0, "released claim did not keep the value alive");

        // Hand the claim back through a fresh handle.
        let q = unsafe { ScopedRef::from_raw(raw.as_ptr()) };
        assert_eq!(RefCounted::claim_count(&q), 2);
        unsafe { raw.as_ref().decrement() };
        drop(q);
        assert_eq!(dropped.get(), 1);
    }

    #[test]
    pub fn trait_object_handles() {
        let (p, dropped) = lamp(100);
        let glow: ScopedRef<dyn Glow> = ScopedRef::upcast_from(&p);
        assert_eq!(glow.watts(), 100);
        assert_eq!(RefCounted::claim_count(&p), 2);

        let mut other: ScopedRef<dyn Glow> = ScopedRef::upcast(lamp(5).0);
        ScopedRef::assign(&mut other, &glow);
        assert_eq!(other.watts(), 100);
        assert_eq!(RefCounted::claim_count(&p), 3);

        drop((p, glow, other));
        assert_eq!(dropped.get(), 1);
    }

    #[test]
    pub fn debug_format() {
        let p = RefCounted::new(7_u8);
        assert_eq!(alloc::format!("{p:?}"), "ScopedRef(7)");
        let q: ScopedRef<RefCounted<u8>> = ScopedRef::null();
        assert_eq!(alloc::format!("{q:?}"), "ScopedRef(null)");
    }
}
