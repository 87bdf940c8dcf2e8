//! A nullable smart pointer for objects that keep their own reference count.
//!
//! Unlike [`alloc::rc::Rc`] and [`alloc::sync::Arc`], a [`ScopedRef`] stores
//! nothing but a pointer: the count lives inside the referent itself, which
//! implements [`Referenceable`] and destroys itself when its last claim is
//! released. This is the shape of reference counting used by foreign object
//! systems and by types that need to hand out new handles starting from a
//! plain reference.
//!
//! The [`sync`] and [`local`] modules provide ready-made referents for values
//! that don't need a hand-written counter.
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;
#[cfg(test)]
#[macro_use]
extern crate std;

mod macroed;
mod referenceable;
mod scoped;

#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "sync")]
pub mod sync;

#[cfg(test)]
mod testing;

pub use referenceable::{Referenceable, Upcast};
pub use scoped::ScopedRef;
