//! Dynamic allocation and destruction smoke program.
//!
//! Exercises heap allocation of plain records and record arrays, dynamic
//! dispatch and destruction through trait objects, fallible ("nothrow")
//! allocation, and the raw allocator primitives
//! (allocate / construct / destroy / deallocate).

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use stdprobe_harness::{TestHarness, raise};
use thiserror::Error;

use crate::trace::Trace;

/// Length of the record array the program allocates.
pub const RECORD_ARRAY_LEN: usize = 25;
/// Length of the `Base` array the program allocates.
pub const BASE_ARRAY_LEN: usize = 3;
/// Length of the trait-object array the program allocates.
pub const SUB_ARRAY_LEN: usize = 2;

/// An allocation request the allocator refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("allocation of {requested} bytes failed: {reason}")]
pub struct AllocationFault {
    pub requested: usize,
    pub reason: String,
}

/// Plain data with no destructor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Record {
    pub a: i32,
    pub b: f32,
}

/// Something that can describe itself through dynamic dispatch.
pub trait Printable {
    fn print(&self) -> String;
}

/// Traced object whose construction, print and drop land in a [`Trace`].
#[derive(Debug)]
pub struct Base {
    a: i32,
    trace: Trace,
}

impl Base {
    #[must_use]
    pub fn new(trace: &Trace) -> Self {
        let base = Self {
            a: 0,
            trace: trace.clone(),
        };
        trace.push(format!("base: construct a={}", base.a));
        base
    }

    #[must_use]
    pub fn a(&self) -> i32 {
        self.a
    }
}

impl Printable for Base {
    fn print(&self) -> String {
        let line = format!("base: print a={}", self.a);
        self.trace.push(line.clone());
        line
    }
}

impl Drop for Base {
    fn drop(&mut self) {
        self.trace.push("base: destroy");
    }
}

/// Extends [`Base`] by composition; drops its own part before the base part.
#[derive(Debug)]
pub struct Sub {
    base: Base,
    f: f32,
}

impl Sub {
    #[must_use]
    pub fn new(trace: &Trace) -> Self {
        let sub = Self {
            base: Base::new(trace),
            f: 0.0,
        };
        trace.push(format!("sub: construct a={} f={:.6}", sub.base.a, sub.f));
        sub
    }
}

impl Printable for Sub {
    fn print(&self) -> String {
        let line = format!("sub: print a={} f={:.6}", self.base.a, self.f);
        self.base.trace.push(line.clone());
        line
    }
}

impl Drop for Sub {
    fn drop(&mut self) {
        self.base.trace.push("sub: destroy");
    }
}

/// Storage for one `T` obtained straight from the global allocator.
///
/// Construction and destruction are separate from allocation, mirroring an
/// allocator's `allocate` / `construct` / `destroy` / `deallocate` cycle.
/// Dropping the slot destroys any live value and releases the storage.
pub struct Slot<T> {
    ptr: NonNull<T>,
    occupied: bool,
    _owns: PhantomData<T>,
}

impl<T> Slot<T> {
    /// Allocate uninitialized storage for one `T`.
    pub fn allocate() -> Result<Self, AllocationFault> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                occupied: false,
                _owns: PhantomData,
            });
        }
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or_else(|| AllocationFault {
            requested: layout.size(),
            reason: "allocator returned null".to_string(),
        })?;
        Ok(Self {
            ptr,
            occupied: false,
            _owns: PhantomData,
        })
    }

    /// Allocate storage, then construct `make()` in it. The value is only
    /// built once the storage exists.
    pub fn try_new_with(make: impl FnOnce() -> T) -> Result<Self, AllocationFault> {
        let mut slot = Self::allocate()?;
        slot.construct(make());
        Ok(slot)
    }

    /// Place `value` in the slot, destroying any previous occupant first.
    pub fn construct(&mut self, value: T) {
        self.destroy();
        // SAFETY: ptr is valid and aligned for T and currently holds no live value.
        unsafe { self.ptr.as_ptr().write(value) };
        self.occupied = true;
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: occupied implies ptr holds a live, initialized T.
        self.occupied.then(|| unsafe { self.ptr.as_ref() })
    }

    /// Run the occupant's destructor, keeping the storage. Returns false if
    /// the slot was already empty.
    pub fn destroy(&mut self) -> bool {
        if !self.occupied {
            return false;
        }
        // Cleared first so a panicking destructor cannot cause a second drop.
        self.occupied = false;
        // SAFETY: the slot held a live T which is now no longer reachable.
        unsafe { ptr::drop_in_place(self.ptr.as_ptr()) };
        true
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Release the storage.
    pub fn deallocate(self) {
        drop(self);
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        self.destroy();
        let layout = Layout::new::<T>();
        if layout.size() != 0 {
            // SAFETY: ptr came from alloc::alloc with this same layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}

/// Allocate a single record, set `a = 5`, free it. Returns the stored value.
pub fn single_record(trace: &Trace) -> i32 {
    let mut record = Box::new(Record::default());
    record.a = 5;
    trace.push(format!("record: a={}", record.a));
    record.a
}

/// Allocate `len` default records, free them. Returns the allocated length.
pub fn record_array(trace: &Trace, len: usize) -> usize {
    let records = vec![Record::default(); len].into_boxed_slice();
    trace.push(format!("record: array len={}", records.len()));
    records.len()
}

pub fn base_object(trace: &Trace) {
    let base = Box::new(Base::new(trace));
    base.print();
}

pub fn base_array(trace: &Trace, len: usize) {
    let bases: Box<[Base]> = (0..len).map(|_| Base::new(trace)).collect();
    for base in bases.iter() {
        base.print();
    }
}

/// Allocate a [`Sub`] behind a `Box<dyn Printable>` and drop it through the
/// trait object.
pub fn polymorphic_object(trace: &Trace) {
    let object: Box<dyn Printable> = Box::new(Sub::new(trace));
    object.print();
}

pub fn polymorphic_array(trace: &Trace, len: usize) {
    let objects: Vec<Box<dyn Printable>> = (0..len)
        .map(|_| Box::new(Sub::new(trace)) as Box<dyn Printable>)
        .collect();
    for object in &objects {
        object.print();
    }
}

/// Reserve room for `count` records without aborting on failure.
pub fn nothrow_allocate(count: usize) -> Result<Vec<Record>, AllocationFault> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(count)
        .map_err(|err| AllocationFault {
            requested: count.saturating_mul(size_of::<Record>()),
            reason: err.to_string(),
        })?;
    Ok(records)
}

/// Like [`nothrow_allocate`], but signals an [`AllocationFault`] on failure.
pub fn allocate_or_fault(count: usize) -> Vec<Record> {
    nothrow_allocate(count).unwrap_or_else(|fault| raise(fault))
}

/// Allocate a single [`Base`] through the fallible path, print it, free it.
pub fn nothrow_base(trace: &Trace) -> Result<(), AllocationFault> {
    let mut slot = Slot::<Base>::try_new_with(|| Base::new(trace))?;
    trace.push("nothrow: allocate base");
    if let Some(base) = slot.get() {
        base.print();
    }
    slot.destroy();
    Ok(())
}

/// One allocate / construct / print / destroy / deallocate cycle.
pub fn allocator_primitives(trace: &Trace) -> Result<(), AllocationFault> {
    let mut slot = Slot::<Base>::allocate()?;
    trace.push("allocator: allocate 1");
    slot.construct(Base::new(trace));
    if let Some(base) = slot.get() {
        base.print();
    }
    slot.destroy();
    slot.deallocate();
    trace.push("allocator: deallocate 1");
    Ok(())
}

/// Run the whole program, recording every step in `trace`.
pub fn run(trace: &Trace) -> Result<(), AllocationFault> {
    single_record(trace);
    record_array(trace, RECORD_ARRAY_LEN);
    base_object(trace);
    base_array(trace, BASE_ARRAY_LEN);
    polymorphic_object(trace);
    polymorphic_array(trace, SUB_ARRAY_LEN);

    trace.push("nothrow: allocate");
    match nothrow_allocate(RECORD_ARRAY_LEN) {
        Ok(records) => trace.push(format!("nothrow: capacity={}", records.capacity())),
        Err(fault) => trace.push(format!("nothrow: refused ({fault})")),
    }
    nothrow_base(trace)?;

    allocator_primitives(trace)
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| (*line).to_string()).collect()
}

/// Harness checks over the program's observable behavior.
pub fn check(h: &mut TestHarness) {
    h.assert_returns(|| single_record(&Trace::new()), 5);
    h.assert_returns(
        || record_array(&Trace::new(), RECORD_ARRAY_LEN),
        RECORD_ARRAY_LEN,
    );

    h.assert_returns(
        || {
            let trace = Trace::new();
            base_object(&trace);
            trace.lines()
        },
        owned(&["base: construct a=0", "base: print a=0", "base: destroy"]),
    );

    h.assert_returns(
        || {
            let trace = Trace::new();
            base_array(&trace, BASE_ARRAY_LEN);
            (
                trace.count("base: construct"),
                trace.count("base: print"),
                trace.count("base: destroy"),
            )
        },
        (BASE_ARRAY_LEN, BASE_ARRAY_LEN, BASE_ARRAY_LEN),
    );

    h.assert_returns(
        || {
            let trace = Trace::new();
            polymorphic_object(&trace);
            trace.lines()
        },
        owned(&[
            "base: construct a=0",
            "sub: construct a=0 f=0.000000",
            "sub: print a=0 f=0.000000",
            "sub: destroy",
            "base: destroy",
        ]),
    );

    h.assert_returns(
        || {
            let trace = Trace::new();
            polymorphic_array(&trace, SUB_ARRAY_LEN);
            (trace.count("sub: destroy"), trace.count("base: destroy"))
        },
        (SUB_ARRAY_LEN, SUB_ARRAY_LEN),
    );

    h.assert_returns(
        || nothrow_allocate(16).map(|records| records.capacity() >= 16),
        Ok(true),
    );
    h.assert_returns(|| nothrow_allocate(usize::MAX).is_err(), true);
    h.assert_throws::<AllocationFault, _, _>(|| allocate_or_fault(usize::MAX));

    h.assert_returns(
        || {
            let trace = Trace::new();
            allocator_primitives(&trace).map(|()| trace.lines())
        },
        Ok(owned(&[
            "allocator: allocate 1",
            "base: construct a=0",
            "base: print a=0",
            "base: destroy",
            "allocator: deallocate 1",
        ])),
    );
}
