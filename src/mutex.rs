/// Common interface for mutex implementations.
///
/// Single-bit writes (LEDs, edge enables, encoder enables, interrupt masks) are a read followed
/// by a write.  Two callers updating the same register at the same time can silently lose one of
/// the updates.  The sessions themselves take `&mut self` and do no locking; callers sharing a
/// session wrap it in one of the mutex types below and run the whole sequence inside one
/// [`lock`](BoardMutex::lock) call:
///
/// | Mutex | Feature Name | Notes |
/// | --- | --- | --- |
/// | [`core::cell::RefCell`] | _always available_ | For sharing within a single execution context. |
/// | [`std::sync::Mutex`][mutex-std] | `std` | For platforms where `std` is available. |
/// | [`critical_section::Mutex`] | `critical-section` | Holds a critical section for the whole closure. |
///
/// [mutex-std]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
///
/// `std::sync::Mutex` has an inherent `lock()` method that shadows the trait method, so call it
/// as `BoardMutex::lock(&mutex, |board| ...)` there.
///
/// This only serializes callers within one process.  Other processes talking to the same board
/// are not coordinated.
///
/// ```
/// use core::cell::RefCell;
/// use ioboards::{BoardMutex, SixteenInputs};
/// # use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
/// # let expectations = [
/// #     Transaction::write_read(0x27, vec![0x02], vec![0x00, 0x00]),
/// #     Transaction::write(0x27, vec![0x02, 0x00, 0x80]),
/// #     Transaction::write_read(0x27, vec![0x02], vec![0x00, 0x80]),
/// #     Transaction::write(0x27, vec![0x02, 0x00, 0xc0]),
/// # ];
/// # let mut i2c = Mock::new(&expectations);
///
/// let card = RefCell::create(SixteenInputs::new(i2c.clone()));
/// card.lock(|card| -> Result<(), ioboards::Error<_>> {
///     card.set_led(0, 1, true)?;
///     card.set_led(0, 2, true)
/// })?;
/// # i2c.done();
/// # Ok::<(), ioboards::Error<embedded_hal::i2c::ErrorKind>>(())
/// ```
pub trait BoardMutex {
    /// The session that is wrapped inside this mutex.
    type Board;

    /// Create a new mutex of this type.
    fn create(v: Self::Board) -> Self;

    /// Lock the mutex and give a closure access to the session inside.
    fn lock<R, F: FnOnce(&mut Self::Board) -> R>(&self, f: F) -> R;
}

impl<T> BoardMutex for core::cell::RefCell<T> {
    type Board = T;

    fn create(v: Self::Board) -> Self {
        core::cell::RefCell::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Board) -> R>(&self, f: F) -> R {
        let mut v = self.borrow_mut();
        f(&mut v)
    }
}

#[cfg(any(test, feature = "std"))]
impl<T> BoardMutex for std::sync::Mutex<T> {
    type Board = T;

    fn create(v: Self::Board) -> Self {
        std::sync::Mutex::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Board) -> R>(&self, f: F) -> R {
        // a panic inside another lock scope leaves the session itself intact
        let mut v = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut v)
    }
}

#[cfg(feature = "critical-section")]
impl<T> BoardMutex for critical_section::Mutex<core::cell::RefCell<T>> {
    type Board = T;

    fn create(v: Self::Board) -> Self {
        critical_section::Mutex::new(core::cell::RefCell::new(v))
    }

    fn lock<R, F: FnOnce(&mut Self::Board) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| {
            let mut v = self.borrow_ref_mut(cs);
            f(&mut v)
        })
    }
}
