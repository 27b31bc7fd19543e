//! Hardware abstraction traits for the RF transceiver and the time source.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RfDriver`] | Raw RF code transmission and reception |
//! | [`Clock`] | Monotonic time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`].
//!
//! # Example
//!
//! ```rust
//! use rs_fanrf::traits::RfDriver;
//! use rs_fanrf::hal::MockRf;
//!
//! let mut rf = MockRf::new();
//! rf.transmit(6656, 6, 8).unwrap();
//! assert_eq!(rf.transmissions, vec![(6656, 6, 8)]);
//! ```

use crate::action::ReceivedCode;

/// RF transceiver driver.
///
/// Modulation, pulse timing and the carrier frequency are the driver's
/// business. The bridge only hands over the numeric code together with the
/// protocol id and repeat count, and polls for decoded receptions.
///
/// # Implementation Notes
///
/// - `transmit` may block for the duration of the frame burst, but must not
///   add any inter-transmission delay of its own
/// - `try_receive` must never block; return `None` when nothing was decoded
/// - Drivers without a receiver can always return `None`
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_fanrf::traits::RfDriver;
/// use rs_fanrf::ReceivedCode;
///
/// struct Cc1101 { /* SPI handle, GDO pins */ }
///
/// impl RfDriver for Cc1101 {
///     type Error = SpiError;
///
///     fn transmit(&mut self, value: u32, protocol: u8, repeats: u8) -> Result<(), SpiError> {
///         // Encode and clock out the frame `repeats` times...
///         Ok(())
///     }
///
///     fn try_receive(&mut self) -> Option<ReceivedCode> {
///         // Pop the decoder's last result, if any...
///         None
///     }
/// }
/// ```
pub trait RfDriver {
    /// Error type for driver faults.
    type Error: core::fmt::Debug;

    /// Transmit one code with the given protocol and repeat count.
    fn transmit(&mut self, value: u32, protocol: u8, repeats: u8) -> Result<(), Self::Error>;

    /// Returns the next decoded code, if any (non-blocking).
    fn try_receive(&mut self) -> Option<ReceivedCode>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for transmit spacing and
/// learning deadlines. On desktop, this wraps `std::time::Instant`.
/// On embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_fanrf::traits::Clock;
/// use rs_fanrf::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoRadio {
        last: Option<(u32, u8)>,
    }

    impl RfDriver for EchoRadio {
        type Error = ();

        fn transmit(&mut self, value: u32, protocol: u8, _repeats: u8) -> Result<(), ()> {
            self.last = Some((value, protocol));
            Ok(())
        }

        fn try_receive(&mut self) -> Option<ReceivedCode> {
            self.last
                .take()
                .map(|(value, protocol)| ReceivedCode::new(value, protocol))
        }
    }

    #[test]
    fn driver_trait_object_free_usage() {
        let mut radio = EchoRadio { last: None };
        assert_eq!(radio.try_receive(), None);

        radio.transmit(6784, 6, 8).unwrap();
        assert_eq!(radio.try_receive(), Some(ReceivedCode::new(6784, 6)));
        assert_eq!(radio.try_receive(), None);
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn clock_reports_time() {
        assert_eq!(FixedClock(42).now_ms(), 42);
    }
}
