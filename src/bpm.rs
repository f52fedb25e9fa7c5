//! BPM digit input
//!
//! The tempo is dialed as three independent digits (hundreds, tens, units).
//! [`BpmInput`] holds the live selection and composes it into a [`Bpm`] on
//! demand; the beat clock resets it when a running metronome is stopped.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Highest selectable hundreds digit
pub const MAX_HUNDREDS: u8 = 2;
/// Highest selectable tens/units digit
pub const MAX_DIGIT: u8 = 9;

/// Error type for digit selection
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpmError {
    /// A digit was outside its picker range
    #[error("{place} digit {value} is out of range (max {max})")]
    DigitOutOfRange {
        /// Which digit was rejected
        place: DigitPlace,
        /// Offending value
        value: u16,
        /// Largest accepted value for this place
        max: u8,
    },
}

/// Position of a digit within the BPM value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitPlace {
    /// Hundreds digit (0..=2)
    Hundreds,
    /// Tens digit (0..=9)
    Tens,
    /// Units digit (0..=9)
    Units,
}

impl DigitPlace {
    fn max(self) -> u8 {
        match self {
            DigitPlace::Hundreds => MAX_HUNDREDS,
            DigitPlace::Tens | DigitPlace::Units => MAX_DIGIT,
        }
    }

    fn check(self, value: u8) -> Result<u8, BpmError> {
        if value > self.max() {
            Err(BpmError::DigitOutOfRange {
                place: self,
                value: value.into(),
                max: self.max(),
            })
        } else {
            Ok(value)
        }
    }
}

impl fmt::Display for DigitPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DigitPlace::Hundreds => "hundreds",
            DigitPlace::Tens => "tens",
            DigitPlace::Units => "units",
        })
    }
}

/// Beats per minute
///
/// Zero is representable so that an unset input can be displayed; the clock
/// refuses to start with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bpm(u16);

impl Bpm {
    /// Largest value the data model allows
    pub const MAX: u16 = 999;

    /// Wrap a raw value, saturating at [`Bpm::MAX`].
    pub fn new(value: u16) -> Self {
        Bpm(value.min(Self::MAX))
    }

    /// Raw beats-per-minute value
    pub fn get(self) -> u16 {
        self.0
    }

    /// Whether this tempo can drive the clock
    pub fn is_playable(self) -> bool {
        self.0 > 0
    }

    /// Seconds between beats (`60 / bpm`), `None` for zero.
    pub fn interval_secs(self) -> Option<f64> {
        self.is_playable().then(|| 60.0 / f64::from(self.0))
    }

    /// Split into (hundreds, tens, units) by digit extraction.
    pub fn split(self) -> (u16, u16, u16) {
        (self.0 / 100, (self.0 / 10) % 10, self.0 % 10)
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Bpm> for u16 {
    fn from(bpm: Bpm) -> Self {
        bpm.0
    }
}

/// A validated digit triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BpmDigits {
    hundreds: u8,
    tens: u8,
    units: u8,
}

impl BpmDigits {
    /// All digits at zero
    pub const ZERO: BpmDigits = BpmDigits {
        hundreds: 0,
        tens: 0,
        units: 0,
    };

    /// Build from three picker selections.
    pub fn new(hundreds: u8, tens: u8, units: u8) -> Result<Self, BpmError> {
        Ok(BpmDigits {
            hundreds: DigitPlace::Hundreds.check(hundreds)?,
            tens: DigitPlace::Tens.check(tens)?,
            units: DigitPlace::Units.check(units)?,
        })
    }

    /// Decompose a tempo back into picker digits.
    pub fn from_bpm(bpm: Bpm) -> Result<Self, BpmError> {
        let (h, t, u) = bpm.split();
        if h > u16::from(MAX_HUNDREDS) {
            return Err(BpmError::DigitOutOfRange {
                place: DigitPlace::Hundreds,
                value: h,
                max: MAX_HUNDREDS,
            });
        }
        // t and u are < 10 by construction
        Ok(BpmDigits {
            hundreds: h as u8,
            tens: t as u8,
            units: u as u8,
        })
    }

    /// `h*100 + t*10 + u`
    pub fn compose(self) -> Bpm {
        Bpm(u16::from(self.hundreds) * 100 + u16::from(self.tens) * 10 + u16::from(self.units))
    }

    /// Hundreds digit
    pub fn hundreds(self) -> u8 {
        self.hundreds
    }

    /// Tens digit
    pub fn tens(self) -> u8 {
        self.tens
    }

    /// Units digit
    pub fn units(self) -> u8 {
        self.units
    }
}

/// Compose a tempo from three digits.
///
/// Never overflows (the largest composable value is 299) but may yield zero,
/// which [`crate::BeatClock::start`] rejects.
pub fn compose(hundreds: u8, tens: u8, units: u8) -> Result<Bpm, BpmError> {
    BpmDigits::new(hundreds, tens, units).map(BpmDigits::compose)
}

/// Live digit selection shared between the front-end and the clock
///
/// Cloning yields another handle onto the same digits.
#[derive(Debug, Clone, Default)]
pub struct BpmInput {
    digits: Arc<Mutex<BpmDigits>>,
}

impl BpmInput {
    /// New input with every digit at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// New input preset to the given digits
    pub fn with_digits(digits: BpmDigits) -> Self {
        BpmInput {
            digits: Arc::new(Mutex::new(digits)),
        }
    }

    /// Current digits
    pub fn digits(&self) -> BpmDigits {
        *self.digits.lock()
    }

    /// Current composed tempo, for display and for starting the clock
    pub fn bpm(&self) -> Bpm {
        self.digits.lock().compose()
    }

    /// Select the hundreds digit.
    pub fn set_hundreds(&self, value: u8) -> Result<(), BpmError> {
        let value = DigitPlace::Hundreds.check(value)?;
        self.digits.lock().hundreds = value;
        Ok(())
    }

    /// Select the tens digit.
    pub fn set_tens(&self, value: u8) -> Result<(), BpmError> {
        let value = DigitPlace::Tens.check(value)?;
        self.digits.lock().tens = value;
        Ok(())
    }

    /// Select the units digit.
    pub fn set_units(&self, value: u8) -> Result<(), BpmError> {
        let value = DigitPlace::Units.check(value)?;
        self.digits.lock().units = value;
        Ok(())
    }

    /// Select all three digits at once; nothing changes on error.
    pub fn set_digits(&self, hundreds: u8, tens: u8, units: u8) -> Result<(), BpmError> {
        let digits = BpmDigits::new(hundreds, tens, units)?;
        *self.digits.lock() = digits;
        Ok(())
    }

    /// Select the digits that spell `bpm`.
    pub fn set_bpm(&self, bpm: Bpm) -> Result<(), BpmError> {
        let digits = BpmDigits::from_bpm(bpm)?;
        *self.digits.lock() = digits;
        Ok(())
    }

    /// Return every digit to zero.
    pub fn reset(&self) {
        *self.digits.lock() = BpmDigits::ZERO;
    }
}
