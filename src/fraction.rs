//! Fixed-point fractions with a compile-time binary point.
//!
//! The AVR has no FPU, so duty cycles and measurements are carried around as
//! integers with an implicit binary point at bit `BITS`. Converting between
//! precisions is only possible in the lossless direction, which is checked
//! when the conversion is monomorphized: a narrowing conversion does not
//! compile.

/// Number of fraction bits of the duty cycles handed to the PWM.
///
/// Two bits of the `u16` are left unused, so that `1.0` (a permanently high
/// output) is representable and `(period + 1) * duty` fits the intermediate.
pub const DUTY_CYCLE_BITS: u8 = 14;

/// A duty cycle within `[0..1]`.
pub type DutyCycle = Fraction<DUTY_CYCLE_BITS>;

/// The value format of the published registers, `[-1, 1)` at a 15-bit scale.
pub type Measurement = SignedFraction<15>;

/// An unsigned fraction `bits / 2^BITS` within `[0..1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fraction<const BITS: u8> {
    bits: u16,
}

impl<const BITS: u8> Fraction<BITS> {
    /// The raw representation of `1.0`.
    const ONE_BITS: u16 = {
        assert!(BITS <= 15, "a `Fraction` must leave room for 1.0 in 16 bits");
        1 << BITS
    };

    pub const ZERO: Self = Self { bits: 0 };
    pub const ONE: Self = Self {
        bits: Self::ONE_BITS,
    };

    /// Create a fraction from its raw bits, if they are within `[0..1]`.
    pub const fn new(bits: u16) -> Option<Self> {
        if bits <= Self::ONE_BITS {
            Some(Self { bits })
        } else {
            None
        }
    }

    /// Convert a float, saturating to `[0..1]`.
    ///
    /// This is meant for constants: on the target this is only cheap if it is
    /// evaluated at compile time.
    pub const fn from_f32(f: f32) -> Self {
        let scaled = f * Self::ONE_BITS as f32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked
        let bits = if scaled <= 0.0 {
            0
        } else if scaled >= Self::ONE_BITS as f32 {
            Self::ONE_BITS
        } else {
            scaled as u16
        };
        Self { bits }
    }

    pub const fn bits(self) -> u16 {
        self.bits
    }

    pub fn to_f32(self) -> f32 {
        f32::from(self.bits) / f32::from(Self::ONE_BITS)
    }

    /// Represent the same value with more fraction bits.
    pub fn widen<const TO: u8>(self) -> Fraction<TO> {
        const {
            assert!(TO >= BITS, "narrowing a fraction loses precision");
            assert!(TO <= 15, "a `Fraction` must leave room for 1.0 in 16 bits");
        }
        Fraction {
            bits: self.bits << (TO - BITS),
        }
    }

    /// Represent half of the value with more fraction bits.
    ///
    /// The extra bit of precision absorbs the division, so this is exact.
    pub fn halve_into<const TO: u8>(self) -> Fraction<TO> {
        const {
            assert!(TO > BITS, "halving needs at least one more fraction bit");
            assert!(TO <= 15, "a `Fraction` must leave room for 1.0 in 16 bits");
        }
        Fraction {
            bits: self.bits << (TO - BITS - 1),
        }
    }

    /// Represent the value as a signed fraction.
    ///
    /// Returns `None` only for `1.0`, which a signed fraction cannot hold.
    pub fn to_signed<const TO: u8>(self) -> Option<SignedFraction<TO>> {
        const {
            assert!(TO >= BITS, "narrowing a fraction loses precision");
            assert!(TO <= 15, "a `SignedFraction` is stored in 16 bits");
        }
        let bits = u32::from(self.bits) << (TO - BITS);
        if bits < 1 << TO {
            Some(SignedFraction { bits: bits as i16 })
        } else {
            None
        }
    }
}

/// A signed fraction `bits / 2^BITS` within `[-1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignedFraction<const BITS: u8> {
    bits: i16,
}

impl<const BITS: u8> SignedFraction<BITS> {
    /// The raw representation of `1.0`, one past the largest value.
    const LIMIT: i32 = {
        assert!(BITS <= 15, "a `SignedFraction` is stored in 16 bits");
        1 << BITS
    };

    pub const ZERO: Self = Self { bits: 0 };
    #[allow(clippy::cast_possible_truncation)] // -2^15 at most
    pub const MIN: Self = Self {
        bits: -Self::LIMIT as i16,
    };
    #[allow(clippy::cast_possible_truncation)] // 2^15 - 1 at most
    pub const MAX: Self = Self {
        bits: (Self::LIMIT - 1) as i16,
    };

    /// Create a fraction from its raw bits, if they are within `[-1, 1)`.
    pub const fn new(bits: i16) -> Option<Self> {
        let wide = bits as i32;
        if wide >= -Self::LIMIT && wide < Self::LIMIT {
            Some(Self { bits })
        } else {
            None
        }
    }

    /// Convert a float, saturating to `[-1, 1)`.
    pub const fn from_f32(f: f32) -> Self {
        let scaled = f * Self::LIMIT as f32;
        if scaled <= -Self::LIMIT as f32 {
            Self::MIN
        } else if scaled >= (Self::LIMIT - 1) as f32 {
            Self::MAX
        } else {
            Self {
                bits: scaled as i16,
            }
        }
    }

    pub const fn bits(self) -> i16 {
        self.bits
    }

    #[allow(clippy::cast_precision_loss)] // at most 2^15
    pub fn to_f32(self) -> f32 {
        f32::from(self.bits) / Self::LIMIT as f32
    }

    /// Represent the same value with more fraction bits.
    pub fn widen<const TO: u8>(self) -> SignedFraction<TO> {
        const {
            assert!(TO >= BITS, "narrowing a fraction loses precision");
            assert!(TO <= 15, "a `SignedFraction` is stored in 16 bits");
        }
        SignedFraction {
            bits: self.bits << (TO - BITS),
        }
    }
}
