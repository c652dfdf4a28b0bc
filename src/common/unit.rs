//! Unit conversion utilities.
//!
//! DrawingML expresses every length as an integer number of EMUs (English Metric
//! Units). [`Length`] wraps that integer so that extents read from and written to
//! markup keep their exact value, while still offering convenient conversions.

use std::fmt;
use std::ops::{Add, Sub};

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_MM: i64 = 36_000;
pub const EMUS_PER_PT: i64 = 12_700;
pub const EMUS_PER_TWIP: i64 = 635;

#[inline]
pub fn pt_to_emu_f64(pt: f64) -> i64 {
    (pt * EMUS_PER_PT as f64) as i64
}

#[inline]
pub fn emu_to_pt_f64(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

#[inline]
pub fn px_to_emu(px: u32, dpi: u32) -> i64 {
    ((px as f64) * EMUS_PER_INCH as f64 / dpi as f64) as i64
}

#[inline]
pub fn emu_to_px(emu: i64, dpi: u32) -> u32 {
    ((emu as f64) * dpi as f64 / EMUS_PER_INCH as f64) as u32
}

/// A length stored as an integer number of EMUs.
///
/// # Examples
///
/// ```
/// use docx_oxml::common::unit::Length;
///
/// let one_inch = Length::from_inches(1.0);
/// assert_eq!(one_inch.emus(), 914_400);
/// assert_eq!(Length::from_pt(72.0), one_inch);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length {
    emus: i64,
}

impl Length {
    pub const ZERO: Length = Length { emus: 0 };

    /// Create a length from EMUs.
    #[inline]
    pub const fn from_emus(emus: i64) -> Self {
        Self { emus }
    }

    /// Create a length from inches.
    #[inline]
    pub fn from_inches(inches: f64) -> Self {
        Self {
            emus: (inches * EMUS_PER_INCH as f64) as i64,
        }
    }

    /// Create a length from centimeters.
    #[inline]
    pub fn from_cm(cm: f64) -> Self {
        Self {
            emus: (cm * EMUS_PER_CM as f64) as i64,
        }
    }

    /// Create a length from millimeters.
    #[inline]
    pub fn from_mm(mm: f64) -> Self {
        Self {
            emus: (mm * EMUS_PER_MM as f64) as i64,
        }
    }

    /// Create a length from points.
    #[inline]
    pub fn from_pt(pt: f64) -> Self {
        Self {
            emus: pt_to_emu_f64(pt),
        }
    }

    /// Create a length from twentieths of a point.
    #[inline]
    pub const fn from_twips(twips: i64) -> Self {
        Self {
            emus: twips * EMUS_PER_TWIP,
        }
    }

    /// Create a length from a pixel count at the given resolution.
    #[inline]
    pub fn from_px(px: u32, dpi: u32) -> Self {
        Self {
            emus: px_to_emu(px, dpi),
        }
    }

    #[inline]
    pub const fn emus(&self) -> i64 {
        self.emus
    }

    #[inline]
    pub fn inches(&self) -> f64 {
        self.emus as f64 / EMUS_PER_INCH as f64
    }

    #[inline]
    pub fn cm(&self) -> f64 {
        self.emus as f64 / EMUS_PER_CM as f64
    }

    #[inline]
    pub fn mm(&self) -> f64 {
        self.emus as f64 / EMUS_PER_MM as f64
    }

    #[inline]
    pub fn pt(&self) -> f64 {
        emu_to_pt_f64(self.emus)
    }

    #[inline]
    pub fn twips(&self) -> i64 {
        self.emus / EMUS_PER_TWIP
    }

    /// Scale by `num / den` using integer arithmetic, rounding toward zero.
    #[inline]
    pub fn scale(&self, num: i64, den: i64) -> Self {
        if den == 0 {
            return *self;
        }
        Self {
            emus: ((self.emus as i128 * num as i128) / den as i128) as i64,
        }
    }
}

impl From<i64> for Length {
    fn from(emus: i64) -> Self {
        Self::from_emus(emus)
    }
}

impl From<Length> for i64 {
    fn from(length: Length) -> Self {
        length.emus
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length::from_emus(self.emus + rhs.emus)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length::from_emus(self.emus - rhs.emus)
    }
}

impl PartialEq<i64> for Length {
    fn eq(&self, other: &i64) -> bool {
        self.emus == *other
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}\"", self.inches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_agree() {
        assert_eq!(Length::from_inches(1.0), Length::from_emus(914_400));
        assert_eq!(Length::from_cm(2.54).emus(), 914_400);
        assert_eq!(Length::from_pt(1.0).emus(), 12_700);
        assert_eq!(Length::from_twips(20).emus(), 12_700);
        assert_eq!(Length::from_px(96, 96).emus(), 914_400);
    }

    #[test]
    fn test_compares_with_raw_emus() {
        assert_eq!(Length::from_emus(333), 333);
        assert!(Length::from_emus(333) != 334);
    }

    #[test]
    fn test_scale() {
        let len = Length::from_emus(914_422);
        assert_eq!(len.scale(1, 2).emus(), 457_211);
        assert_eq!(len.scale(3, 0), len);
    }

    #[test]
    fn test_px_round_trip() {
        assert_eq!(emu_to_px(px_to_emu(300, 150), 150), 300);
    }
}
