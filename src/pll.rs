//! PLL settings for the TLV320DAC3101
//!
//! The PLL runs in fractional-N mode, so we fix R = 1. With a 24.576 MHz MCLK,
//! PLL_CLKIN / P must be between 10 MHz and 20 MHz, so we fix P = 2. That
//! leaves the J.D multiplier to trim the output clock:
//!
//! ```text
//! PLL_CLK = MCLK * R * J.D / P
//! ```
//!
//! A J.D of 8.0000 gives PLL_CLK = 98.304 MHz, and so exactly 48 kHz out of the
//! clock dividers. A trim of N parts-per-million scales J.D by `1 + N / 10^6`.

use fugit::HertzU32;

//
// Public Types
//

/// The four values that set the PLL multiplier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PllSettings {
	/// Pre-divider, 1..=8
	pub p: u8,
	/// Multiplier, 1..=4
	pub r: u8,
	/// Integer part of the J.D multiplier.
	///
	/// Reported, but not written; the J register always gets [`PROGRAMMED_J`].
	pub j: i64,
	/// Fractional part of the J.D multiplier, in units of 1/10000
	pub d: u16,
}

/// Problems with a trim.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PllError {
	/// The trim was NaN or infinite
	NotFinite(f64),
	/// The trim makes J.D negative, so D has no register encoding
	NegativeMultiplier(f64),
	/// J is outside the range the datasheet allows for this D
	JOutOfRange { j: i64, d: u16 },
	/// The PLL would run outside its 80 MHz to 110 MHz range
	PllClockOutOfRange(f64),
}

//
// Public Data
//

/// The nominal J.D multiplier
pub const NOMINAL_MULTIPLIER: f64 = 8.0;

/// The value loaded into the PLL J register, whatever the trim.
pub const PROGRAMMED_J: u8 = 8;

/// The datasheet wants the PLL output at least this fast
pub const PLL_CLK_MIN_HZ: f64 = 80_000_000.0;

/// The datasheet wants the PLL output no faster than this
pub const PLL_CLK_MAX_HZ: f64 = 110_000_000.0;

//
// Private Data
//

const P_VALUE: u8 = 2;

const R_VALUE: u8 = 1;

const D_SCALE: f64 = 10_000.0;

//
// impls on Public Types
//

impl PllSettings {
	/// Work out the PLL values for a clock trim given in parts-per-million.
	///
	/// J and D are truncated, not rounded. A trim of zero gives J = 8, D = 0.
	///
	/// Any finite trim that leaves J.D non-negative is accepted. Use
	/// [`PllSettings::check_datasheet_limits`] to find out whether the DAC
	/// will actually be happy with it.
	pub fn from_ppm(ppm: f64) -> Result<PllSettings, PllError> {
		if !ppm.is_finite() {
			return Err(PllError::NotFinite(ppm));
		}
		let ratio = ppm / 1_000_000.0;
		let pll_mul = NOMINAL_MULTIPLIER * (1.0 + ratio);
		if pll_mul < 0.0 {
			return Err(PllError::NegativeMultiplier(pll_mul));
		}
		let j = pll_mul.trunc();
		let d = ((pll_mul - j) * D_SCALE).trunc().min(D_SCALE - 1.0);
		Ok(PllSettings {
			p: P_VALUE,
			r: R_VALUE,
			j: j as i64,
			d: d as u16,
		})
	}

	/// Check J, D and the resulting PLL_CLK against the datasheet limits.
	pub fn check_datasheet_limits(&self, mclk: HertzU32) -> Result<(), PllError> {
		let j_range = if self.d == 0 { 1..=63 } else { 4..=11 };
		if !j_range.contains(&self.j) {
			return Err(PllError::JOutOfRange {
				j: self.j,
				d: self.d,
			});
		}
		let pll_clk = self.pll_clock_hz(mclk);
		if !(PLL_CLK_MIN_HZ..=PLL_CLK_MAX_HZ).contains(&pll_clk) {
			return Err(PllError::PllClockOutOfRange(pll_clk));
		}
		Ok(())
	}

	/// The J.D multiplier as a number
	pub fn multiplier(&self) -> f64 {
		self.j as f64 + f64::from(self.d) / D_SCALE
	}

	/// The frequency that comes out of the PLL, in Hz
	pub fn pll_clock_hz(&self, mclk: HertzU32) -> f64 {
		f64::from(mclk.raw()) * f64::from(self.r) * self.multiplier() / f64::from(self.p)
	}

	/// The top six bits of D, for the D MSB register
	pub fn d_msb(&self) -> u8 {
		(self.d >> 8) as u8
	}

	/// The bottom eight bits of D, for the D LSB register
	pub fn d_lsb(&self) -> u8 {
		(self.d & 0xFF) as u8
	}
}

impl core::fmt::Display for PllError {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		match self {
			PllError::NotFinite(ppm) => write!(f, "trim of {} ppm is not a number", ppm),
			PllError::NegativeMultiplier(mul) => {
				write!(f, "PLL multiplier {} is negative", mul)
			}
			PllError::JOutOfRange { j, d } => {
				write!(f, "PLL J = {} is out of range (D = {})", j, d)
			}
			PllError::PllClockOutOfRange(hz) => write!(
				f,
				"PLL_CLK of {:.0} Hz is outside {:.0} Hz to {:.0} Hz",
				hz, PLL_CLK_MIN_HZ, PLL_CLK_MAX_HZ
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MCLK: HertzU32 = HertzU32::from_raw(24_576_000);

	#[test]
	fn zero_ppm_is_nominal() {
		let pll = PllSettings::from_ppm(0.0).unwrap();
		assert_eq!(
			pll,
			PllSettings {
				p: 2,
				r: 1,
				j: 8,
				d: 0
			}
		);
		assert_eq!(pll.pll_clock_hz(MCLK), 98_304_000.0);
		assert_eq!(pll.check_datasheet_limits(MCLK), Ok(()));
	}

	#[test]
	fn positive_trim() {
		// 31250 ppm is 1/32, so 8 * (1 + 1/32) = 8.25 exactly
		let pll = PllSettings::from_ppm(31_250.0).unwrap();
		assert_eq!((pll.j, pll.d), (8, 2500));
		assert_eq!(pll.d_msb(), 0x09);
		assert_eq!(pll.d_lsb(), 0xC4);
	}

	#[test]
	fn negative_trim_drops_j() {
		let pll = PllSettings::from_ppm(-31_250.0).unwrap();
		assert_eq!((pll.j, pll.d), (7, 7500));
		assert_eq!(pll.d_msb(), 0x1D);
		assert_eq!(pll.d_lsb(), 0x4C);
	}

	#[test]
	fn whole_multiplier_is_accepted() {
		// 9.0 * 24.576 / 2 = 110.592 MHz, just over the limit, but we still
		// hand back the values
		let pll = PllSettings::from_ppm(125_000.0).unwrap();
		assert_eq!((pll.j, pll.d), (9, 0));
		assert_eq!(
			pll.check_datasheet_limits(MCLK),
			Err(PllError::PllClockOutOfRange(110_592_000.0))
		);
	}

	#[test]
	fn small_trim() {
		let pll = PllSettings::from_ppm(100.0).unwrap();
		assert_eq!(pll.j, 8);
		// 8.0008, less whatever the floating point truncation costs us
		assert!((7..=8).contains(&pll.d), "d = {}", pll.d);
	}

	#[test]
	fn d_fits_in_fourteen_bits() {
		let pll = PllSettings::from_ppm(-1.0).unwrap();
		assert_eq!(pll.j, 7);
		assert!(pll.d <= 9999);
		assert_eq!(pll.d_msb() & 0xC0, 0);
	}

	#[test]
	fn out_of_range_trims_are_only_flagged() {
		let pll = PllSettings::from_ppm(510_000.0).unwrap();
		assert_eq!(pll.j, 12);
		assert!(matches!(
			pll.check_datasheet_limits(MCLK),
			Err(PllError::JOutOfRange { j: 12, .. })
		));
		let pll = PllSettings::from_ppm(-250_000.0).unwrap();
		assert_eq!((pll.j, pll.d), (6, 0));
		assert!(matches!(
			pll.check_datasheet_limits(MCLK),
			Err(PllError::PllClockOutOfRange(_))
		));
	}

	#[test]
	fn rejects_nonsense() {
		assert!(matches!(
			PllSettings::from_ppm(f64::NAN),
			Err(PllError::NotFinite(_))
		));
		assert!(matches!(
			PllSettings::from_ppm(f64::INFINITY),
			Err(PllError::NotFinite(_))
		));
		assert!(matches!(
			PllSettings::from_ppm(-2_000_000.0),
			Err(PllError::NegativeMultiplier(_))
		));
	}
}
