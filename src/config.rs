//! Board configuration
//!
//! Describes how the DAC, the GPIO expander and the master clock are wired up
//! on the board we are programming.

use fugit::{HertzU32, MillisDurationU32};

//
// Public Types
//

/// Everything we need to know about the board to bring the DAC up.
#[derive(Debug, Clone)]
pub struct BoardConfig {
	/// The Linux I²C character device the DAC and expander hang off
	pub i2c_device: &'static str,
	/// Seven-bit I²C address of the GPIO expander driving DAC_RST_N
	pub expander_address: u8,
	/// Seven-bit I²C address of the TLV320DAC3101
	pub dac_address: u8,
	/// Frequency of the clock on the DAC's MCLK pin
	pub mclk: HertzU32,
	/// The sample rate the clock dividers are set up for
	pub sample_rate: HertzU32,
	/// PLL_CLK divider giving DAC_CLK
	pub ndac: u8,
	/// DAC_CLK divider giving DAC_MOD_CLK
	pub mdac: u8,
	/// DAC_MOD_CLK divider giving the sample rate
	pub dosr: u8,
	/// How long to hold each state of the reset line
	pub reset_hold: MillisDurationU32,
	/// How long to wait after reset before talking to the DAC
	pub reset_recovery: MillisDurationU32,
	/// How long to wait after programming the PLL before powering it up
	pub pll_settle: MillisDurationU32,
	/// How long to let the output drivers ramp before unmuting the DAC
	pub output_ramp: MillisDurationU32,
}

//
// Public Data
//

/// Environment variable which overrides [`BoardConfig::i2c_device`].
pub const I2C_DEVICE_ENV: &str = "DAC3101_I2C_DEV";

/// A Raspberry Pi with the DAC on I²C bus 1, and a 24.576 MHz MCLK giving
/// 48 kHz audio.
pub static RASPBERRY_PI: BoardConfig = BoardConfig {
	i2c_device: "/dev/i2c-1",
	expander_address: 0x20,
	dac_address: crate::tlv320dac3101::DEFAULT_ADDRESS,
	mclk: HertzU32::from_raw(24_576_000),
	sample_rate: HertzU32::from_raw(48_000),
	ndac: 4,
	mdac: 4,
	dosr: 128,
	reset_hold: MillisDurationU32::from_ticks(100),
	reset_recovery: MillisDurationU32::from_ticks(1000),
	pll_settle: MillisDurationU32::from_ticks(1),
	output_ramp: MillisDurationU32::from_ticks(100),
};

//
// Functions
//

/// Work out which I²C device to open.
///
/// Uses the [`I2C_DEVICE_ENV`] environment variable if set, otherwise the
/// board default.
pub fn i2c_device(board: &BoardConfig) -> String {
	match std::env::var(I2C_DEVICE_ENV) {
		Ok(path) if !path.is_empty() => path,
		_ => board.i2c_device.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clock_tree_gives_sample_rate() {
		// PLL_CLK = MCLK * 8 / 2
		let pll_clk = RASPBERRY_PI.mclk.raw() * 4;
		assert_eq!(pll_clk, 98_304_000);
		let board = &RASPBERRY_PI;
		let fs = pll_clk / u32::from(board.ndac) / u32::from(board.mdac) / u32::from(board.dosr);
		assert_eq!(fs, board.sample_rate.raw());
	}

	#[test]
	fn delays() {
		assert_eq!(RASPBERRY_PI.reset_hold.to_millis(), 100);
		assert_eq!(RASPBERRY_PI.reset_recovery.to_millis(), 1000);
		assert_eq!(RASPBERRY_PI.pll_settle.to_millis(), 1);
		assert_eq!(RASPBERRY_PI.output_ramp.to_millis(), 100);
	}

	#[test]
	fn i2c_device_override() {
		// All three cases in one test, so nothing else sees the variable
		std::env::remove_var(I2C_DEVICE_ENV);
		assert_eq!(i2c_device(&RASPBERRY_PI), "/dev/i2c-1");

		std::env::set_var(I2C_DEVICE_ENV, "/dev/i2c-3");
		assert_eq!(i2c_device(&RASPBERRY_PI), "/dev/i2c-3");

		std::env::set_var(I2C_DEVICE_ENV, "");
		assert_eq!(i2c_device(&RASPBERRY_PI), "/dev/i2c-1");

		std::env::remove_var(I2C_DEVICE_ENV);
	}
}
