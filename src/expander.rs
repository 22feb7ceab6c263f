//! GPIO Expander Control Functions
//!
//! The DAC's active-low reset line, DAC_RST_N, is wired to pin P0.7 of a
//! PCA9535-style 16-bit I²C GPIO expander.

use embedded_hal::blocking::{delay::DelayMs, i2c::Write};
use fugit::MillisDurationU32;

/// The Registers on the GPIO expander
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
	/// Configuration Port 0. A 1 bit makes that pin an input.
	ConfigPort0 = 0x06,
}

/// Pin P0.7 drives DAC_RST_N
const DAC_RESET_PIN: u8 = 1 << 7;

/// Every pin on port 0 is an input
const ALL_INPUTS: u8 = 0xFF;

/// Write to a register on the GPIO expander.
pub fn write_register<B>(bus: &mut B, address: u8, register: Register, value: u8) -> Result<(), B::Error>
where
	B: Write,
{
	log::debug!(
		"Setting expander 0x{:02x} register {:?} to 0x{:02x}",
		address,
		register,
		value
	);
	bus.write(address, &[register as u8, value])
}

/// Pulse the DAC's reset line.
///
/// Makes every pin an input, waits `hold`, then makes P0.7 an output so it
/// drives DAC_RST_N from the output latch, and waits `hold` again.
pub fn reset_dac<B, D>(
	bus: &mut B,
	delay: &mut D,
	address: u8,
	hold: MillisDurationU32,
) -> Result<(), B::Error>
where
	B: Write,
	D: DelayMs<u32>,
{
	write_register(bus, address, Register::ConfigPort0, ALL_INPUTS)?;
	delay.delay_ms(hold.to_millis());
	write_register(bus, address, Register::ConfigPort0, ALL_INPUTS & !DAC_RESET_PIN)?;
	delay.delay_ms(hold.to_millis());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use embedded_hal_mock::delay::MockNoop;
	use embedded_hal_mock::i2c::{Mock, Transaction};

	#[test]
	fn reset_pulse() {
		let expectations = [
			Transaction::write(0x20, vec![0x06, 0xFF]),
			Transaction::write(0x20, vec![0x06, 0x7F]),
		];
		let mut i2c = Mock::new(&expectations);
		reset_dac(&mut i2c, &mut MockNoop::new(), 0x20, MillisDurationU32::from_ticks(100)).unwrap();
		i2c.done();
	}
}
