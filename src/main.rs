//! # DAC3101 Setup
//!
//! Run this on the Raspberry Pi to program the DAC. It:
//!
//! * pulses the TLV320DAC3101's reset line using the GPIO expander,
//! * locks the DAC's PLL to the master clock, trimmed by a given number of
//!   parts-per-million, and
//! * powers up and unmutes the headphone and speaker outputs.
//!
//! Usage: `dac3101-setup <ppm>`
//!
//! Set `RUST_LOG=debug` to see every register write.

// -----------------------------------------------------------------------------
// Licence Statement
// -----------------------------------------------------------------------------
// Copyright (c) Jonathan 'theJPster' Pallant and the Neotron Developers, 2021
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.
// -----------------------------------------------------------------------------

// -----------------------------------------------------------------------------
// Sub-modules
// -----------------------------------------------------------------------------

mod config;
mod expander;
mod pll;
mod tlv320dac3101;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

use embedded_hal::blocking::{delay::DelayMs, i2c::Write};
use env_logger::Env;
use linux_embedded_hal::{i2cdev::linux::LinuxI2CError, Delay, I2cdev};
use log::{error, info, warn};

use config::BoardConfig;
use pll::{PllError, PllSettings};
use tlv320dac3101::{
	Channel, ClkoutSource, Codec, CodecClockIn, CommonMode, DataFormat, DepopPowerOn, DepopStep,
	Gpio1Mode, Mode, PllClockIn, SpeakerGain, WordLength,
};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Everything that can stop us programming the DAC
#[derive(Debug)]
enum Error {
	/// Wrong number of arguments
	Usage,
	/// The argument wasn't a number
	BadPpm(String),
	/// The trim can't be turned into PLL settings
	Pll(PllError),
	/// Couldn't open the I²C device
	Open(String, LinuxI2CError),
	/// An I²C write failed
	Bus(LinuxI2CError),
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Program version
const VERSION: &str = include_str!(concat!(env!("OUT_DIR"), "/version.txt"));

/// Analog output attenuation, in 0.5 dB steps (so -9 dB)
const OUTPUT_ATTENUATION: u8 = 18;

/// CLKOUT divides DAC_CLK by this
const CLKOUT_DIVIDER: u8 = 1;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

fn main() {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	if let Err(e) = run(std::env::args().skip(1)) {
		error!("{}", e);
		std::process::exit(1);
	}
}

/// Parse the arguments, open the bus and program the DAC.
fn run<I>(args: I) -> Result<(), Error>
where
	I: Iterator<Item = String>,
{
	info!("DAC3101 setup {} starting...", VERSION);

	let board = &config::RASPBERRY_PI;
	let ppm = parse_ppm(args)?;
	let pll = PllSettings::from_ppm(ppm).map_err(Error::Pll)?;
	info!("J: {} D: {}", pll.j, pll.d);
	if let Err(e) = pll.check_datasheet_limits(board.mclk) {
		warn!("{}", e);
	}

	let device = config::i2c_device(board);
	info!("Opening {}", device);
	let mut bus = I2cdev::new(&device).map_err(|e| Error::Open(device.clone(), e))?;
	let mut delay = Delay;

	setup_dac(&mut bus, &mut delay, board, &pll).map_err(Error::Bus)?;

	info!(
		"DAC running, PLL_CLK = {:.0} Hz, {} Hz sample rate",
		pll.pll_clock_hz(board.mclk),
		board.sample_rate.raw()
	);
	Ok(())
}

/// Get the clock trim out of the command line.
fn parse_ppm<I>(mut args: I) -> Result<f64, Error>
where
	I: Iterator<Item = String>,
{
	match (args.next(), args.next()) {
		(Some(arg), None) => arg.trim().parse().map_err(|_| Error::BadPpm(arg)),
		_ => Err(Error::Usage),
	}
}

/// Reset the DAC and run it through its power-up sequence.
///
/// The order of the writes, and the delays between them, come from the
/// datasheet's power-up sequence. The PLL must be programmed while it is
/// powered down, and the output drivers must be powered up before the DAC
/// channels are.
fn setup_dac<B, D>(
	bus: &mut B,
	delay: &mut D,
	board: &BoardConfig,
	pll: &PllSettings,
) -> Result<(), B::Error>
where
	B: Write,
	D: DelayMs<u32>,
{
	expander::reset_dac(bus, delay, board.expander_address, board.reset_hold)?;
	delay.delay_ms(board.reset_recovery.to_millis());

	let mut dac = Codec::new(board.dac_address);
	// Reset also powers down the PLL
	dac.reset(bus)?;

	// Clocks: PLL_CLK = MCLK * R * J.D / P, DAC_CLK = PLL_CLK / NDAC,
	// DAC_MOD_CLK = DAC_CLK / MDAC, and DAC_FS = DAC_MOD_CLK / DOSR.
	dac.set_pll_multiplier(bus, pll::PROGRAMMED_J, pll)?;
	delay.delay_ms(board.pll_settle.to_millis());
	dac.set_clock_muxing(bus, PllClockIn::Mclk, CodecClockIn::PllClk)?;
	dac.power_up_pll(bus, pll)?;
	dac.set_dac_dividers(bus, board.ndac, board.mdac, board.dosr)?;
	dac.set_clkout(bus, ClkoutSource::DacClk, CLKOUT_DIVIDER)?;
	dac.set_gpio1_mode(bus, Gpio1Mode::Clkout)?;
	dac.set_interface(bus, DataFormat::I2s, WordLength::B24, Mode::Secondary)?;

	// Analog outputs
	dac.set_headphone_drivers(bus, CommonMode::V1_65, false)?;
	dac.set_headphone_depop(bus, DepopPowerOn::Ms800, DepopStep::Ms4)?;
	dac.set_dac_to_mixer_routing(bus, true)?;
	dac.set_headphone_driver(bus, Channel::Both, 0, false)?;
	dac.set_speaker_driver(bus, Channel::Both, SpeakerGain::Db12, false)?;
	dac.set_headphone_drivers(bus, CommonMode::V1_65, true)?;
	dac.set_speaker_amp_powered(bus, Channel::Both)?;
	dac.set_headphone_volume(bus, Channel::Both, OUTPUT_ATTENUATION)?;
	dac.set_speaker_volume(bus, Channel::Both, OUTPUT_ATTENUATION)?;
	delay.delay_ms(board.output_ramp.to_millis());

	// DAC channels
	dac.power_up_dac_channels(bus)?;
	dac.set_dac_digital_volume(bus, Channel::Both, 0)?;
	dac.set_dac_mute(bus, false, Channel::Both)?;
	Ok(())
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Usage => write!(f, "usage: dac3101-setup <ppm>"),
			Error::BadPpm(arg) => write!(f, "{:?} is not a PPM value", arg),
			Error::Pll(e) => write!(f, "can't trim PLL: {}", e),
			Error::Open(device, e) => write!(f, "can't open {}: {}", device, e),
			Error::Bus(e) => write!(f, "I²C write failed: {}", e),
		}
	}
}
