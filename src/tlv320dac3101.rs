//! # TLV320DAC3101 Driver
//!
//! This is driver for the Texas Instruments TLV320DAC3101 stereo audio DAC,
//! with headphone and Class-D speaker amplifiers.
//!
//! Specifically, this driver is for setting the registers in the DAC over I²C
//! - this driver does not handle the digital audio interface (I²S, or
//! similar).
//!
//! The registers are split into pages, selected by writing to register 0 on
//! any page. We remember which page was last selected so that each register
//! write only changes page when it has to. Every setter goes straight out on
//! the bus - nothing is cached and nothing is read back.

use embedded_hal::blocking::i2c::Write;

use crate::pll::PllSettings;

//
// Public Types
//

/// Selects either only the left channel, only the right channel, or both
/// channels together.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Channel {
	/// Just the left channel
	Left,
	/// Just the right channel
	Right,
	/// Both channels, left first
	Both,
}

/// Where the PLL gets its input clock from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PllClockIn {
	/// The MCLK pin
	Mclk = 0b00,
}

/// Where CODEC_CLKIN (which feeds NDAC) comes from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecClockIn {
	/// The PLL output
	PllClk = 0b11,
}

/// What comes out of the CLKOUT divider
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClkoutSource {
	/// DAC_CLK, the output of NDAC
	DacClk = 0b100,
}

/// What the GPIO1 pin does
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Gpio1Mode {
	/// Pin outputs CLKOUT
	Clkout = 0b0100,
}

/// How the data is sent over the digital bus
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataFormat {
	/// I²S Format (i.e. Most Significant Bit first, `left-1` aligned)
	I2s = 0b00,
}

/// The size, in bits, of each sample
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WordLength {
	/// 24-bit samples
	B24 = 0b10,
}

/// Whether the DAC generates or receives clock signals.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
	/// DAC receives the BCLK and WCLK signals. The documentation uses the
	/// archaic term 'Slave'.
	Secondary = 0b00,
}

/// Output common-mode voltage of the headphone drivers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommonMode {
	/// 1.65 V, mid-scale for a 3.3 V supply
	V1_65 = 0b10,
}

/// How long the headphone drivers take to power on
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepopPowerOn {
	/// 800 ms
	Ms800 = 0b1001,
}

/// The step time of the headphone driver soft-routing
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepopStep {
	/// 4 ms per step
	Ms4 = 0b11,
}

/// Gain of the Class-D speaker drivers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpeakerGain {
	/// +12 dB
	Db12 = 0b01,
}

/// Represents the DAC on the bus.
pub struct Codec {
	bus_address: u8,
	page: Option<u8>,
}

//
// Private Types
//

/// The registers in the DAC that we use.
///
/// The discriminant is `page << 8 | register`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
enum Register {
	// Page 0
	SoftwareReset = 0x0001,
	ClockGenMuxing = 0x0004,
	PllPAndR = 0x0005,
	PllJ = 0x0006,
	PllDMsb = 0x0007,
	PllDLsb = 0x0008,
	Ndac = 0x000B,
	Mdac = 0x000C,
	DosrLsb = 0x000E,
	ClkoutMux = 0x0019,
	ClkoutM = 0x001A,
	CodecInterfaceControl = 0x001B,
	Gpio1Control = 0x0033,
	DacDataPathSetup = 0x003F,
	DacVolumeControl = 0x0040,
	DacLeftVolume = 0x0041,
	DacRightVolume = 0x0042,
	// Page 1
	HeadphoneDrivers = 0x011F,
	ClassDSpeakerAmp = 0x0120,
	HeadphoneDepop = 0x0121,
	DacOutputMixerRouting = 0x0123,
	HplAnalogVolume = 0x0124,
	HprAnalogVolume = 0x0125,
	SpklAnalogVolume = 0x0126,
	SpkrAnalogVolume = 0x0127,
	HplDriver = 0x0128,
	HprDriver = 0x0129,
	SpklDriver = 0x012A,
	SpkrDriver = 0x012B,
}

//
// Public Data
//

/// The DAC has a fixed I²C address
pub const DEFAULT_ADDRESS: u8 = 0x18;

//
// Private Data
//

/// Register 0 on every page selects the page
const PAGE_CONTROL: u8 = 0x00;

/// Set in the divider registers to power the divider up
const POWER_UP: u8 = 1 << 7;

//
// impls on Public Types
//

impl Channel {
	fn left(self) -> bool {
		self == Channel::Left || self == Channel::Both
	}

	fn right(self) -> bool {
		self == Channel::Right || self == Channel::Both
	}
}

impl Codec {
	/// Create a new DAC proxy object.
	///
	/// We don't know which page the DAC is on until we have either reset it
	/// or selected a page.
	pub fn new(bus_address: u8) -> Codec {
		Codec {
			bus_address,
			page: None,
		}
	}

	/// Select a register page, whether or not we think it's already selected.
	pub fn select_page<B>(&mut self, bus: &mut B, page: u8) -> Result<(), B::Error>
	where
		B: Write,
	{
		log::debug!("Selecting DAC page {}", page);
		bus.write(self.bus_address, &[PAGE_CONTROL, page])?;
		self.page = Some(page);
		Ok(())
	}

	/// Write to one register, changing page first if required.
	fn write_register<B>(&mut self, bus: &mut B, register: Register, value: u8) -> Result<(), B::Error>
	where
		B: Write,
	{
		if self.page != Some(register.page()) {
			self.select_page(bus, register.page())?;
		}
		log::debug!(
			"Setting DAC {:?} (page {}, 0x{:02x}) to 0x{:02x}",
			register,
			register.page(),
			register.address(),
			value
		);
		bus.write(self.bus_address, &[register.address(), value])
	}

	/// Resets the DAC and puts all the registers back to defaults.
	///
	/// This also powers the PLL off. The DAC comes out of reset on page 0.
	pub fn reset<B>(&mut self, bus: &mut B) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.select_page(bus, 0)?;
		self.write_register(bus, Register::SoftwareReset, 0x01)?;
		self.page = Some(0);
		Ok(())
	}

	/// Load the J value, and the D value from `pll`, into the PLL.
	///
	/// D must be written MSB first; the DAC latches both halves on the LSB
	/// write.
	pub fn set_pll_multiplier<B>(&mut self, bus: &mut B, j: u8, pll: &PllSettings) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(bus, Register::PllJ, j & 0x3F)?;
		self.write_register(bus, Register::PllDMsb, pll.d_msb() & 0x3F)?;
		self.write_register(bus, Register::PllDLsb, pll.d_lsb())
	}

	/// Choose where the PLL and the rest of the clock tree get their clocks.
	pub fn set_clock_muxing<B>(
		&mut self,
		bus: &mut B,
		pll_in: PllClockIn,
		codec_in: CodecClockIn,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(
			bus,
			Register::ClockGenMuxing,
			((pll_in as u8) << 2) | (codec_in as u8),
		)
	}

	/// Set the P and R values and power up the PLL.
	pub fn power_up_pll<B>(&mut self, bus: &mut B, pll: &PllSettings) -> Result<(), B::Error>
	where
		B: Write,
	{
		// A P of 8 is written as 0, and so is an R of 16
		self.write_register(
			bus,
			Register::PllPAndR,
			POWER_UP | ((pll.p & 0x07) << 4) | (pll.r & 0x0F),
		)
	}

	/// Set and power up the NDAC and MDAC dividers, and set the DAC
	/// oversampling ratio.
	///
	/// Only the bottom eight bits of DOSR are written; the top two stay at
	/// their reset value of zero.
	pub fn set_dac_dividers<B>(&mut self, bus: &mut B, ndac: u8, mdac: u8, dosr: u8) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(bus, Register::Ndac, POWER_UP | (ndac & 0x7F))?;
		self.write_register(bus, Register::Mdac, POWER_UP | (mdac & 0x7F))?;
		self.write_register(bus, Register::DosrLsb, dosr)
	}

	/// Send a clock out of the CLKOUT divider, and power the divider up.
	pub fn set_clkout<B>(&mut self, bus: &mut B, source: ClkoutSource, divider: u8) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(bus, Register::ClkoutMux, source as u8)?;
		self.write_register(bus, Register::ClkoutM, POWER_UP | (divider & 0x7F))
	}

	/// Set what the GPIO1 pin does.
	pub fn set_gpio1_mode<B>(&mut self, bus: &mut B, mode: Gpio1Mode) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(bus, Register::Gpio1Control, (mode as u8) << 2)
	}

	/// Configure the digital audio interface.
	pub fn set_interface<B>(
		&mut self,
		bus: &mut B,
		format: DataFormat,
		word_length: WordLength,
		mode: Mode,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(
			bus,
			Register::CodecInterfaceControl,
			((format as u8) << 6) | ((word_length as u8) << 4) | ((mode as u8) << 2),
		)
	}

	/// Set the headphone output common-mode voltage, and power the headphone
	/// drivers up or down.
	pub fn set_headphone_drivers<B>(
		&mut self,
		bus: &mut B,
		common_mode: CommonMode,
		powered: bool,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		// Bit 2 is reserved and must be written as 1
		let power = if powered { 0b11 << 6 } else { 0 };
		self.write_register(
			bus,
			Register::HeadphoneDrivers,
			power | ((common_mode as u8) << 3) | 1 << 2,
		)
	}

	/// Set the headphone de-pop timing.
	pub fn set_headphone_depop<B>(
		&mut self,
		bus: &mut B,
		power_on: DepopPowerOn,
		step: DepopStep,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(
			bus,
			Register::HeadphoneDepop,
			((power_on as u8) << 3) | ((step as u8) << 1),
		)
	}

	/// Route the left DAC to the left mixer and the right DAC to the right
	/// mixer, or disconnect them both.
	pub fn set_dac_to_mixer_routing<B>(&mut self, bus: &mut B, routed: bool) -> Result<(), B::Error>
	where
		B: Write,
	{
		let value = if routed { (0b01 << 6) | (0b01 << 2) } else { 0 };
		self.write_register(bus, Register::DacOutputMixerRouting, value)
	}

	/// Set the headphone driver gain (0 to 9 dB) and mute.
	pub fn set_headphone_driver<B>(
		&mut self,
		bus: &mut B,
		channel: Channel,
		gain_db: u8,
		muted: bool,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		// Bit 1 is reserved and must be written as 1
		let unmute = if muted { 0 } else { 1 << 2 };
		let value = (gain_db.min(9) << 3) | unmute | 1 << 1;
		if channel.left() {
			self.write_register(bus, Register::HplDriver, value)?;
		}
		if channel.right() {
			self.write_register(bus, Register::HprDriver, value)?;
		}
		Ok(())
	}

	/// Set the Class-D speaker driver gain and mute.
	pub fn set_speaker_driver<B>(
		&mut self,
		bus: &mut B,
		channel: Channel,
		gain: SpeakerGain,
		muted: bool,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		let unmute = if muted { 0 } else { 1 << 2 };
		let value = ((gain as u8) << 3) | unmute;
		if channel.left() {
			self.write_register(bus, Register::SpklDriver, value)?;
		}
		if channel.right() {
			self.write_register(bus, Register::SpkrDriver, value)?;
		}
		Ok(())
	}

	/// Power up the Class-D speaker amplifiers on the given channels, and
	/// power down the others.
	pub fn set_speaker_amp_powered<B>(&mut self, bus: &mut B, channel: Channel) -> Result<(), B::Error>
	where
		B: Write,
	{
		// Bits 2 and 1 are reserved and must be written as 1
		let mut value = 0b11 << 1;
		if channel.left() {
			value |= 1 << 7;
		}
		if channel.right() {
			value |= 1 << 6;
		}
		self.write_register(bus, Register::ClassDSpeakerAmp, value)
	}

	/// Route the mixer to the headphone drivers, with the given attenuation in
	/// 0.5 dB steps (0 is 0 dB, 127 is about -78 dB).
	pub fn set_headphone_volume<B>(
		&mut self,
		bus: &mut B,
		channel: Channel,
		attenuation_steps: u8,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		let value = (1 << 7) | (attenuation_steps & 0x7F);
		if channel.left() {
			self.write_register(bus, Register::HplAnalogVolume, value)?;
		}
		if channel.right() {
			self.write_register(bus, Register::HprAnalogVolume, value)?;
		}
		Ok(())
	}

	/// Route the mixer to the speaker drivers, with the given attenuation in
	/// 0.5 dB steps.
	pub fn set_speaker_volume<B>(
		&mut self,
		bus: &mut B,
		channel: Channel,
		attenuation_steps: u8,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		let value = (1 << 7) | (attenuation_steps & 0x7F);
		if channel.left() {
			self.write_register(bus, Register::SpklAnalogVolume, value)?;
		}
		if channel.right() {
			self.write_register(bus, Register::SpkrAnalogVolume, value)?;
		}
		Ok(())
	}

	/// Power up both DAC channels, with left data to the left DAC and right
	/// data to the right DAC, soft-stepping one step per sample.
	pub fn power_up_dac_channels<B>(&mut self, bus: &mut B) -> Result<(), B::Error>
	where
		B: Write,
	{
		self.write_register(
			bus,
			Register::DacDataPathSetup,
			(0b11 << 6) | (0b01 << 4) | (0b01 << 2),
		)
	}

	/// Set the DAC digital volume, in signed 0.5 dB steps (-127 is -63.5 dB,
	/// 48 is +24 dB).
	pub fn set_dac_digital_volume<B>(
		&mut self,
		bus: &mut B,
		channel: Channel,
		half_db_steps: i8,
	) -> Result<(), B::Error>
	where
		B: Write,
	{
		let value = half_db_steps.clamp(-127, 48) as u8;
		if channel.left() {
			self.write_register(bus, Register::DacLeftVolume, value)?;
		}
		if channel.right() {
			self.write_register(bus, Register::DacRightVolume, value)?;
		}
		Ok(())
	}

	/// Mute or unmute the DAC channels, with independent volume control.
	///
	/// Channels not named in `channel` are left unmuted.
	pub fn set_dac_mute<B>(&mut self, bus: &mut B, muted: bool, channel: Channel) -> Result<(), B::Error>
	where
		B: Write,
	{
		let mut value = 0;
		if muted && channel.left() {
			value |= 1 << 3;
		}
		if muted && channel.right() {
			value |= 1 << 2;
		}
		self.write_register(bus, Register::DacVolumeControl, value)
	}
}

//
// impls on Private Types
//

impl Register {
	fn page(self) -> u8 {
		((self as u16) >> 8) as u8
	}

	fn address(self) -> u8 {
		(self as u16 & 0xFF) as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use embedded_hal_mock::i2c::{Mock, Transaction};

	#[test]
	fn register_pages() {
		assert_eq!(Register::SoftwareReset.page(), 0);
		assert_eq!(Register::SoftwareReset.address(), 0x01);
		assert_eq!(Register::SpkrDriver.page(), 1);
		assert_eq!(Register::SpkrDriver.address(), 0x2B);
	}

	#[test]
	fn reset_selects_page_zero() {
		let expectations = [
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x00]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x01, 0x01]),
		];
		let mut i2c = Mock::new(&expectations);
		let mut codec = Codec::new(DEFAULT_ADDRESS);
		assert_eq!(codec.page, None);
		codec.reset(&mut i2c).unwrap();
		assert_eq!(codec.page, Some(0));
		i2c.done();
	}

	#[test]
	fn changes_page_only_when_needed() {
		let expectations = [
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x01]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x28, 0x06]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x29, 0x06]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x00]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x40, 0x0C]),
		];
		let mut i2c = Mock::new(&expectations);
		let mut codec = Codec::new(DEFAULT_ADDRESS);
		codec
			.set_headphone_driver(&mut i2c, Channel::Both, 0, false)
			.unwrap();
		codec.set_dac_mute(&mut i2c, true, Channel::Both).unwrap();
		assert_eq!(codec.page, Some(0));
		i2c.done();
	}

	#[test]
	fn pll_registers() {
		let pll = PllSettings {
			p: 2,
			r: 1,
			j: 7,
			d: 7500,
		};
		// J is whatever we are told, not the one in `pll`
		let expectations = [
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x00]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x06, 8]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x07, 0x1D]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x08, 0x4C]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x05, 0xA1]),
		];
		let mut i2c = Mock::new(&expectations);
		let mut codec = Codec::new(DEFAULT_ADDRESS);
		codec.set_pll_multiplier(&mut i2c, 8, &pll).unwrap();
		codec.power_up_pll(&mut i2c, &pll).unwrap();
		i2c.done();
	}

	#[test]
	fn single_channel_settings() {
		let expectations = [
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x01]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x2B, 0x08]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x20, 0x86]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x24, 0xFF]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x00, 0x00]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x41, 0x30]),
			Transaction::write(DEFAULT_ADDRESS, vec![0x42, 0x81]),
		];
		let mut i2c = Mock::new(&expectations);
		let mut codec = Codec::new(DEFAULT_ADDRESS);
		codec
			.set_speaker_driver(&mut i2c, Channel::Right, SpeakerGain::Db12, true)
			.unwrap();
		codec.set_speaker_amp_powered(&mut i2c, Channel::Left).unwrap();
		codec.set_headphone_volume(&mut i2c, Channel::Left, 0xFF).unwrap();
		codec
			.set_dac_digital_volume(&mut i2c, Channel::Left, 100)
			.unwrap();
		codec
			.set_dac_digital_volume(&mut i2c, Channel::Right, -128)
			.unwrap();
		i2c.done();
	}
}
