//! # TCS34725 RGBC Color Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the TCS34725 RGBC (red, green,
//! blue, clear) light color sensor, built using the [`embedded-hal`] traits
//! for I2C communication.
//!
//! The TCS34725 provides:
//! - Individual red, green, blue and clear (unfiltered) channels
//! - Programmable gain (1x to 60x)
//! - Programmable integration time (2.4 ms to 700 ms)
//! - Interrupt support with configurable clear-channel thresholds
//! - I2C interface (address 0x29)
//!
//! ## Features
//!
//! - **White-reference calibration** with two strategies: a brightness-bucketed
//!   scaling table and a cheaper fixed-offset correction (see the
//!   [`calibration`] module)
//! - **Bounded 0-255 color output** normalized against the calibration
//!   reference
//! - **Interrupt threshold configuration**
//! - **Async support** via the `async` feature (switches the whole API to
//!   [`embedded-hal-async`])
//! - Optional `defmt` or `log` diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tcs34725::{Gain, IntegrationTime, Tcs34725};
//!
//! # fn main() {
//! let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let delay = embedded_hal_mock::eh1::delay::NoopDelay;
//! let mut sensor = Tcs34725::new(i2c, delay);
//!
//! sensor.init().unwrap();
//! sensor.set_integration_time(IntegrationTime::Ms101).unwrap();
//! sensor.set_gain(Gain::Gain4x).unwrap();
//!
//! // Present a white reference when prompted; the table calibration is
//! // collected over a five second window.
//! sensor.calibrate().unwrap();
//!
//! let rgb = sensor.read_rgb().unwrap();
//! // println!("R: {} G: {} B: {}", rgb.red, rgb.green, rgb.blue);
//! # }
//! ```
//!
//! A previously captured calibration table can be replayed without
//! re-sampling through [`Tcs34725::calibrate_manual`], and inspected for
//! persistence through [`Tcs34725::calibration`].
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//! [`embedded-hal-async`]: https://crates.io/crates/embedded-hal-async

#![no_std]
#![deny(missing_docs)]

mod fmt; // <-- must be first module!

pub mod calibration;

pub use calibration::{
    Calibration, CalibrationError, CalibrationOffset, CalibrationTable, Rgb8, RgbcReading,
    ScaleCoefficients, MAX_CALIB_SAMPLES,
};

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

/// Default I2C address of the TCS34725.
pub const I2C_ADDRESS: u8 = 0x29;

/// Value of the ID register identifying a TCS34725.
pub const DEVICE_ID: u8 = 0x44;

/// Wait before sampling starts during auto-calibration, giving the operator
/// time to position the white reference.
pub const CALIBRATION_SETTLE_MS: u32 = 5000;

/// Length of the sampling window over which auto-calibration spreads its
/// reference samples.
pub const CALIBRATION_WINDOW_MS: u32 = 5000;

// Every register access goes through the command register; the high bit
// selects it, the low bits carry the target address.
const COMMAND_BIT: u8 = 0x80;
const COMMAND_SPECIAL_FUNCTION: u8 = 0x60;
const SF_CLEAR_IRQ: u8 = 0x06;

// Register addresses
const ENABLE: u8 = 0x00;
const ATIME: u8 = 0x01;
const AILTL: u8 = 0x04;
const AILTH: u8 = 0x05;
const AIHTL: u8 = 0x06;
const AIHTH: u8 = 0x07;
const CONTROL: u8 = 0x0F;
const ID: u8 = 0x12;
const CDATAL: u8 = 0x14;
const RDATAL: u8 = 0x16;
const GDATAL: u8 = 0x18;
const BDATAL: u8 = 0x1A;

// ENABLE register flags
const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const ENABLE_AIEN: u8 = 0x10;

/// RGBC integration time settings.
///
/// Longer integration yields higher resolution and lower noise at the cost of
/// sampling rate. The variants carry the hardware register codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 2.4 ms, 1 cycle
    Ms2_4 = 0xFF,
    /// 24 ms, 10 cycles
    Ms24 = 0xF6,
    /// 101 ms, 42 cycles
    Ms101 = 0xD5,
    /// 154 ms, 64 cycles
    Ms154 = 0xC0,
    /// 700 ms, 256 cycles
    Ms700 = 0x00,
}

impl IntegrationTime {
    /// Milliseconds to wait after an ADC restart before the channel data is
    /// valid. The shortest setting waits 3 ms rather than the nominal 2.4 ms
    /// as slack for the ADC pipeline.
    pub fn delay_ms(self) -> u32 {
        match self {
            IntegrationTime::Ms2_4 => 3,
            IntegrationTime::Ms24 => 24,
            IntegrationTime::Ms101 => 101,
            IntegrationTime::Ms154 => 154,
            IntegrationTime::Ms700 => 700,
        }
    }
}

/// RGBC analog gain settings.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// 1x gain
    Gain1x = 0x00,
    /// 4x gain
    Gain4x = 0x01,
    /// 16x gain
    Gain16x = 0x02,
    /// 60x gain
    Gain60x = 0x03,
}

/// All possible errors in this crate.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// Invalid device ID detected
    InvalidDeviceId {
        /// Expected device ID
        expected: u8,
        /// Found device ID
        found: u8,
    },
    /// A color conversion was requested before any calibration was stored
    NotCalibrated,
    /// A calibration could not be built from the supplied or captured samples
    Calibration(CalibrationError),
}

/// High-level TCS34725 driver.
pub struct Tcs34725<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    integration_time: IntegrationTime,
    gain: Gain,
    calibration: Option<Calibration>,
}

impl<I2C, D> Tcs34725<I2C, D> {
    /// Creates a driver instance on the default address with the default
    /// configuration (154 ms integration, 1x gain). Nothing touches the bus
    /// until [`init`](Self::init).
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::new_with_address(i2c, delay, I2C_ADDRESS)
    }

    /// Creates a driver instance on a non-default I2C address.
    pub fn new_with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            integration_time: IntegrationTime::Ms154,
            gain: Gain::Gain1x,
            calibration: None,
        }
    }

    /// The active integration time setting.
    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    /// The active gain setting.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// The stored calibration, if any. The table variant exposes its samples
    /// and coefficient rows for persistence; feed the samples back through
    /// [`calibrate_manual`](Self::calibrate_manual) to restore a table
    /// without re-sampling.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Destroys the driver and returns the I2C interface.
    pub fn destroy(self) -> I2C {
        self.i2c
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E, D> Tcs34725<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Initializes the sensor: verifies the device ID, writes the cached
    /// integration time and gain, and powers the device up.
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        let id = self.read_register(ID).await?;
        if id != DEVICE_ID {
            return Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found: id,
            });
        }
        debug!("TCS34725 found, configuring");

        self.set_integration_time(self.integration_time).await?;
        self.set_gain(self.gain).await?;
        self.enable().await
    }

    /// Powers the device on and starts the RGBC ADCs.
    pub async fn enable(&mut self) -> Result<(), Error<E>> {
        self.write_register(ENABLE, ENABLE_PON).await?;
        // The oscillator needs 2.4 ms after power-on before AEN may be set.
        self.delay.delay_ms(3).await;
        self.write_register(ENABLE, ENABLE_PON | ENABLE_AEN).await
    }

    /// Powers the device down, preserving the other enable-register bits.
    pub async fn disable(&mut self) -> Result<(), Error<E>> {
        let value = self.read_register(ENABLE).await?;
        self.write_register(ENABLE, value & !ENABLE_PON).await
    }

    /// Sets the RGBC integration time and caches it for raw-read delays.
    pub async fn set_integration_time(&mut self, time: IntegrationTime) -> Result<(), Error<E>> {
        self.write_register(ATIME, time as u8).await?;
        self.integration_time = time;
        Ok(())
    }

    /// Sets the analog gain. The setting is cached but not consumed by the
    /// calibration path.
    pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.write_register(CONTROL, gain as u8).await?;
        self.gain = gain;
        Ok(())
    }

    /// Reads one raw RGBC sample.
    ///
    /// Blocks for the active integration time so the returned values come
    /// from a completed integration cycle. The device must be enabled; this
    /// function does not re-enable a powered-down sensor.
    pub async fn read_raw(&mut self) -> Result<RgbcReading, Error<E>> {
        self.delay.delay_ms(self.integration_time.delay_ms()).await;
        let clear = self.read_register16(CDATAL).await?;
        let red = self.read_register16(RDATAL).await?;
        let green = self.read_register16(GDATAL).await?;
        let blue = self.read_register16(BDATAL).await?;
        Ok(RgbcReading {
            red,
            green,
            blue,
            clear,
        })
    }

    /// Reads one sample and converts it to a calibrated 0-255 triple.
    ///
    /// # Errors
    ///
    /// [`Error::NotCalibrated`] if no calibration has been stored yet; run
    /// [`calibrate`](Self::calibrate), [`calibrate_offset`](Self::calibrate_offset)
    /// or [`calibrate_manual`](Self::calibrate_manual) first.
    pub async fn read_rgb(&mut self) -> Result<Rgb8, Error<E>> {
        let raw = self.read_raw().await?;
        let calibration = self.calibration.as_ref().ok_or(Error::NotCalibrated)?;
        Ok(calibration.convert(&raw))
    }

    /// Installs a table calibration from caller-supplied reference samples,
    /// for example a batch previously obtained through
    /// [`calibration`](Self::calibration).
    ///
    /// The samples go through the same sort-and-derive path as
    /// [`calibrate`](Self::calibrate). At least two samples are required;
    /// on any error the previously stored calibration is left untouched.
    pub fn calibrate_manual(&mut self, samples: &[RgbcReading]) -> Result<(), Error<E>> {
        if samples.len() < 2 {
            error!(
                "manual calibration needs at least 2 samples, got {}",
                samples.len()
            );
            return Err(Error::Calibration(CalibrationError::TooFewSamples));
        }
        let table = CalibrationTable::from_samples(samples).map_err(Error::Calibration)?;
        self.calibration = Some(Calibration::Table(table));
        Ok(())
    }

    /// Builds a table calibration from live samples of a white reference.
    ///
    /// Waits [`CALIBRATION_SETTLE_MS`] for the operator to position the
    /// reference, then spreads up to [`MAX_CALIB_SAMPLES`] raw samples over
    /// the [`CALIBRATION_WINDOW_MS`] window (the active integration time
    /// bounds how many fit). The previous calibration is replaced only on
    /// success.
    pub async fn calibrate(&mut self) -> Result<(), Error<E>> {
        info!("Calibration starts: present a white reference to the sensor");
        self.delay.delay_ms(CALIBRATION_SETTLE_MS).await;
        info!("Calibrating");

        let integration_ms = self.integration_time.delay_ms();
        let count = (CALIBRATION_WINDOW_MS / integration_ms).clamp(1, MAX_CALIB_SAMPLES as u32);
        // Each raw read already blocks for the integration time; pause for
        // the remainder of the sample slot.
        let pause_ms = (CALIBRATION_WINDOW_MS / count).saturating_sub(integration_ms);

        let mut samples = [RgbcReading::default(); MAX_CALIB_SAMPLES];
        for sample in samples.iter_mut().take(count as usize) {
            *sample = self.read_raw().await?;
            self.delay.delay_ms(pause_ms).await;
        }

        let table = CalibrationTable::from_samples(&samples[..count as usize])
            .map_err(Error::Calibration)?;
        self.calibration = Some(Calibration::Table(table));
        info!("Calibration done");
        Ok(())
    }

    /// Builds an offset calibration from live samples of a white reference.
    ///
    /// Same settle wait and sample count as [`calibrate`](Self::calibrate), but
    /// the samples collapse into per-channel bias offsets instead of a
    /// scaling table. The previous calibration is replaced only on success.
    pub async fn calibrate_offset(&mut self) -> Result<(), Error<E>> {
        info!("Calibration starts: present a white reference to the sensor");
        self.delay.delay_ms(CALIBRATION_SETTLE_MS).await;
        info!("Calibrating");

        let integration_ms = self.integration_time.delay_ms();
        let count = (CALIBRATION_WINDOW_MS / integration_ms).clamp(1, MAX_CALIB_SAMPLES as u32);

        let mut samples = [RgbcReading::default(); MAX_CALIB_SAMPLES];
        for sample in samples.iter_mut().take(count as usize) {
            *sample = self.read_raw().await?;
        }

        let offset = CalibrationOffset::from_samples(&samples[..count as usize])
            .map_err(Error::Calibration)?;
        self.calibration = Some(Calibration::Offset(offset));
        info!("Calibration done");
        Ok(())
    }

    /// Enables the clear-channel threshold interrupt.
    pub async fn enable_interrupt(&mut self) -> Result<(), Error<E>> {
        let value = self.read_register(ENABLE).await?;
        self.write_register(ENABLE, value | ENABLE_AIEN).await
    }

    /// Disables the clear-channel threshold interrupt.
    pub async fn disable_interrupt(&mut self) -> Result<(), Error<E>> {
        let value = self.read_register(ENABLE).await?;
        self.write_register(ENABLE, value & !ENABLE_AIEN).await
    }

    /// Sets the clear-channel interrupt thresholds. Each 16-bit limit is
    /// written as a little-endian register pair, low byte first.
    pub async fn set_interrupt_limits(&mut self, low: u16, high: u16) -> Result<(), Error<E>> {
        let low = low.to_le_bytes();
        let high = high.to_le_bytes();
        self.write_register(AILTL, low[0]).await?;
        self.write_register(AILTH, low[1]).await?;
        self.write_register(AIHTL, high[0]).await?;
        self.write_register(AIHTH, high[1]).await
    }

    /// Clears a pending interrupt via the special-function command.
    pub async fn clear_interrupt(&mut self) -> Result<(), Error<E>> {
        self.i2c
            .write(
                self.address,
                &[COMMAND_BIT | COMMAND_SPECIAL_FUNCTION | SF_CLEAR_IRQ],
            )
            .await
            .map_err(Error::I2c)
    }

    // Helper methods for register access

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | register, value])
            .await
            .map_err(Error::I2c)
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | register], &mut buffer)
            .await
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    async fn read_register16(&mut self, register: u8) -> Result<u16, Error<E>> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | register], &mut buffer)
            .await
            .map_err(Error::I2c)?;
        Ok(u16::from_le_bytes(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    extern crate std;
    use std::vec;
    use std::vec::Vec;

    fn reading(red: u16, green: u16, blue: u16, clear: u16) -> RgbcReading {
        RgbcReading {
            red,
            green,
            blue,
            clear,
        }
    }

    // Four little-endian channel reads in clear, red, green, blue order.
    fn raw_read_transactions(sample: RgbcReading) -> Vec<I2cTransaction> {
        [
            (CDATAL, sample.clear),
            (RDATAL, sample.red),
            (GDATAL, sample.green),
            (BDATAL, sample.blue),
        ]
        .into_iter()
        .map(|(register, value)| {
            I2cTransaction::write_read(
                I2C_ADDRESS,
                vec![COMMAND_BIT | register],
                value.to_le_bytes().to_vec(),
            )
        })
        .collect()
    }

    #[test]
    fn init_verifies_id_and_configures_defaults() {
        let expectations = [
            I2cTransaction::write_read(I2C_ADDRESS, vec![COMMAND_BIT | ID], vec![DEVICE_ID]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | ATIME, 0xC0]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | CONTROL, 0x00]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | ENABLE, ENABLE_PON]),
            I2cTransaction::write(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE, ENABLE_PON | ENABLE_AEN],
            ),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.init().unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn init_rejects_unknown_device() {
        let expectations = [I2cTransaction::write_read(
            I2C_ADDRESS,
            vec![COMMAND_BIT | ID],
            vec![0x4D],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        assert!(matches!(
            sensor.init(),
            Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found: 0x4D,
            })
        ));

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn disable_preserves_other_enable_bits() {
        let expectations = [
            I2cTransaction::write_read(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE],
                vec![ENABLE_PON | ENABLE_AEN | ENABLE_AIEN],
            ),
            I2cTransaction::write(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE, ENABLE_AEN | ENABLE_AIEN],
            ),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.disable().unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn set_integration_time_writes_code_and_caches() {
        let expectations = [I2cTransaction::write(
            I2C_ADDRESS,
            vec![COMMAND_BIT | ATIME, 0xD5],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.set_integration_time(IntegrationTime::Ms101).unwrap();
        assert_eq!(sensor.integration_time(), IntegrationTime::Ms101);

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn integration_time_delays_follow_the_code_mapping() {
        assert_eq!(IntegrationTime::Ms2_4.delay_ms(), 3);
        assert_eq!(IntegrationTime::Ms24.delay_ms(), 24);
        assert_eq!(IntegrationTime::Ms101.delay_ms(), 101);
        assert_eq!(IntegrationTime::Ms154.delay_ms(), 154);
        assert_eq!(IntegrationTime::Ms700.delay_ms(), 700);
    }

    #[test]
    fn set_gain_writes_control_register() {
        let expectations = [I2cTransaction::write(
            I2C_ADDRESS,
            vec![COMMAND_BIT | CONTROL, 0x02],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.set_gain(Gain::Gain16x).unwrap();
        assert_eq!(sensor.gain(), Gain::Gain16x);

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn read_raw_assembles_little_endian_channels() {
        let expectations = raw_read_transactions(reading(0x5678, 0x9ABC, 0xDEF0, 0x1234));
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        let raw = sensor.read_raw().unwrap();
        assert_eq!(raw, reading(0x5678, 0x9ABC, 0xDEF0, 0x1234));

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn read_rgb_requires_calibration() {
        let expectations = raw_read_transactions(reading(100, 100, 100, 300));
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        assert!(matches!(sensor.read_rgb(), Err(Error::NotCalibrated)));

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn read_rgb_converts_through_the_stored_table() {
        let expectations = raw_read_transactions(reading(410, 420, 400, 1210));
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor
            .calibrate_manual(&[reading(800, 820, 790, 2400), reading(400, 410, 395, 1200)])
            .unwrap();

        let rgb = sensor.read_rgb().unwrap();
        assert_eq!(
            rgb,
            Rgb8 {
                red: 130,
                green: 130,
                blue: 129,
            }
        );

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn calibrate_manual_rejects_short_batches_and_keeps_prior_state() {
        let i2c = I2cMock::new(&[]);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        let batch = [reading(800, 820, 790, 2400), reading(400, 410, 395, 1200)];
        sensor.calibrate_manual(&batch).unwrap();
        let before = *sensor.calibration().unwrap();

        assert!(matches!(
            sensor.calibrate_manual(&[reading(1, 1, 1, 1)]),
            Err(Error::Calibration(CalibrationError::TooFewSamples))
        ));
        assert_eq!(*sensor.calibration().unwrap(), before);

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn calibrate_fills_and_sorts_the_table() {
        // 154 ms integration over a 5 s window caps at the full table size.
        let mut expectations = Vec::new();
        for i in 0..MAX_CALIB_SAMPLES as u16 {
            expectations.extend(raw_read_transactions(reading(
                800 + i,
                820 + i,
                790 + i,
                2400 - 100 * i,
            )));
        }
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.calibrate().unwrap();

        let Some(Calibration::Table(table)) = sensor.calibration() else {
            panic!("expected a table calibration");
        };
        assert_eq!(table.samples().len(), MAX_CALIB_SAMPLES);
        // The first capture was the brightest and becomes the reference.
        assert_eq!(table.samples()[0], reading(800, 820, 790, 2400));
        assert_eq!(table.coefficients()[0], ScaleCoefficients::IDENTITY);
        assert!(table
            .samples()
            .windows(2)
            .all(|pair| pair[0].clear >= pair[1].clear));

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn calibrate_offset_collapses_samples_into_bias_state() {
        let mut expectations = Vec::new();
        for _ in 0..MAX_CALIB_SAMPLES {
            expectations.extend(raw_read_transactions(reading(400, 500, 600, 1000)));
        }
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.calibrate_offset().unwrap();

        let Some(Calibration::Offset(offset)) = sensor.calibration() else {
            panic!("expected an offset calibration");
        };
        assert_eq!(offset.brightness_average(), 500);
        assert_eq!(offset.channel_diff(), [-100, 0, 100]);

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn interrupt_flag_is_read_modify_written() {
        let expectations = [
            I2cTransaction::write_read(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE],
                vec![ENABLE_PON | ENABLE_AEN],
            ),
            I2cTransaction::write(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE, ENABLE_PON | ENABLE_AEN | ENABLE_AIEN],
            ),
            I2cTransaction::write_read(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE],
                vec![ENABLE_PON | ENABLE_AEN | ENABLE_AIEN],
            ),
            I2cTransaction::write(
                I2C_ADDRESS,
                vec![COMMAND_BIT | ENABLE, ENABLE_PON | ENABLE_AEN],
            ),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.enable_interrupt().unwrap();
        sensor.disable_interrupt().unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn interrupt_limits_are_split_low_byte_first() {
        let expectations = [
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | AILTL, 0x34]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | AILTH, 0x12]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | AIHTL, 0xCD]),
            I2cTransaction::write(I2C_ADDRESS, vec![COMMAND_BIT | AIHTH, 0xAB]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.set_interrupt_limits(0x1234, 0xABCD).unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn clear_interrupt_issues_special_function_command() {
        let expectations = [I2cTransaction::write(
            I2C_ADDRESS,
            vec![COMMAND_BIT | COMMAND_SPECIAL_FUNCTION | SF_CLEAR_IRQ],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new(i2c, NoopDelay);

        sensor.clear_interrupt().unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }

    #[test]
    fn custom_address_is_used_on_the_bus() {
        let expectations = [I2cTransaction::write(0x39, vec![COMMAND_BIT | ATIME, 0xF6])];
        let i2c = I2cMock::new(&expectations);
        let mut sensor = Tcs34725::new_with_address(i2c, NoopDelay, 0x39);

        sensor.set_integration_time(IntegrationTime::Ms24).unwrap();

        let mut i2c = sensor.destroy();
        i2c.done();
    }
}
