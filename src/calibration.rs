//! White-reference calibration and raw-to-RGB conversion.
//!
//! Raw channel counts depend on gain and integration time, so they are not
//! comparable between configurations or lighting conditions. The types here
//! turn raw [`RgbcReading`]s into a bounded 0-255 triple using a calibration
//! built from samples of a white reference.
//!
//! Two strategies exist in this driver's lineage and both are kept as
//! alternatives behind [`Calibration`]:
//!
//! - [`CalibrationTable`]: multi-point. Reference samples are sorted by
//!   brightness (clear channel) and a per-bucket scaling row is derived from
//!   each. At conversion time the bucket matching the current brightness
//!   rescales the reading before normalization.
//! - [`CalibrationOffset`]: single-point. Each channel's deviation from the
//!   achromatic average of the reference batch is stored as a fixed additive
//!   bias, subtracted from every future reading.
//!
//! The table strategy tracks brightness changes better; the offset strategy
//! is cheaper and assumes the lighting stays close to the reference level.

/// Maximum number of reference samples kept by either calibration strategy.
pub const MAX_CALIB_SAMPLES: usize = 10;

/// One raw measurement of the four photodiode channels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RgbcReading {
    /// Red channel count
    pub red: u16,
    /// Green channel count
    pub green: u16,
    /// Blue channel count
    pub blue: u16,
    /// Clear (unfiltered) channel count
    pub clear: u16,
}

/// A calibrated color triple, each channel clamped to 0-255.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb8 {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Rgb8 {
    /// The no-light result, returned whenever the clear channel reads zero.
    pub const BLACK: Self = Self {
        red: 0,
        green: 0,
        blue: 0,
    };
}

/// Per-channel scaling factors for one brightness bucket of a
/// [`CalibrationTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleCoefficients {
    /// Red channel factor
    pub red: f32,
    /// Green channel factor
    pub green: f32,
    /// Blue channel factor
    pub blue: f32,
    /// Clear channel factor, compared against the brightness ratio when
    /// selecting a bucket
    pub clear: f32,
}

impl ScaleCoefficients {
    /// The unscaled row assigned to the brightest (reference) sample.
    pub const IDENTITY: Self = Self {
        red: 1.0,
        green: 1.0,
        blue: 1.0,
        clear: 1.0,
    };
}

/// Reasons a calibration cannot be built from a sample batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Not enough samples were supplied
    TooFewSamples,
    /// A supplied sample cannot be used as a divisor (dark reference)
    DegenerateSample,
}

/// Multi-point calibration: reference samples sorted brightest-first plus a
/// parallel matrix of scaling rows.
///
/// Row 0 is always [`ScaleCoefficients::IDENTITY`]; row `i` holds
/// `reference_channel / sample_channel` for each channel, the ratio that
/// rescales a reading taken at that sample's brightness up to the reference
/// brightness.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTable {
    samples: [RgbcReading; MAX_CALIB_SAMPLES],
    coefficients: [ScaleCoefficients; MAX_CALIB_SAMPLES],
    len: usize,
}

impl CalibrationTable {
    /// Builds a table from a batch of white-reference samples.
    ///
    /// The input is truncated to [`MAX_CALIB_SAMPLES`], sorted descending by
    /// clear value (stable, capture order preserved among equal samples) and
    /// the coefficient rows are derived from the brightest sample.
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::TooFewSamples`] if `input` is empty
    /// * [`CalibrationError::DegenerateSample`] if any kept sample has a zero
    ///   clear value
    pub fn from_samples(input: &[RgbcReading]) -> Result<Self, CalibrationError> {
        if input.is_empty() {
            return Err(CalibrationError::TooFewSamples);
        }
        let len = input.len().min(MAX_CALIB_SAMPLES);
        if input[..len].iter().any(|sample| sample.clear == 0) {
            return Err(CalibrationError::DegenerateSample);
        }

        let mut samples = [RgbcReading::default(); MAX_CALIB_SAMPLES];
        samples[..len].copy_from_slice(&input[..len]);
        sort_by_clear_descending(&mut samples[..len]);

        let reference = samples[0];
        let mut coefficients = [ScaleCoefficients::IDENTITY; MAX_CALIB_SAMPLES];
        for i in 1..len {
            coefficients[i] = ScaleCoefficients {
                red: f32::from(reference.red) / f32::from(samples[i].red),
                green: f32::from(reference.green) / f32::from(samples[i].green),
                blue: f32::from(reference.blue) / f32::from(samples[i].blue),
                clear: f32::from(reference.clear) / f32::from(samples[i].clear),
            };
        }

        Ok(Self {
            samples,
            coefficients,
            len,
        })
    }

    /// The reference samples, brightest first.
    pub fn samples(&self) -> &[RgbcReading] {
        &self.samples[..self.len]
    }

    /// The scaling rows parallel to [`samples`](Self::samples).
    pub fn coefficients(&self) -> &[ScaleCoefficients] {
        &self.coefficients[..self.len]
    }

    /// Converts a raw reading into a 0-255 triple.
    ///
    /// A zero clear channel yields [`Rgb8::BLACK`]. Otherwise the bucket scan
    /// runs from the dimmest row toward row 0 and picks the first row whose
    /// clear coefficient the current brightness ratio exceeds, falling back
    /// to the reference row. The scan order and first-match precedence are
    /// load-bearing: a nearest-bucket match would change the output.
    pub fn convert(&self, raw: &RgbcReading) -> Rgb8 {
        if raw.clear == 0 {
            return Rgb8::BLACK;
        }

        let reference = self.samples[0];
        let clear_ratio = f32::from(reference.clear) / f32::from(raw.clear);

        let mut bucket = self.coefficients[0];
        for candidate in self.coefficients[1..self.len].iter().rev() {
            if clear_ratio > candidate.clear {
                bucket = *candidate;
                break;
            }
        }

        let red = f32::from(raw.red) * bucket.red;
        let green = f32::from(raw.green) * bucket.green;
        let blue = f32::from(raw.blue) * bucket.blue;

        Rgb8 {
            red: scale_to_255(red, reference.red),
            green: scale_to_255(green, reference.green),
            blue: scale_to_255(blue, reference.blue),
        }
    }
}

/// Single-point calibration: a fixed additive bias per color channel relative
/// to the achromatic average of the reference batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOffset {
    brightness_average: u32,
    channel_diff: [i32; 3],
}

impl CalibrationOffset {
    /// Builds the offset state from a batch of white-reference samples.
    ///
    /// Each color channel is averaged over the batch (integer division), the
    /// brightness average is the integer mean of those three averages, and
    /// each channel's diff is its average minus the brightness average. The
    /// clear channel is ignored.
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::TooFewSamples`] if `input` is empty
    /// * [`CalibrationError::DegenerateSample`] if the brightness average
    ///   comes out zero (dark reference)
    pub fn from_samples(input: &[RgbcReading]) -> Result<Self, CalibrationError> {
        if input.is_empty() {
            return Err(CalibrationError::TooFewSamples);
        }

        let mut sum_red: u32 = 0;
        let mut sum_green: u32 = 0;
        let mut sum_blue: u32 = 0;
        for sample in input {
            sum_red += u32::from(sample.red);
            sum_green += u32::from(sample.green);
            sum_blue += u32::from(sample.blue);
        }

        let count = input.len() as u32;
        let avg_red = sum_red / count;
        let avg_green = sum_green / count;
        let avg_blue = sum_blue / count;

        let brightness_average = (avg_red + avg_green + avg_blue) / 3;
        if brightness_average == 0 {
            return Err(CalibrationError::DegenerateSample);
        }

        let channel_diff = [
            avg_red as i32 - brightness_average as i32,
            avg_green as i32 - brightness_average as i32,
            avg_blue as i32 - brightness_average as i32,
        ];

        Ok(Self {
            brightness_average,
            channel_diff,
        })
    }

    /// The achromatic average the channel diffs are relative to.
    pub fn brightness_average(&self) -> u32 {
        self.brightness_average
    }

    /// Per-channel bias in red, green, blue order.
    pub fn channel_diff(&self) -> [i32; 3] {
        self.channel_diff
    }

    /// Converts a raw reading into a 0-255 triple.
    ///
    /// A zero clear channel yields [`Rgb8::BLACK`]. Otherwise each channel is
    /// bias-corrected, normalized against the brightness average and scaled
    /// to 255.
    pub fn convert(&self, raw: &RgbcReading) -> Rgb8 {
        if raw.clear == 0 {
            return Rgb8::BLACK;
        }

        let [diff_red, diff_green, diff_blue] = self.channel_diff;
        Rgb8 {
            red: self.normalize(i32::from(raw.red) - diff_red),
            green: self.normalize(i32::from(raw.green) - diff_green),
            blue: self.normalize(i32::from(raw.blue) - diff_blue),
        }
    }

    fn normalize(&self, corrected: i32) -> u8 {
        let scaled = corrected as f32 / self.brightness_average as f32 * 255.0;
        scaled.clamp(0.0, 255.0) as u8
    }
}

/// The calibration held by the driver, one of the two strategies.
///
/// The strategies keep different state and different accuracy/cost tradeoffs,
/// so they stay separate variants behind one conversion entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Calibration {
    /// Brightness-bucketed multiplicative scaling
    Table(CalibrationTable),
    /// Fixed additive bias correction
    Offset(CalibrationOffset),
}

impl Calibration {
    /// Converts a raw reading with whichever strategy is active.
    pub fn convert(&self, raw: &RgbcReading) -> Rgb8 {
        match self {
            Calibration::Table(table) => table.convert(raw),
            Calibration::Offset(offset) => offset.convert(raw),
        }
    }
}

// Truncating, saturating normalization against the reference sample's own
// channel magnitude.
fn scale_to_255(scaled: f32, reference: u16) -> u8 {
    (scaled / f32::from(reference) * 255.0).clamp(0.0, 255.0) as u8
}

// Stable in-place insertion sort, brightest first. Equal clear values keep
// their capture order.
fn sort_by_clear_descending(samples: &mut [RgbcReading]) {
    for i in 1..samples.len() {
        let mut j = i;
        while j > 0 && samples[j - 1].clear < samples[j].clear {
            samples.swap(j - 1, j);
            j -= 1;
        }
    }
}
