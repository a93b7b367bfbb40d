use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::geo::{Footprint, Unit};
use crate::ingest::Frame;
use crate::prelude::{ensure_shape, RadarResult};
use crate::processing::distance::DistanceField;

/// dBZ per raw count.
const SIGNAL_GAIN: f64 = 0.39216;
/// dBZ at a raw count of zero.
const SIGNAL_OFFSET: f64 = -8.6;
/// Marshall-Palmer `Z = a * R^b`.
const ZR_A: f64 = 300.0;
const ZR_B: f64 = 1.5;

/// How the distance field enters the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceCorrection {
    /// The field is computed and kept but not applied.
    #[default]
    Disabled,
    /// The field is added to the dBZ value before the Z conversion.
    Additive,
}

/// dBZ-like value of a raw count in `[0, 255]`.
pub fn dbz_from_signal(signal: f64) -> f64 {
    SIGNAL_GAIN * signal + SIGNAL_OFFSET
}

/// Reflectivity factor `Z = 10^(dBZ / 10)`. Never negative.
pub fn reflectivity(dbz: f64) -> f64 {
    10f64.powf(0.1 * dbz)
}

/// Rain rate in mm/h from `Z`. `Z >= 0` keeps the fractional power real.
pub fn rain_rate(z: f64) -> f64 {
    (z / ZR_A).powf(1.0 / ZR_B)
}

/// Converts raw reflectivity frames into precipitation-rate fields.
#[derive(Debug, Clone)]
pub struct SignalProcessor {
    distance_field: DistanceField,
    correction: DistanceCorrection,
}

impl SignalProcessor {
    pub fn new(footprint: &Footprint, correction: DistanceCorrection) -> Self {
        Self {
            distance_field: DistanceField::compute(&footprint.grid(Unit::Kilometers)),
            correction,
        }
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.distance_field
    }

    pub fn correction(&self) -> DistanceCorrection {
        self.correction
    }

    /// Rain rate wherever `mask` holds, zero elsewhere.
    ///
    /// The mask is applied as a 0/1 multiplier, so non-finite rates stay
    /// non-finite even under a false mask. NaN and infinities are not clamped.
    pub fn process(
        &self,
        signal: ArrayView2<f64>,
        mask: ArrayView2<bool>,
    ) -> RadarResult<Array2<f64>> {
        ensure_shape(signal.dim(), mask.dim())?;
        let weight = |valid: bool| if valid { 1.0 } else { 0.0 };

        let rates = match self.correction {
            DistanceCorrection::Disabled => Zip::from(&signal)
                .and(&mask)
                .map_collect(|&s, &m| rain_rate(reflectivity(dbz_from_signal(s))) * weight(m)),
            DistanceCorrection::Additive => {
                let distance = self.distance_field.values();
                ensure_shape(distance.dim(), signal.dim())?;
                Zip::from(&signal)
                    .and(&mask)
                    .and(&distance)
                    .map_collect(|&s, &m, &d| {
                        rain_rate(reflectivity(dbz_from_signal(s) + d)) * weight(m)
                    })
            }
        };
        Ok(rates)
    }

    pub fn process_frame(&self, frame: &Frame) -> RadarResult<Array2<f64>> {
        let signal = frame.signal.mapv(f64::from);
        self.process(signal.view(), frame.mask.view())
    }
}
