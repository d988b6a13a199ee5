mod analog;
mod ec;
mod light_sensor;
mod temp_sensor;

pub use analog::{AdcCalibration, AnalogChannel};
pub use ec::{EcCalibration, EcReading, SPAN_EPSILON};
pub use light_sensor::{LightSensor, LightSensorCalibration};
pub use temp_sensor::{PLAUSIBLE_RANGE_C, TempSensor};

use embedded_io::Read;
use florasync_api::message::{LIGHT_ERROR_LUX, SensorReading, TEMP_ERROR_C};

/// One full sampling pass: the publishable reading plus the EC
/// computation kept for the cycle log.
#[derive(Debug, Clone)]
pub struct Sample {
    pub reading: SensorReading,
    pub ec: EcReading,
}

/// Seam between the duty-cycle controller and the physical channels.
pub trait SampleSource {
    fn sample(&mut self) -> Sample;
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = libm::powf(10.0, decimals as f32);
    libm::roundf(value * factor) / factor
}

/// All five channels of a sensor node. A faulty channel degrades to its
/// reserved sentinel; sampling itself never fails a cycle.
pub struct SensorBank<TI, LI, MI, UI, EI>
where
    TI: Read,
    LI: Read,
    MI: Read,
    UI: Read,
    EI: Read,
{
    temp: TempSensor<TI>,
    light: LightSensor<LI>,
    moisture: AnalogChannel<MI>,
    uv: AnalogChannel<UI>,
    ec_probe: AnalogChannel<EI>,
    ec_calibration: EcCalibration,
}

impl<TI, LI, MI, UI, EI> SensorBank<TI, LI, MI, UI, EI>
where
    TI: Read,
    LI: Read,
    MI: Read,
    UI: Read,
    EI: Read,
{
    pub fn new(
        temp: TempSensor<TI>,
        light: LightSensor<LI>,
        moisture: AnalogChannel<MI>,
        uv: AnalogChannel<UI>,
        ec_probe: AnalogChannel<EI>,
        ec_calibration: EcCalibration,
    ) -> Self {
        Self {
            temp,
            light,
            moisture,
            uv,
            ec_probe,
            ec_calibration,
        }
    }
}

impl<TI, LI, MI, UI, EI> SampleSource for SensorBank<TI, LI, MI, UI, EI>
where
    TI: Read,
    LI: Read,
    MI: Read,
    UI: Read,
    EI: Read,
{
    fn sample(&mut self) -> Sample {
        let temperature = match self.temp.read_celsius() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("soil temperature read failed: {e}");
                TEMP_ERROR_C
            }
        };

        let light = match self.light.read_lux() {
            Ok(lux) => lux,
            Err(e) => {
                log::warn!("light read failed: {e}");
                LIGHT_ERROR_LUX
            }
        };

        let moisture_raw = match self.moisture.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("moisture read failed: {e}");
                0
            }
        };

        let uv_voltage = match self.uv.read_voltage() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("uv read failed: {e}");
                0.0
            }
        };

        let ec_voltage = match self.ec_probe.read_voltage() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("ec read failed: {e}");
                0.0
            }
        };

        let ec = self.ec_calibration.measure(ec_voltage, temperature);
        if !ec.temperature_compensated {
            log::warn!("using uncompensated EC, soil temperature unavailable");
        }

        Sample {
            reading: SensorReading {
                temp_soil_c: round_to(temperature, 1),
                moisture_raw,
                light_lux: libm::roundf(light.max(LIGHT_ERROR_LUX)),
                uv_voltage: round_to(uv_voltage, 2),
                ec_voltage: round_to(ec_voltage, 3),
            },
            ec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::analog::mock::MockIO as AnalogMockIO;
    use super::light_sensor::mock::MockIO as LightMockIO;
    use super::temp_sensor::mock::MockIO as TempMockIO;
    use super::*;

    type TestBank =
        SensorBank<TempMockIO, LightMockIO, AnalogMockIO, AnalogMockIO, AnalogMockIO>;

    fn bank(temp: TempMockIO, light: LightMockIO, ec_counts: u16) -> TestBank {
        SensorBank::new(
            TempSensor::new(temp),
            LightSensor::new(light),
            AnalogChannel::new(AnalogMockIO::constant(1800)),
            AnalogChannel::new(AnalogMockIO::constant(880)),
            AnalogChannel::new(AnalogMockIO::constant(ec_counts)),
            EcCalibration::default(),
        )
    }

    #[test]
    fn healthy_channels_produce_rounded_reading() {
        // 340 sixteenths = 21.25 C; 648 counts = 540 lux; 1241 counts ~ 1.0 V.
        let mut bank = bank(
            TempMockIO { value: 340, disconnected: false },
            LightMockIO { value: 648, disconnected: false },
            1241,
        );

        let sample = bank.sample();
        assert_eq!(sample.reading.temp_soil_c, 21.3);
        assert_eq!(sample.reading.light_lux, 540.0);
        assert_eq!(sample.reading.moisture_raw, 1800);
        assert!((sample.reading.ec_voltage - 1.0).abs() < 0.005);
        assert!(sample.ec.temperature_compensated);
        assert!(sample.ec.compensated > 0.0);
    }

    #[test]
    fn faulty_temperature_degrades_to_sentinel_and_uncompensated_ec() {
        let mut bank = bank(
            TempMockIO { value: 0, disconnected: true },
            LightMockIO { value: 648, disconnected: false },
            1241,
        );

        let sample = bank.sample();
        assert_eq!(sample.reading.temp_soil_c, TEMP_ERROR_C);
        assert!(!sample.ec.temperature_compensated);
        assert_eq!(sample.ec.compensated, sample.ec.raw);
        // The rest of the reading is still published.
        assert_eq!(sample.reading.light_lux, 540.0);
    }

    #[test]
    fn faulty_light_degrades_to_sentinel_only() {
        let mut bank = bank(
            TempMockIO { value: 340, disconnected: false },
            LightMockIO { value: 0, disconnected: true },
            1241,
        );

        let sample = bank.sample();
        assert_eq!(sample.reading.light_lux, LIGHT_ERROR_LUX);
        assert_eq!(sample.reading.temp_soil_c, 21.3);
    }
}
