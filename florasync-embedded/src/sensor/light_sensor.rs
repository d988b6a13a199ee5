use alloc::vec::Vec;

use embedded_io::Read;

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub struct LightSensorCalibration {
    /// Datasheet counts-per-lux divisor for the high-resolution mode.
    pub measurement_factor: f32,
    /// Readings above this are treated as a sensor fault.
    pub max_lux: f32,
}

impl Default for LightSensorCalibration {
    fn default() -> Self {
        Self {
            measurement_factor: 1.2, // BH1750 high-res mode
            max_lux: 100000.0,
        }
    }
}

/// I2C ambient light sensor. The device answers its 16-bit result
/// register, high byte first.
pub struct LightSensor<IO>
where
    IO: Read,
{
    io_device: IO,
    buffer: Vec<u8>,
    calibration: LightSensorCalibration,
}

impl<IO> LightSensor<IO>
where
    IO: Read,
{
    pub fn new(io_device: IO) -> Self {
        Self {
            io_device,
            buffer: Vec::with_capacity(4),
            calibration: LightSensorCalibration::default(),
        }
    }

    pub fn with_calibration(io_device: IO, calibration: LightSensorCalibration) -> Self {
        Self {
            io_device,
            buffer: Vec::with_capacity(4),
            calibration,
        }
    }

    pub fn read_lux(&mut self) -> Result<f32, Error> {
        self.buffer.clear();
        self.buffer.resize(4, 0);

        let read_count = self
            .io_device
            .read(&mut self.buffer)
            .map_err(|_| Error::DeviceNotFound)?;

        if read_count < 2 {
            return Err(Error::DeviceNotFound);
        }

        let raw_value = u16::from_be_bytes([self.buffer[0], self.buffer[1]]);
        let lux = raw_value as f32 / self.calibration.measurement_factor;

        if !(0.0..=self.calibration.max_lux).contains(&lux) {
            return Err(Error::SensorReadingOutOfRange);
        }

        Ok(lux)
    }
}
