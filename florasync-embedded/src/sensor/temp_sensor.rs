use alloc::vec::Vec;

use embedded_io::Read;

use crate::error::Error;

/// Soil temperatures outside this window are treated as a probe fault.
pub const PLAUSIBLE_RANGE_C: (f32, f32) = (-50.0, 120.0);

/// One-wire digital soil probe. The device answers with its 16-bit raw
/// register, low byte first, in sixteenths of a degree Celsius.
pub struct TempSensor<IO>
where
    IO: Read,
{
    io_device: IO,
    buffer: Vec<u8>,
}

impl<IO> TempSensor<IO>
where
    IO: Read,
{
    pub fn new(io_device: IO) -> Self {
        Self {
            io_device,
            buffer: Vec::with_capacity(4),
        }
    }

    pub fn read_celsius(&mut self) -> Result<f32, Error> {
        self.buffer.clear();
        self.buffer.resize(4, 0);

        let read_count = self
            .io_device
            .read(&mut self.buffer)
            .map_err(|_| Error::DeviceNotFound)?;

        if read_count < 2 {
            return Err(Error::DeviceNotFound);
        }

        let raw_value = i16::from_le_bytes([self.buffer[0], self.buffer[1]]);
        let celsius = raw_value as f32 / 16.0;

        if !(PLAUSIBLE_RANGE_C.0..=PLAUSIBLE_RANGE_C.1).contains(&celsius) {
            return Err(Error::SensorReadingOutOfRange);
        }

        Ok(celsius)
    }
}
