use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    DeviceNotFound,
    NotConnected,
    NetworkError,
    ActuationFault,
    SerializationError,
    SensorReadingOutOfRange,
    InitializationError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceNotFound => write!(f, "Device not found"),
            Error::NotConnected => write!(f, "Not connected"),
            Error::NetworkError => write!(f, "Network error"),
            Error::ActuationFault => write!(f, "Actuation output fault"),
            Error::SerializationError => write!(f, "Serialization error"),
            Error::SensorReadingOutOfRange => write!(f, "Sensor reading out of valid range"),
            Error::InitializationError => write!(f, "Initialization error"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
