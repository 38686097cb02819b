use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("City '{city_id}' not found")]
    CityNotFound { city_id: String },

    #[error("Invalid time: hour {hour}, day {day}, year {year}")]
    InvalidTime { hour: u32, day: u32, year: u32 },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Engine is stopped")]
    EngineStopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
