#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Not enough bytes")]
    NotEnoughData { actual: usize, minimum: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid decode config: {0}")]
    InvalidConfig(String),

    #[error("Unknown log family: {0}")]
    UnknownFamily(String),
}

pub type Result<T> = std::result::Result<T, Error>;
