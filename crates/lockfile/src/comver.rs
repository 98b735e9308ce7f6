use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::{num::ParseIntError, str::FromStr};

/// `major.minor` version of the lockfile format.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[display("{major}.{minor}")]
#[serde(try_from = "String", into = "String")]
pub struct ComVer {
    pub major: u16,
    pub minor: u16,
}

impl ComVer {
    pub const fn new(major: u16, minor: u16) -> Self {
        ComVer { major, minor }
    }
}

/// Error when parsing [`ComVer`] from a string.
#[derive(Debug, Display, Error)]
pub enum ParseComVerError {
    #[display("Dot is missing")]
    MissingDot,
    #[display("Major is not a valid number: {_0}")]
    InvalidMajor(ParseIntError),
    #[display("Minor is not a valid number: {_0}")]
    InvalidMinor(ParseIntError),
}

impl FromStr for ComVer {
    type Err = ParseComVerError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (major, minor) = value.split_once('.').ok_or(ParseComVerError::MissingDot)?;
        let major = major.parse::<u16>().map_err(ParseComVerError::InvalidMajor)?;
        let minor = minor.parse::<u16>().map_err(ParseComVerError::InvalidMinor)?;
        Ok(ComVer::new(major, minor))
    }
}

impl TryFrom<String> for ComVer {
    type Error = ParseComVerError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComVer> for String {
    fn from(value: ComVer) -> Self {
        value.to_string()
    }
}
