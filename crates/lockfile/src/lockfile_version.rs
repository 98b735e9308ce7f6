use crate::ComVer;
use derive_more::{AsRef, Deref, Display, Error, Into};
use serde::{Deserialize, Serialize};

/// Wrapper that checks compatibility of `LOCKFILE VERSION` against `MAJOR`.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, AsRef, Deref, Into, Deserialize, Serialize,
)]
#[serde(try_from = "ComVer", into = "ComVer")]
pub struct LockfileVersion<const MAJOR: u16>(ComVer);

impl<const MAJOR: u16> LockfileVersion<MAJOR> {
    /// The version written by this build: `MAJOR.0`.
    pub const CURRENT: Self = LockfileVersion(ComVer::new(MAJOR, 0));

    /// Check if `comver` is compatible with `MAJOR`.
    pub const fn is_compatible(comver: ComVer) -> bool {
        comver.major == MAJOR
    }
}

impl<const MAJOR: u16> Default for LockfileVersion<MAJOR> {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Error when [`ComVer`] fails compatibility check.
#[derive(Debug, Display, Error)]
pub enum LockfileVersionError<const MAJOR: u16> {
    #[display("The LOCKFILE VERSION of {_0} is incompatible with {MAJOR}.x")]
    IncompatibleMajor(#[error(not(source))] ComVer),
}

impl<const MAJOR: u16> TryFrom<ComVer> for LockfileVersion<MAJOR> {
    type Error = LockfileVersionError<MAJOR>;
    fn try_from(comver: ComVer) -> Result<Self, Self::Error> {
        Self::is_compatible(comver)
            .then_some(Self(comver))
            .ok_or(Self::Error::IncompatibleMajor(comver))
    }
}
