mod build_settings;
mod error;
mod install;
mod representation;
mod vendor_lock;

pub use build_settings::{load_build_settings, LoadBuildSettingsError};
pub use error::InstallError;
pub use install::{Install, InstallReport, InstallState};
pub use representation::{InstallerRepresentation, PostInstallHook};
pub use vendor_lock::{VendorLock, VendorLockError};
