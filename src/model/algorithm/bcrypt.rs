use serde::{Deserialize, Serialize};
use crate::utils::errors::PavilionError;

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum BCryptVersion {
    TwoA,
    TwoB,
    TwoX,
    TwoY
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BCryptPolicy {
    pub version: BCryptVersion,
    pub cost: u32
}

pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, PavilionError> {
    bcrypt::verify(plain_text_password, phc).map_err(PavilionError::from)
}

impl Default for BCryptPolicy {
    fn default() -> Self {
        Self {
            version: BCryptVersion::TwoB,
            cost: bcrypt::DEFAULT_COST
        }
    }
}

impl BCryptPolicy {
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, PavilionError> {
        let hashed = bcrypt::hash_with_result(plain_text_password, self.cost)?;
        Ok(hashed.format_for_version(self.version.into()))
    }
}

impl From<BCryptVersion> for bcrypt::Version {
    fn from(version: BCryptVersion) -> Self {
        match version {
            BCryptVersion::TwoA => bcrypt::Version::TwoA,
            BCryptVersion::TwoB => bcrypt::Version::TwoB,
            BCryptVersion::TwoX => bcrypt::Version::TwoX,
            BCryptVersion::TwoY => bcrypt::Version::TwoY,
        }
    }
}
