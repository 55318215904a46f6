// ABOUTME: Existence and attribute checks run against an applied state
// ABOUTME: Resolves a state entry to a key id and compares it with the directory record

use keyprobe_api::{KeyDirectory, KeyId, KeyRecord};
use tracing::debug;

use crate::error::VerifyError;
use crate::state::State;

/// Verify that the key recorded at `address` exists in the directory.
///
/// The entry's id must be numeric, the directory must return a record for
/// it, and that record must carry the same id. On success the record is
/// copied into `key`. A single directory call is made, with no retry and no
/// deadline beyond the client's own.
pub async fn check_key_exists<D>(
    state: &State,
    address: &str,
    directory: &D,
    key: &mut KeyRecord,
) -> Result<(), VerifyError>
where
    D: KeyDirectory + ?Sized,
{
    let resource = state
        .get(address)
        .ok_or_else(|| VerifyError::NotFound(address.to_string()))?;

    if resource.id.is_empty() {
        return Err(VerifyError::MissingIdentifier(address.to_string()));
    }

    let id: KeyId = resource
        .id
        .parse()
        .map_err(|source| VerifyError::ParseFailure {
            address: address.to_string(),
            id: resource.id.clone(),
            source,
        })?;

    let found = directory
        .get_by_id(id)
        .await
        .map_err(VerifyError::ExternalCall)?;

    if found.id != id {
        return Err(VerifyError::RecordMismatch {
            expected: id,
            actual: found.id,
        });
    }

    debug!(address, id, "ssh key exists");
    *key = found;
    Ok(())
}

/// Verify that `attribute` of the entry at `address` equals `expected` exactly.
pub fn check_attribute(
    state: &State,
    address: &str,
    attribute: &str,
    expected: &str,
) -> Result<(), VerifyError> {
    let resource = state
        .get(address)
        .ok_or_else(|| VerifyError::NotFound(address.to_string()))?;

    let actual = resource
        .attribute(attribute)
        .ok_or_else(|| VerifyError::MissingAttribute {
            address: address.to_string(),
            attribute: attribute.to_string(),
        })?;

    if actual != expected {
        return Err(VerifyError::AttributeMismatch {
            address: address.to_string(),
            attribute: attribute.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
