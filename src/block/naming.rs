//! Block file naming
//!
//! `{block_id}+{tenant_id}`. The hyphenated UUID never contains `+`, so the
//! first `+` always separates the two parts.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{BlockError, Result};

const SEPARATOR: char = '+';

/// Reject tenant ids that cannot be embedded in a single file name
pub fn validate_tenant(tenant_id: &str) -> Result<()> {
    let bad = tenant_id.is_empty()
        || tenant_id == "."
        || tenant_id == ".."
        || tenant_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(BlockError::InvalidTenant(tenant_id.to_string()));
    }
    Ok(())
}

/// File name of the block
pub fn block_file_name(block_id: Uuid, tenant_id: &str) -> Result<String> {
    validate_tenant(tenant_id)?;
    Ok(format!("{}{}{}", block_id.hyphenated(), SEPARATOR, tenant_id))
}

/// Full path of the block under `dir`
pub fn block_path(dir: &Path, block_id: Uuid, tenant_id: &str) -> Result<PathBuf> {
    Ok(dir.join(block_file_name(block_id, tenant_id)?))
}

/// Split a block file name back into `(block_id, tenant_id)`
/// "6f1c...-...+tenant-a" → (uuid, "tenant-a")
pub fn parse_block_file_name(name: &str) -> Result<(Uuid, String)> {
    let invalid = || BlockError::InvalidFileName(name.to_string());

    let (id, tenant) = name.split_once(SEPARATOR).ok_or_else(invalid)?;
    let block_id = Uuid::try_parse(id).map_err(|_| invalid())?;
    validate_tenant(tenant).map_err(|_| invalid())?;

    Ok((block_id, tenant.to_string()))
}
