//! Config load validation tests for orgvault-config.
// crates/orgvault-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use orgvault_config::ConfigError;
use orgvault_config::OrgVaultConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<OrgVaultConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(OrgVaultConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(OrgVaultConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(OrgVaultConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(OrgVaultConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_out_of_range_cache_bound() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = "[storage]\ndata_dir = \"data\"\n[storage.cache]\nmax_open = 0\n";
    file.write_all(payload.as_bytes()).map_err(|err| err.to_string())?;
    assert_invalid(OrgVaultConfig::load(Some(file.path())), "max_open")?;
    Ok(())
}

#[test]
fn load_without_path_yields_validated_defaults() -> TestResult {
    let config = OrgVaultConfig::load(None).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.storage.cache.max_open == 0 {
        return Err("default cache bound must be non-zero".to_string());
    }
    Ok(())
}

#[test]
fn load_accepts_full_document() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = "[storage]\n\
                   data_dir = \"/var/lib/orgvault\"\n\
                   busy_timeout_ms = 2500\n\
                   journal_mode = \"wal\"\n\
                   sync_mode = \"normal\"\n\
                   [storage.cache]\n\
                   max_open = 8\n\
                   idle_timeout_ms = 60000\n\
                   [backup]\n\
                   backup_dir = \"/var/lib/orgvault/backups\"\n\
                   blob_root = \"/var/lib/orgvault/blobs\"\n";
    file.write_all(payload.as_bytes()).map_err(|err| err.to_string())?;
    let config = OrgVaultConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.storage.cache.max_open != 8 {
        return Err("cache bound not loaded".to_string());
    }
    if config.backup.blob_root.is_none() {
        return Err("blob root not loaded".to_string());
    }
    Ok(())
}
