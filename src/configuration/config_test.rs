use anyhow::Result;

use super::Config;
use super::ConfigKey;
use super::CONFIG_WRITE_LOCK;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let _guard = CONFIG_WRITE_LOCK.lock().unwrap();

    let matches =
        cli::build().try_get_matches_from(vec!["autoforge", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let _guard = CONFIG_WRITE_LOCK.lock().unwrap();

    let matches =
        cli::build().try_get_matches_from(vec!["autoforge", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}

#[test]
fn it_falls_back_to_defaults_for_bad_numbers() {
    let _guard = CONFIG_WRITE_LOCK.lock().unwrap();

    Config::set(ConfigKey::InstallTimeout, "not-a-number");
    assert_eq!(Config::get_u64(ConfigKey::InstallTimeout), 600);
    Config::set(ConfigKey::InstallTimeout, "600");
}
