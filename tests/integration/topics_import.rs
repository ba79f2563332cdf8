//! Topic import and provider profile round trips.

use briefsmith::import;
use briefsmith::provider::profile::{self, ProviderConfig, ProviderType};
use briefsmith::provider::CompletionOptions;
use tempfile::TempDir;

use crate::integration::with_xdg_env;

#[test]
fn topic_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("topics.csv");
    std::fs::write(
        &file,
        "title,cluster\nWinter Tyres,winter\n\"Wheels, Rims and Hubs\",parts\n# draft\nWinter Tyres\n",
    )
    .unwrap();

    let topics = import::load_topics(&file).unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].id.as_str(), "winter-tyres");
    assert_eq!(topics[1].title, "Wheels, Rims and Hubs");
}

#[test]
fn empty_topic_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("topics.csv");
    std::fs::write(&file, "# only a comment\n").unwrap();
    assert!(import::load_topics(&file).is_err());
}

#[test]
fn provider_profile_save_load_list() {
    let dir = TempDir::new().unwrap();
    with_xdg_env(&dir, || {
        let config = ProviderConfig {
            provider_name: None,
            provider_type: ProviderType::LocalCustom,
            model: "llama3".to_string(),
            api_key: None,
            endpoint: Some("http://localhost:11434/v1".to_string()),
            default_options: CompletionOptions::default(),
        };
        profile::save_profile("local-llama", &config).unwrap();

        let names = profile::list_profiles().unwrap();
        assert_eq!(names, vec!["local-llama"]);

        let loaded = profile::load_profile("local-llama").unwrap();
        assert_eq!(loaded.provider_name.as_deref(), Some("local-llama"));
        assert_eq!(loaded.model, "llama3");
        assert!(loaded.validate().is_ok());
        assert!(loaded.create_client("local-llama").is_ok());
    });
}

#[test]
fn missing_profile_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    with_xdg_env(&dir, || {
        let err = profile::load_profile("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    });
}
