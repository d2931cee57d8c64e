#![no_main]

use libfuzzer_sys::fuzz_target;
use sitewire_core::SiteConfig;

fuzz_target!(|data: &str| {
    // Accepted configs stay valid after a serialize/parse cycle.
    if let Ok(config) = SiteConfig::from_json(data) {
        assert!(config.validate().is_ok());
        let json = serde_json::to_string(&config).expect("config serializes");
        let again = SiteConfig::from_json(&json).expect("serialized config parses");
        assert_eq!(again.selectors, config.selectors);
        assert_eq!(again.classes, config.classes);
    }
});
