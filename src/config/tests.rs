// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use indoc::indoc;

use super::*;

const CONFIG: &str = indoc! {r#"
    [cleaning]
    smoothing_window = 7

    [sites.IRBENE]
    dpfu_max = [0.0387, 0.0264]
    gain_elevation = [-1.3e-5, 1.0e-3, 0.98]
    tcal = 3.0
    k = 1.0

    [sites.IRBENE16]
    dpfu_max = [0.0065]
    gain_elevation = [1.0]

    [cuts]
    cepa = [[0.2, 0.4], [0.9, 1.1]]

    [rest_frequencies]
    "CH3OH 6.7 GHz" = 6668519200.0
    "OH 6.035 GHz" = 6035092000.0
"#};

#[test]
fn test_parse_config() {
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.cleaning.smoothing_window, 7);

    let site = config.site("IRBENE").unwrap();
    assert_eq!(site.dpfu_max.len(), 2);
    assert_abs_diff_eq!(site.tcal, 3.0);

    // Defaults.
    let site = config.site("IRBENE16").unwrap();
    assert_abs_diff_eq!(site.k, 1.0);
    assert_abs_diff_eq!(site.tcal, 0.0);

    assert_eq!(config.cuts("cepa"), &[[0.2, 0.4], [0.9, 1.1]]);
    assert!(config.cuts("w3oh").is_empty());

    let table = config.rest_frequency_table().unwrap();
    assert_eq!(table.num_transitions(), 2);
}

#[test]
fn test_empty_config_has_defaults() {
    let config = PipelineConfig::from_toml_str("").unwrap();
    assert_eq!(config.cleaning.smoothing_window, DEFAULT_SMOOTHING_WINDOW);
    assert!(config.sites.is_empty());
    assert!(matches!(
        config.rest_frequency_table(),
        Err(ConfigError::NoRestFrequencies)
    ));
}

#[test]
fn test_site_lookup_is_case_insensitive() {
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
    assert!(config.site("irbene").is_ok());
    match config.site("BALDONE") {
        Err(ConfigError::UnknownSite { site, available }) => {
            assert_eq!(site, "BALDONE");
            assert_eq!(available, "IRBENE, IRBENE16");
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_empty_dpfu_is_rejected() {
    let result = PipelineConfig::from_toml_str(indoc! {r#"
        [sites.X]
        dpfu_max = []
        gain_elevation = [1.0]
    "#});
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let result = PipelineConfig::from_toml_str(indoc! {r#"
        [sites.X]
        dpfu_max = [-1.0]
        gain_elevation = [1.0]
    "#});
    assert!(matches!(result, Err(ConfigError::InvalidSite { .. })));

    let result = PipelineConfig::from_toml_str(indoc! {r#"
        [cuts]
        cepa = [[1.0, -1.0]]
    "#});
    assert!(matches!(result, Err(ConfigError::InvalidCut { .. })));

    let result = PipelineConfig::from_toml_str(indoc! {r#"
        [rest_frequencies]
        bad = 0.0
    "#});
    assert!(matches!(
        result,
        Err(ConfigError::InvalidRestFrequency { .. })
    ));

    let result = PipelineConfig::from_toml_str(indoc! {r#"
        [cleaning]
        smoothing_window = 0
    "#});
    assert!(matches!(result, Err(ConfigError::InvalidSmoothingWindow)));
}

#[test]
fn test_unknown_field_is_rejected() {
    let result = PipelineConfig::from_toml_str("[cleaning]\nwindow = 3\n");
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}
