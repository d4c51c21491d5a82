use crm_local_sheets::frequency::{FrequencyCodec, FrequencyError, FrequencyUnit, ResolvedFrequency};
use crm_local_sheets::settings::ImportSettings;
use pretty_assertions::assert_eq;

fn codec() -> FrequencyCodec {
    FrequencyCodec::new(&ImportSettings::default())
}

#[test]
fn catalog_keys_resolve_to_themselves() {
    let resolved = codec()
        .resolve("trimestrielle", None, None)
        .expect("catalog key");

    assert_eq!(
        resolved,
        ResolvedFrequency {
            token: "trimestrielle".into(),
            interval: 3,
            unit: FrequencyUnit::Months,
        }
    );
    assert_eq!(codec().label_of("trimestrielle", None, None), "Trimestrielle");
    assert_eq!(FrequencyCodec::catalog().len(), 7);
}

#[test]
fn catalog_labels_ignore_interval_and_unit_hints() {
    let codec = codec();
    for preset in FrequencyCodec::catalog() {
        assert_eq!(
            codec.label_of(preset.key, Some(6), Some(FrequencyUnit::Months)),
            preset.label
        );
        assert_eq!(
            codec.label_of(preset.key, Some(9), Some(FrequencyUnit::Years)),
            preset.label
        );
    }
    assert_eq!(
        codec.label_of("annuelle", Some(6), Some(FrequencyUnit::Months)),
        "Annuelle"
    );
}

#[test]
fn custom_selection_builds_a_self_describing_token() {
    let resolved = codec()
        .resolve("custom", Some("18"), Some("mois"))
        .expect("custom frequency");

    assert_eq!(resolved.token, "interval:months:18");
    assert_eq!(FrequencyCodec::encode_custom(2, FrequencyUnit::Years), "interval:years:2");
    assert_eq!(
        codec().parse("interval:months:18"),
        (Some(18), Some(FrequencyUnit::Months))
    );
    assert_eq!(codec().label_of(&resolved.token, None, None), "Tous les 18 mois");
}

#[test]
fn custom_selection_aliases_are_accepted() {
    let resolved = codec()
        .resolve("Personnalisé", Some("2"), Some("ans"))
        .expect("aliased custom selection");

    assert_eq!(resolved.token, "interval:years:2");
    assert_eq!(codec().label_of(&resolved.token, None, None), "Tous les 2 ans");
}

#[test]
fn single_unit_labels_drop_the_count() {
    assert_eq!(
        codec().label_of("interval:years:1", None, None),
        "Tous les ans"
    );
    assert_eq!(
        codec().label_of("interval:months:1", None, None),
        "Tous les mois"
    );
}

#[test]
fn custom_validation_checks_unit_before_interval() {
    assert_eq!(
        codec().resolve("custom", None, None),
        Err(FrequencyError::MissingUnit)
    );
    assert_eq!(
        codec().resolve("custom", Some("3"), Some("weeks")),
        Err(FrequencyError::UnknownUnit("weeks".into()))
    );
    assert_eq!(
        codec().resolve("custom", None, Some("months")),
        Err(FrequencyError::MissingInterval)
    );
    assert_eq!(
        codec().resolve("custom", Some("deux"), Some("months")),
        Err(FrequencyError::NotAnInteger("deux".into()))
    );
    assert_eq!(
        codec().resolve("custom", Some("0"), Some("months")),
        Err(FrequencyError::OutOfRange { value: 0, max: 120 })
    );
    assert_eq!(
        codec().resolve("custom", Some("121"), Some("months")),
        Err(FrequencyError::OutOfRange { value: 121, max: 120 })
    );
    assert!(codec().resolve("custom", Some("120"), Some("months")).is_ok());
}

#[test]
fn interval_ceiling_comes_from_settings() {
    let settings = ImportSettings {
        max_custom_interval: 24,
        ..ImportSettings::default()
    };
    let error = FrequencyCodec::new(&settings)
        .resolve("custom", Some("36"), Some("months"))
        .expect_err("above the configured ceiling");

    assert_eq!(error.to_string(), "interval 36 is out of range (1-24)");
}

#[test]
fn unknown_selection_is_rejected() {
    assert_eq!(
        codec().resolve("hebdomadaire", None, None),
        Err(FrequencyError::UnknownSelection("hebdomadaire".into()))
    );
}

#[test]
fn parse_ignores_anything_that_is_not_a_custom_token() {
    assert_eq!(codec().parse("annuelle"), (None, None));
    assert_eq!(codec().parse("interval:weeks:3"), (None, None));
    assert_eq!(codec().parse("interval:months:0"), (None, None));
    assert_eq!(codec().parse("interval:months:3:extra"), (None, None));
    assert_eq!(codec().parse("interval:months:007"), (None, None));
    assert_eq!(codec().parse("interval:months:+7"), (None, None));
    assert_eq!(codec().parse("interval:months:"), (None, None));
    assert_eq!(codec().parse("interval:years:500"), (None, None));
    assert_eq!(codec().parse("interval:years:120"), (Some(120), Some(FrequencyUnit::Years)));
}

#[test]
fn parsed_tokens_re_encode_to_the_same_string() {
    for token in ["interval:months:7", "interval:years:1", "interval:months:120"] {
        let (Some(interval), Some(unit)) = codec().parse(token) else {
            panic!("{token} should parse");
        };
        assert_eq!(FrequencyCodec::encode_custom(interval, unit), token);
    }
}

#[test]
fn parse_ceiling_follows_settings() {
    let settings = ImportSettings {
        max_custom_interval: 24,
        ..ImportSettings::default()
    };
    let codec = FrequencyCodec::new(&settings);

    assert_eq!(codec.parse("interval:months:24"), (Some(24), Some(FrequencyUnit::Months)));
    assert_eq!(codec.parse("interval:months:36"), (None, None));
    assert_eq!(codec.label_of("interval:months:36", None, None), "interval:months:36");
}

#[test]
fn label_falls_back_to_hints_then_to_the_token() {
    assert_eq!(
        codec().label_of("legacy", Some(4), Some(FrequencyUnit::Months)),
        "Tous les 4 mois"
    );
    assert_eq!(
        codec().label_of("interval:years:3", Some(6), Some(FrequencyUnit::Months)),
        "Tous les 3 ans"
    );
    assert_eq!(codec().label_of(" legacy ", None, None), "legacy");
}

#[test]
fn sheet_cells_accept_labels_tokens_and_bare_hints() {
    let codec = codec();

    let by_label = codec
        .interpret(Some("Semestrielle"), None, None)
        .expect("catalog label");
    assert_eq!(by_label.map(|frequency| frequency.token), Some("semestrielle".into()));

    let by_token = codec
        .interpret(Some("interval:months:9"), None, None)
        .expect("custom token");
    assert_eq!(by_token.map(|frequency| frequency.interval), Some(9));

    let by_hints = codec
        .interpret(None, Some("5"), Some("years"))
        .expect("blank selection with hints");
    assert_eq!(
        by_hints.map(|frequency| frequency.token),
        Some("interval:years:5".into())
    );

    assert_eq!(codec.interpret(None, None, None), Ok(None));
    assert_eq!(codec.interpret(Some("  "), None, None), Ok(None));
}
