use froc_core::{CaseKey, RaterCaseKey};
use proptest::prelude::*;

fn case_keys() -> impl Strategy<Value = CaseKey> {
    (
        "[A-Za-z0-9_.-]{1,12}",
        "[0-9]{8}",
        "[A-Za-z][A-Za-z0-9]{1,15}",
        "[0-9]{1,4}",
    )
        .prop_map(|(patient, date, modality, series)| {
            CaseKey::new(patient, date, modality, series).unwrap()
        })
}

proptest! {
    #[test]
    fn case_key_parses_its_own_encoding(key in case_keys()) {
        let encoded = key.encode();
        prop_assert_eq!(CaseKey::parse(&encoded), Some(key));
    }

    #[test]
    fn rater_key_parses_its_own_encoding(
        key in case_keys(),
        rater in "[a-z][a-z0-9_]{0,10}",
        instance in prop::option::of(0u32..1000),
    ) {
        let rater_key = RaterCaseKey::new(rater, key.clone(), instance).unwrap();
        let encoded = rater_key.encode();
        let decoded = RaterCaseKey::parse(&encoded).unwrap();
        prop_assert_eq!(decoded.to_case_key(), key);
        prop_assert_eq!(decoded, rater_key);
    }

    #[test]
    fn case_path_is_not_a_rater_path(key in case_keys()) {
        prop_assert!(RaterCaseKey::parse(&key.encode()).is_none());
    }
}

#[test]
fn json_keys_use_the_path_form() {
    let key = CaseKey::new("P7", "20231231", "pt", "12").unwrap();
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, r#""P7/20231231_PT/SE12""#);
    let back: CaseKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}
