use std::collections::BTreeMap;

use fraud_prevention::crypto::{derive_key, CipherMode};
use fraud_prevention::{EncryptedFieldObject, Field, FieldCodec, PiiConfig, PiiError};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const SECRET: &str = "integration-secret";
const IV: &str = "integration-offset";

fn codec(mode: CipherMode) -> FieldCodec {
    let mut cfg = PiiConfig::with_secrets(SECRET, IV);
    cfg.cipher_mode = mode;
    FieldCodec::from_config(&cfg).unwrap()
}

/// Arbitrary JSON, including finite floats across the whole `f64` range.
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| json!(f)),
        ".{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// A submitted object plus a schema declaring each of its slugs, public or not.
fn submission() -> impl Strategy<Value = (Value, Vec<Field>)> {
    prop::collection::btree_map("[a-z_]{1,12}", (any::<bool>(), json_value()), 0..10).prop_map(
        |entries: BTreeMap<String, (bool, Value)>| {
            let mut obj = Map::new();
            let mut fields = Vec::new();
            for (slug, (public, value)) in entries {
                let field = Field::text(slug.clone());
                fields.push(if public { field.into_public() } else { field });
                obj.insert(slug, value);
            }
            (Value::Object(obj), fields)
        },
    )
}

proptest! {
    #[test]
    fn round_trip_restores_object(
        (input, fields) in submission(),
        entity in "[a-z0-9-]{1,16}",
        randomized in any::<bool>(),
    ) {
        let mode = if randomized { CipherMode::Randomized } else { CipherMode::Deterministic };
        let codec = codec(mode);
        let key = codec.key_for(Some(entity.as_str())).unwrap();

        let sealed = codec.encrypt_field_object(&input, &fields, &key).unwrap();
        let opened = codec.decrypt_field_object(&sealed, &key).unwrap();
        prop_assert_eq!(Value::Object(opened), input);
    }

    #[test]
    fn public_part_holds_exactly_public_fields((input, fields) in submission()) {
        let codec = codec(CipherMode::Deterministic);
        let key = codec.key_for(None).unwrap();
        let sealed = codec.encrypt_field_object(&input, &fields, &key).unwrap();

        let public_slugs: Vec<&str> =
            fields.iter().filter(|f| f.public).map(|f| f.slug.as_str()).collect();
        let public = sealed.public.clone().unwrap_or_default();
        prop_assert_eq!(public.len(), public_slugs.len());
        for slug in &public_slugs {
            prop_assert_eq!(public.get(*slug), input.get(*slug));
        }
        prop_assert_eq!(sealed.encrypted.is_some(), fields.iter().any(|f| !f.public));
    }

    #[test]
    fn deterministic_output_is_stable((input, fields) in submission()) {
        let codec = codec(CipherMode::Deterministic);
        let key = codec.key_for(Some("org-1")).unwrap();
        let a = codec.encrypt_field_object(&input, &fields, &key).unwrap();
        let b = codec.encrypt_field_object(&input, &fields, &key).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn key_derivation_is_stable(salt in ".{0,32}") {
        let a = derive_key(SECRET, Some(salt.as_str())).unwrap();
        let b = derive_key(SECRET, Some(salt.as_str())).unwrap();
        prop_assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn undeclared_slug_is_rejected((input, fields) in submission(), extra in "[A-Z]{1,8}") {
        let codec = codec(CipherMode::Deterministic);
        let key = codec.key_for(None).unwrap();
        let mut input = input;
        input.as_object_mut().unwrap().insert(extra.clone(), json!("x"));

        let err = codec.encrypt_field_object(&input, &fields, &key).unwrap_err();
        let expected = format!("slug \"{extra}\" not found in field definition");
        prop_assert!(matches!(err, PiiError::SchemaMismatch(ref m) if *m == expected));
    }
}

#[test]
fn deterministic_ciphertext_readable_after_switching_to_randomized() {
    let fields = vec![Field::text("ssn")];
    let input = json!({"ssn": "123-45-6789"});

    let old = codec(CipherMode::Deterministic);
    let key = old.key_for(Some("user-7")).unwrap();
    let sealed = old.encrypt_field_object(&input, &fields, &key).unwrap();
    assert!(sealed.encrypted.as_deref().unwrap().starts_with("d1."));

    let new = codec(CipherMode::Randomized);
    let opened = new.decrypt_field_object(&sealed, &key).unwrap();
    assert_eq!(Value::Object(opened), input);

    let resealed = new.encrypt_field_object(&input, &fields, &key).unwrap();
    assert!(resealed.encrypted.as_deref().unwrap().starts_with("v1."));
}

#[test]
fn float_values_are_restored_exactly() {
    let fields = vec![Field::text("amount"), Field::text("rate").into_public()];
    let input = json!({"amount": 1.0715660391465826e-75, "rate": 0.30000000000000004});

    let codec = codec(CipherMode::Deterministic);
    let key = codec.key_for(Some("user-3")).unwrap();
    let sealed = codec.encrypt_field_object(&input, &fields, &key).unwrap();
    let opened = codec.decrypt_field_object(&sealed, &key).unwrap();
    assert_eq!(opened["amount"].as_f64(), Some(1.0715660391465826e-75));
    assert_eq!(Value::Object(opened), input);
}

#[test]
fn distinct_entities_get_distinct_keys() {
    let codec = codec(CipherMode::Deterministic);
    let a = codec.key_for(Some("user-1")).unwrap();
    let b = codec.key_for(Some("user-2")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn stored_form_is_stable_json() {
    let codec = codec(CipherMode::Deterministic);
    let key = codec.key_for(Some("user-1")).unwrap();
    let fields = vec![Field::text("name"), Field::text("plan").into_public()];
    let sealed = codec
        .encrypt_field_object(&json!({"name": "Ann", "plan": "pro"}), &fields, &key)
        .unwrap();

    let stored = serde_json::to_string(&sealed).unwrap();
    let loaded: EncryptedFieldObject = serde_json::from_str(&stored).unwrap();
    assert_eq!(loaded, sealed);
    assert_eq!(
        codec.decrypt_field_object(&loaded, &key).unwrap()["name"],
        json!("Ann")
    );
}
