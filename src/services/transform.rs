//! Raw provider JSON → stable interpretation schema.
//!
//! Total function: every field access is defaulted, so any JSON object a
//! provider hands back (including `{}`) produces a well-formed result.

use serde_json::Value;

use crate::models::interpretation::{
    CharacterInterpretation, FeatureNarrative, InterpretationResult, KitabReference, Language,
};

/// Provider-facing short feature key → (canonical key, Arabic term).
const FEATURE_KEYS: &[(&str, &str, &str)] = &[
    ("dahi", "dahi", "الجبهة"),
    ("kening", "kening", "الحواجب"),
    ("mata", "mata", "العينين"),
    ("hidung", "hidung", "الأنف"),
    ("mulut", "mulut_bibir", "الفم"),
    ("pipi", "pipi", "الخدين"),
    ("rahang", "rahang_dagu", "الذقن"),
    ("telinga", "telinga", "الأذن"),
    ("wajah", "bentuk_wajah", "الوجه"),
    ("rambut", "garis_rambut", "خط الشعر"),
];

/// Transform a raw provider object into the presentation schema.
///
/// The disclaimer always comes from the per-language constant table;
/// anything the provider produced for it is ignored.
pub fn transform(raw: &Value, language: Language) -> InterpretationResult {
    let mut result = InterpretationResult {
        character_interpretation: CharacterInterpretation {
            positive_traits: string_list(&raw["positive"]),
            negative_traits: string_list(&raw["negative"]),
            personality_type: string_field(&raw["type"]),
            overall_summary: string_field(&raw["summary"]),
        },
        kitab_references: normalize_references(raw),
        disclaimer: language.disclaimer().to_string(),
        ..Default::default()
    };

    if let Some(features) = raw["features"].as_object() {
        for (key, value) in features {
            let Some(description) = value.as_str() else {
                continue;
            };
            let (canonical, arabic) = canonical_feature_key(key);
            result.translated_features.insert(
                canonical.to_string(),
                FeatureNarrative {
                    description: description.to_string(),
                    arabic: arabic.to_string(),
                },
            );
        }
    }

    result
}

fn canonical_feature_key(key: &str) -> (&str, &str) {
    FEATURE_KEYS
        .iter()
        .find(|(short, _, _)| *short == key)
        .map(|(_, canonical, arabic)| (*canonical, *arabic))
        .unwrap_or((key, ""))
}

/// Providers may return one reference object (`ref`) or a list (`refs`);
/// both shapes normalize to a list.
fn normalize_references(raw: &Value) -> Vec<KitabReference> {
    if let Some(refs) = raw["refs"].as_array() {
        return refs.iter().map(reference_from).collect();
    }
    if raw["ref"].is_object() {
        return vec![reference_from(&raw["ref"])];
    }
    Vec::new()
}

fn reference_from(value: &Value) -> KitabReference {
    KitabReference {
        feature: string_field(&value["feature"]),
        quote: string_field(&value["quote"]),
        arabic_term: string_field(&value["arabic_term"]),
    }
}

fn string_field(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
