use std::collections::BTreeMap;

use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::job::JobStatus;

/// Supported output languages.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    /// Bahasa Melayu
    #[default]
    My,
    /// English
    En,
    /// Bahasa Indonesia
    Id,
}

/// Interpretation verbosity: a quick read of the most prominent features,
/// or the full ten-feature treatment.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterpretMode {
    #[default]
    Summary,
    Detailed,
}

/// Per-language presentation labels and the fixed disclaimer.
///
/// The disclaimer is compliance boilerplate owned by this system;
/// whatever an LLM produces for that field is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LangConfig {
    pub name: String,
    pub summary_label: String,
    pub positive_label: String,
    pub negative_label: String,
    pub personality_label: String,
    pub disclaimer: String,
}

const DISCLAIMER_MY: &str =
    "Berdasarkan Kitab Firasat karya Imam Fakhruddin ar-Razi (1150-1210 M). Ilmu firasat Islam \
     klasik untuk memahami karakter, bukan ramalan nasib. Karakter boleh berubah melalui usaha \
     dan kehendak Ilahi.";
const DISCLAIMER_EN: &str =
    "Based on Kitab Firasat by Imam Fakhruddin ar-Razi (1150-1210 CE). Classical Islamic \
     physiognomy for character understanding, not fortune-telling. Character can change through \
     effort and divine will.";
const DISCLAIMER_ID: &str =
    "Berdasarkan Kitab Firasat karya Imam Fakhruddin ar-Razi (1150-1210 M). Ilmu firasat Islam \
     klasik untuk memahami karakter, bukan ramalan nasib. Karakter dapat berubah melalui usaha \
     dan kehendak Ilahi.";

impl Language {
    /// Whether prompts should be phrased in the Malay/Indonesian family.
    pub fn is_malay_family(self) -> bool {
        matches!(self, Language::My | Language::Id)
    }

    pub fn disclaimer(self) -> &'static str {
        match self {
            Language::My => DISCLAIMER_MY,
            Language::En => DISCLAIMER_EN,
            Language::Id => DISCLAIMER_ID,
        }
    }

    pub fn config(self) -> LangConfig {
        let (name, summary, positive, negative, personality) = match self {
            Language::My => (
                "Bahasa Melayu",
                "Ringkasan",
                "Sifat Positif",
                "Perlu Diperhatikan",
                "Personaliti",
            ),
            Language::En => (
                "English",
                "Summary",
                "Positive Traits",
                "Watch Out For",
                "Personality",
            ),
            Language::Id => (
                "Bahasa Indonesia",
                "Ringkasan",
                "Sifat Positif",
                "Perlu Diperhatikan",
                "Kepribadian",
            ),
        };
        LangConfig {
            name: name.to_string(),
            summary_label: summary.to_string(),
            positive_label: positive.to_string(),
            negative_label: negative.to_string(),
            personality_label: personality.to_string(),
            disclaimer: self.disclaimer().to_string(),
        }
    }
}

/// Citation for the classical source of all interpretation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitabSource {
    pub title: String,
    pub author: String,
    pub period: String,
    pub arabic: String,
}

impl Default for KitabSource {
    fn default() -> Self {
        Self {
            title: "Kitab Firasat".to_string(),
            author: "Imam Fakhruddin ar-Razi".to_string(),
            period: "1150-1210 M".to_string(),
            arabic: "الفراسة".to_string(),
        }
    }
}

/// Request to interpret a facial feature narrative.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InterpretRequest {
    /// Vision model narrative describing the face.
    #[garde(length(min = 1, max = 50_000))]
    pub analysis: String,

    #[garde(skip)]
    #[serde(default)]
    pub language: Language,

    #[garde(skip)]
    #[serde(default)]
    pub mode: InterpretMode,

    /// Caller-generated job id; the server mints one when absent.
    #[garde(inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub job_id: Option<String>,
}

/// 202 response after an interpretation request is accepted.
#[derive(Debug, Serialize, Deserialize)]
pub struct InterpretAccepted {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response for querying interpretation job status.
#[derive(Debug, Serialize, Deserialize)]
pub struct InterpretStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One facial feature narrative with its classical Arabic term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNarrative {
    pub description: String,
    pub arabic: String,
}

/// Character traits derived from the features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterInterpretation {
    pub positive_traits: Vec<String>,
    pub negative_traits: Vec<String>,
    pub personality_type: String,
    pub overall_summary: String,
}

/// A quotation from the Kitab backing a particular feature reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitabReference {
    pub feature: String,
    pub quote: String,
    pub arabic_term: String,
}

/// The stable interpretation schema consumed by the presentation layer.
///
/// Every field is defaulted by the transform step, so this is always
/// producible from any provider's raw JSON, however incomplete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretationResult {
    pub translated_features: BTreeMap<String, FeatureNarrative>,
    pub character_interpretation: CharacterInterpretation,
    pub kitab_references: Vec<KitabReference>,
    pub disclaimer: String,
}

/// The payload persisted in the job store and returned by the sync path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub interpretation: InterpretationResult,
    pub source: KitabSource,
    pub lang_config: LangConfig,
}
