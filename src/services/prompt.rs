//! Interpretation prompt assembly.
//!
//! Pure templating: (feature digest, language, mode) → prompt string.
//! Templates embed the Kitab Firasat reference rules, the trait-framing
//! rule (a trait to watch is a side effect of a positive trait, never its
//! opposite), and a JSON-only output instruction with exhaustive field
//! names. The latter is the only reliable way to get structured data out
//! of free-text generation providers.

use crate::models::interpretation::{InterpretMode, Language};

/// Classical reference rules quoted inside every prompt.
pub const KITAB_REFERENCE: &str = "\
KITAB FIRASAT (الفراسة) - Imam Fakhruddin ar-Razi (1150-1210 M)

DAHI (الجبهة - Al-Jabhah):
• Besar → Pemalas & pemarah | Kecil → Bodoh (otak kecil)
• Banyak kerutan → Congkak | Rata tanpa kerutan → Pengacau

KENING (الحواجب - Al-Hawajib):
• Berbulu lebat → Sering berduka, tutur kata buruk
• Miring ke bawah dari hidung → Congkak & dungu

MATA (العينين - Al-'Aynayn):
• Besar → Pemalas | Cekung → Jahat | Agak cekung → Jiwa baik
• Bergerak cepat & tajam → Penipu | Bersinar & mengilap → Cerdas, tajam fikiran

HIDUNG (الأنف - Al-Anf):
• Ujung lancip → Suka permusuhan | Pesek → Syahwat besar
• Melengkung/mancung → Jiwa mulia & baik (seperti elang)

MULUT & BIBIR (الفم - Al-Fam):
• Lebar → Syahwat besar | Tebal → Bodoh & keras kepala
• Tipis & lemas → Jiwa baik

WAJAH (الوجه - Al-Wajh):
• Bundar → Jiwa hina | Panjang → Tidak tahu malu
• Oval/seimbang → Karakter seimbang & baik

TELINGA (الأذن - Al-Udzun):
• Besar → Bodoh tapi panjang umur | Kecil → Cerdas & cepat berfikir

EMPAT MIZAJ (Temperamen):
• Sanguinis (دموي): Cerdas, pemberani, optimis
• Flegmatis (بلغمي): Tenang, sabar, lambat berfikir
• Melankolis (سوداوي): Sensitif, pemikir mendalam
• Koleris (صفراوي): Tabah, tegas, indra peka

PRINSIP UTAMA: Semakin banyak petunjuk yang cocok, semakin mendekati kepastian kesimpulannya";

/// Build the full interpretation prompt for one provider call.
pub fn build_prompt(features: &str, language: Language, mode: InterpretMode) -> String {
    match (language.is_malay_family(), mode) {
        (true, InterpretMode::Summary) => summary_prompt_my(features, language),
        (false, InterpretMode::Summary) => summary_prompt_en(features),
        (true, InterpretMode::Detailed) => detailed_prompt_my(features, language),
        (false, InterpretMode::Detailed) => detailed_prompt_en(features),
    }
}

fn summary_prompt_my(features: &str, language: Language) -> String {
    format!(
        r#"Anda pakar Kitab Firasat yang berpengalaman. Beri analisis RINGKAS tetapi BERKUALITI dalam {lang}.

RUJUKAN KITAB:
{reference}

CIRI WAJAH DIKESAN:
{features}

PERATURAN PENTING:
1. Fokus pada 4-5 ciri PALING MENONJOL yang membentuk personaliti unik
2. Setiap sifat positif mesti ada penjelasan BERMAKNA (bukan sekadar label)
3. Sifat negatif = KESAN SAMPINGAN sifat positif (BUKAN bertentangan!)
   ✓ Betul: Keyakinan tinggi → Kadang boleh kelihatan sombong
   ✗ Salah: Tegas → Pemalu
4. Summary mesti gambaran UNIK dan SPESIFIK untuk wajah ini
5. Rujuk ciri fizikal spesifik dalam penjelasan (dahi tinggi, mata tajam, dll)

CONTOH OUTPUT BERKUALITI:
{{
  "positive": [
    "Kebijaksanaan (dahi tinggi dan lebar) - Mampu berfikir mendalam dan melihat gambaran besar",
    "Ketelitian (mata fokus dan tajam) - Pemerhati yang baik, sukar ditipu"
  ],
  "negative": [
    "Terlalu serius - Kadang perlu rileks dan lebih santai dalam pergaulan"
  ],
  "type": "Pemikir Strategik - Gabungan kebijaksanaan dengan keyakinan diri yang kuat",
  "summary": "Individu ini memiliki aura kepimpinan semulajadi yang terserlah dari dahi tinggi dan kening tegas.",
  "refs": [{{"feature": "Dahi", "quote": "Dahi yang tinggi adalah tanda akal yang tajam"}}]
}}

SEKARANG, analisis wajah ini. JSON sahaja:"#,
        lang = language.config().name,
        reference = KITAB_REFERENCE,
        features = features,
    )
}

fn summary_prompt_en(features: &str) -> String {
    format!(
        r#"You are an experienced Kitab Firasat expert. Provide a CONCISE but QUALITY analysis in English.

KITAB REFERENCE:
{reference}

DETECTED FACIAL FEATURES:
{features}

IMPORTANT RULES:
1. Focus on 4-5 MOST PROMINENT features that shape unique personality
2. Each positive trait must have MEANINGFUL explanation (not just labels)
3. Negative traits = SIDE EFFECTS of positives (NOT opposites!)
   ✓ Correct: High confidence → Sometimes appears arrogant
   ✗ Wrong: Firm → Shy
4. Summary must be UNIQUE and SPECIFIC to this face
5. Reference specific physical features in explanations (high forehead, sharp eyes, etc.)

EXAMPLE QUALITY OUTPUT:
{{
  "positive": [
    "Wisdom (high and wide forehead) - Capable of deep thinking and seeing the big picture",
    "Attention to Detail (focused sharp eyes) - Good observer, hard to deceive"
  ],
  "negative": [
    "Too serious - Sometimes needs to relax and be more casual in social settings"
  ],
  "type": "Strategic Thinker - Combines wisdom with strong self-confidence",
  "summary": "This individual has a natural leadership aura evident from their high forehead and firm eyebrows.",
  "refs": [{{"feature": "Forehead", "quote": "A high forehead is a sign of sharp intellect"}}]
}}

NOW, analyze this face. JSON only:"#,
        reference = KITAB_REFERENCE,
        features = features,
    )
}

fn detailed_prompt_my(features: &str, language: Language) -> String {
    format!(
        r#"Anda pakar Kitab Firasat. Analisis wajah ini dan beri tafsiran BERMAKNA dalam {lang}.

RUJUKAN KITAB:
{reference}

CIRI WAJAH DIKESAN:
{features}

PERATURAN PENTING:
1. WAJIB isi SEMUA 10 ciri wajah dengan tafsiran penuh (2-3 ayat setiap satu)
2. Sifat negatif = KESAN SAMPINGAN sifat positif (BUKAN bertentangan!)
3. Berikan 3-4 rujukan Kitab Firasat yang berbeza

WAJIB OUTPUT JSON DENGAN FORMAT INI:
{{
  "features": {{
    "dahi": "[2-3 ayat tafsiran dahi - saiz, bentuk, dan maksud personaliti]",
    "kening": "[2-3 ayat tafsiran kening - ketebalan, bentuk, jarak]",
    "mata": "[2-3 ayat tafsiran mata - saiz, bentuk, pandangan]",
    "hidung": "[2-3 ayat tafsiran hidung - panjang, lebar, bentuk hujung]",
    "mulut": "[2-3 ayat tafsiran mulut & bibir - ketebalan, lebar]",
    "pipi": "[2-3 ayat tafsiran pipi - bentuk tulang pipi]",
    "rahang": "[2-3 ayat tafsiran rahang & dagu - ketegasan, bentuk]",
    "telinga": "[2-3 ayat tafsiran telinga - saiz, kedudukan]",
    "wajah": "[2-3 ayat tafsiran bentuk wajah keseluruhan]",
    "rambut": "[2-3 ayat tafsiran garis rambut - tinggi, bentuk]"
  }},
  "positive": ["Sifat 1 (dari ciri wajah) - penjelasan kekuatan"],
  "negative": ["Kesan sampingan 1 - nasihat membina"],
  "type": "Jenis Personaliti - penjelasan temperamen",
  "summary": "5-6 ayat gambaran unik individu ini berdasarkan gabungan semua ciri wajah.",
  "refs": [{{"feature": "Dahi", "quote": "Petikan Kitab Firasat tentang dahi"}}]
}}

PENTING: Isi SEMUA 10 ciri wajah! Jangan tinggalkan mana-mana. JSON sahaja:"#,
        lang = language.config().name,
        reference = KITAB_REFERENCE,
        features = features,
    )
}

fn detailed_prompt_en(features: &str) -> String {
    format!(
        r#"You are a Kitab Firasat expert. Analyze this face with COMPLETE interpretation in English.

KITAB REFERENCE:
{reference}

DETECTED FACIAL FEATURES:
{features}

IMPORTANT RULES:
1. MUST fill ALL 10 facial features with full interpretation (2-3 sentences each)
2. Negative traits = SIDE EFFECTS of positives (NOT opposites!)
3. Provide 3-4 different Kitab Firasat references

REQUIRED JSON FORMAT:
{{
  "features": {{
    "dahi": "[2-3 sentences about forehead - size, shape, personality meaning]",
    "kening": "[2-3 sentences about eyebrows - thickness, shape, spacing]",
    "mata": "[2-3 sentences about eyes - size, shape, gaze]",
    "hidung": "[2-3 sentences about nose - length, width, tip shape]",
    "mulut": "[2-3 sentences about mouth & lips - thickness, width]",
    "pipi": "[2-3 sentences about cheeks - cheekbone shape]",
    "rahang": "[2-3 sentences about jaw & chin - firmness, shape]",
    "telinga": "[2-3 sentences about ears - size, position]",
    "wajah": "[2-3 sentences about overall face shape]",
    "rambut": "[2-3 sentences about hairline - height, shape]"
  }},
  "positive": ["Trait 1 (from facial feature) - strength explanation"],
  "negative": ["Side effect 1 - constructive advice"],
  "type": "Personality Type - temperament explanation",
  "summary": "5-6 sentences unique portrait of this individual based on all facial features combined.",
  "refs": [{{"feature": "Forehead", "quote": "Kitab Firasat quote about forehead"}}]
}}

IMPORTANT: Fill ALL 10 facial features! Do not skip any. JSON only:"#,
        reference = KITAB_REFERENCE,
        features = features,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "Forehead: high and wide | Eyes: sharp and focused";

    #[test]
    fn test_summary_prompt_embeds_digest_verbatim() {
        let prompt = build_prompt(DIGEST, Language::My, InterpretMode::Summary);
        assert!(prompt.contains("Forehead: high and wide"));
        assert!(prompt.contains("Eyes: sharp and focused"));
        assert!(prompt.contains("JSON sahaja:"));
    }

    #[test]
    fn test_english_prompt_requests_json_only() {
        let prompt = build_prompt(DIGEST, Language::En, InterpretMode::Summary);
        assert!(prompt.contains(DIGEST));
        assert!(prompt.contains("JSON only:"));
        assert!(prompt.contains("SIDE EFFECTS of positives"));
    }

    #[test]
    fn test_detailed_prompt_names_all_ten_features() {
        for language in [Language::My, Language::En] {
            let prompt = build_prompt(DIGEST, language, InterpretMode::Detailed);
            for key in [
                "dahi", "kening", "mata", "hidung", "mulut", "pipi", "rahang", "telinga", "wajah",
                "rambut",
            ] {
                assert!(prompt.contains(&format!("\"{key}\"")), "{language}: missing {key}");
            }
        }
    }

    #[test]
    fn test_indonesian_uses_malay_family_template() {
        let prompt = build_prompt(DIGEST, Language::Id, InterpretMode::Summary);
        assert!(prompt.contains("Bahasa Indonesia"));
        assert!(prompt.contains("JSON sahaja:"));
    }

    #[test]
    fn test_reference_table_always_included() {
        for mode in [InterpretMode::Summary, InterpretMode::Detailed] {
            for language in [Language::My, Language::En, Language::Id] {
                let prompt = build_prompt(DIGEST, language, mode);
                assert!(prompt.contains("Imam Fakhruddin ar-Razi"));
            }
        }
    }
}
