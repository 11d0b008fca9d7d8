//! Shared fixtures for integration and e2e tests.

/// A vision narrative in the shape LLaVA produces for a clear face photo.
pub const SAMPLE_NARRATIVE: &str = "\
1. FOREHEAD: High and broad with a smooth, slightly rounded surface; temples are flat and the brow ridge is subtle.
2. EYEBROWS: Thick and straight with moderate spacing, dense texture, and a tapered tail angled slightly downward.
3. EYES: Medium-sized almond shape with a direct, focused gaze and an alert, penetrating expression.
4. NOSE: Long with a straight high bridge, refined pointed tip, and narrow nostrils; overall Greek type.
5. LIPS & MOUTH: Moderately full lower lip, defined cupid's bow, straight corners, medium width.
6. JAWLINE & CHIN: Angular, well-defined jawline with a prominent squared chin projecting slightly forward.
7. CHEEKBONES: Moderately prominent and high-set with soft definition and balanced fullness below.
8. EARS: Medium size, level with the eyes, close to the head, with free fleshy lobes.
9. FACE SHAPE: Oval with balanced proportions, generally symmetrical, soft angularity overall.
10. HAIRLINE: Full with a straight shape at medium height and thick density at the front.";

/// 1x1 transparent PNG, base64-encoded.
const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Smallest valid image payload accepted by the analyze endpoint.
pub fn tiny_png_data_uri() -> String {
    format!("data:image/png;base64,{TINY_PNG_BASE64}")
}

/// Raw provider JSON in the compact summary-mode shape.
pub fn stub_summary_response() -> serde_json::Value {
    serde_json::json!({
        "positive": ["Wisdom (high forehead) - Capable of deep thinking"],
        "negative": ["Too serious - Sometimes needs to relax"],
        "type": "Strategic Thinker",
        "summary": "A natural leader with sharp analytical instincts.",
        "refs": [{"feature": "Forehead", "quote": "A high forehead is a sign of sharp intellect"}]
    })
}
