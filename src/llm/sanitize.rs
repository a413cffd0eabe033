//! Cleanup of raw model output.

/// Strip markdown code-fence markers and surrounding whitespace from raw
/// model output.
///
/// Models occasionally wrap the message in a fenced block despite being told
/// not to. Removing every ``` occurrence and trimming is idempotent, so
/// already-clean output passes through unchanged.
pub fn sanitize_response(raw: &str) -> String {
    raw.replace("```", "").trim().to_string()
}
