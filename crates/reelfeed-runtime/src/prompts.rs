//! The extraction prompt.
//!
//! The prompt pins down the exact output contract: a raw JSON array with a
//! fixed field schema, the excluded category, and nothing else. Providers
//! still violate it routinely, which is what the normalizer tiers exist
//! for - but a strict prompt keeps the damage shallow.

/// Instruction block prepended to every page's text.
pub const EXTRACTION_PROMPT: &str = r#"You are a specialized JSON extraction tool. Extract movies and series from the provided text into a clean JSON array.

Each entry must follow this exact schema:
{
  "title": string,
  "year": number (for movies only, if available),
  "category": string ("Hollywood", "Foreign", "Anime", "TV Series"),
  "extra_info": string (e.g., "Download Hollywood Movie", "Episode 15-18 Added", "Complete"),
  "type": string ("movie" or "series"),
  "rating": number (optional, if available, on a scale of 1-10)
}

Critical rules:
1. Output ONLY the raw JSON array with no explanations, no markdown code blocks, and no backticks
2. Do not include Korean content
3. For movies, extract year as an integer if available
4. For series, ignore the year unless explicitly mentioned
5. Preserve episode/season information in extra_info
6. Ensure the output is valid parseable JSON with no additional text

Examples of correct format:
[{"title":"Movie 1","year":2023,"category":"Hollywood","extra_info":"Action","type":"movie"},{"title":"Series 1","category":"TV Series","extra_info":"Season 2","type":"series"}]

YOUR ENTIRE RESPONSE MUST BE A VALID JSON ARRAY ONLY. DO NOT INCLUDE ANY OTHER TEXT.
"#;

/// Build the full prompt for one page. Deterministic: the same page text
/// always produces the same prompt.
pub fn build_extraction_prompt(page_text: &str) -> String {
    format!("{EXTRACTION_PROMPT}\n{page_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_pins_the_schema() {
        for field in ["title", "year", "category", "extra_info", "type", "rating"] {
            assert!(EXTRACTION_PROMPT.contains(field), "missing field {field}");
        }
        assert!(EXTRACTION_PROMPT.contains("movie"));
        assert!(EXTRACTION_PROMPT.contains("series"));
    }

    #[test]
    fn test_prompt_names_the_exclusion() {
        assert!(EXTRACTION_PROMPT.contains("Do not include Korean content"));
    }

    #[test]
    fn test_prompt_demands_bare_array() {
        assert!(EXTRACTION_PROMPT.contains("no markdown code blocks"));
        assert!(EXTRACTION_PROMPT.contains("VALID JSON ARRAY ONLY"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build_extraction_prompt("page text");
        let b = build_extraction_prompt("page text");
        assert_eq!(a, b);
        assert!(a.ends_with("page text"));
    }
}
