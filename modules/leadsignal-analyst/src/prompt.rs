//! Lead → prompt text.
//!
//! The heuristics the model is asked to apply (keyword lists, posting-history
//! thresholds) live here as data. Nothing in this module scores a lead; the
//! verdict comes back from the model.

use std::fmt;

use leadsignal_common::{Lead, LeadField};

/// System-level instruction. JSON-object mode on OpenAI-compatible providers
/// refuses requests whose messages never mention "json", so keep the word.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert B2B sales lead qualification analyst. \
You decide whether a lead represents a genuinely new business that needs new services. \
Respond with ONLY a valid json object in the exact format requested. \
Do not wrap it in markdown and do not add any commentary before or after the json.";

/// Placeholder for absent fields.
pub const NOT_PROVIDED: &str = "Not provided";
/// Placeholder for an absent phone number; the model treats it as a red flag.
pub const MISSING_PHONE: &str = "Missing";

/// Only this many prior posts are shown to the model.
pub const MAX_PREVIOUS_POSTS: usize = 10;

/// At or below this many prior posts the account is treated as newly created.
pub const NEW_ACCOUNT_MAX_POSTS: usize = 3;
/// At or above this many prior posts the account is treated as established.
pub const ESTABLISHED_ACCOUNT_MIN_POSTS: usize = 10;

/// Language that signals a genuinely new business or premises.
pub const NEW_BUSINESS_KEYWORDS: &[&str] = &[
    "grand opening",
    "now open",
    "just opened",
    "opening soon",
    "coming soon",
    "new business",
    "newly opened",
    "launching",
    "just launched",
    "first day",
    "soft launch",
    "new premises",
    "new location",
    "new branch",
    "moved to",
    "relocated",
    "under new management",
    "new owners",
    "taken over",
];

/// Language that signals an existing business freshening up, not a new one.
pub const COSMETIC_UPDATE_KEYWORDS: &[&str] = &[
    "rebrand",
    "new logo",
    "new look",
    "new website",
    "refurbishment",
    "refurb",
    "renovation",
    "makeover",
    "new menu",
    "new hours",
    "new stock",
    "seasonal",
    "sale",
    "promotion",
    "anniversary",
    "celebrating",
    "years in business",
];

/// Render the analysis prompt for one lead. Deterministic: the same lead
/// always produces the same text.
pub fn build_prompt(lead: &Lead) -> String {
    let field = |f: LeadField| lead.get(f).unwrap_or(NOT_PROVIDED);

    let mut prompt = String::with_capacity(4096);

    prompt.push_str("Analyse the following lead and decide whether it is a GOOD, BAD or UNCLEAR sales opportunity.\n\n");

    prompt.push_str("LEAD DETAILS:\n");
    push_line(&mut prompt, format_args!("- Company Name: {}", field(LeadField::CompanyName)));
    push_line(&mut prompt, format_args!("- Industry Type: {}", field(LeadField::IndustryType)));
    push_line(&mut prompt, format_args!(
        "- Phone Number: {}",
        lead.get(LeadField::PhoneNumber).unwrap_or(MISSING_PHONE)
    ));
    push_line(&mut prompt, format_args!("- Address Line 1: {}", field(LeadField::AddressLine1)));
    push_line(&mut prompt, format_args!("- Address Line 2: {}", field(LeadField::AddressLine2)));
    push_line(&mut prompt, format_args!("- Postcode: {}", field(LeadField::Postcode)));
    push_line(&mut prompt, format_args!("- County: {}", field(LeadField::County)));
    push_line(&mut prompt, format_args!("- Old Address: {}", field(LeadField::OldAddress)));
    push_line(&mut prompt, format_args!("- Proof URL: {}", field(LeadField::ProofUrl)));
    push_line(&mut prompt, format_args!("- Lead Statement: {}", field(LeadField::LeadStatement)));

    if let Some(ref fetch) = lead.fetch_results {
        let post = &fetch.raw_data;
        prompt.push_str("\nSCRAPED POST EVIDENCE:\n");
        push_line(&mut prompt, format_args!(
            "- Post Date: {}",
            post.posted_at_iso.as_deref().unwrap_or(NOT_PROVIDED)
        ));
        push_line(&mut prompt, format_args!(
            "- Post Text: {}",
            post.post_text.as_deref().unwrap_or(NOT_PROVIDED)
        ));
        if post.previous_posts.is_empty() {
            prompt.push_str("- Previous Posts: None found\n");
        } else {
            prompt.push_str("- Previous Posts:\n");
            for (i, snippet) in post.previous_posts.iter().take(MAX_PREVIOUS_POSTS).enumerate() {
                push_line(&mut prompt, format_args!("  {}. {}", i + 1, snippet));
            }
        }
    }

    prompt.push_str("\nEVALUATION CRITERIA:\n");
    push_line(&mut prompt, format_args!(
        "1. NEW BUSINESS SIGNALS (lean GOOD): the lead statement or post mentions any of: {}.",
        quoted_list(NEW_BUSINESS_KEYWORDS)
    ));
    push_line(&mut prompt, format_args!(
        "2. COSMETIC UPDATES (lean BAD): an existing business announcing any of: {}. \
These do not create a need for new services.",
        quoted_list(COSMETIC_UPDATE_KEYWORDS)
    ));
    push_line(&mut prompt, format_args!(
        "3. POSTING HISTORY: {NEW_ACCOUNT_MAX_POSTS} or fewer previous posts suggests a newly created business account. \
{ESTABLISHED_ACCOUNT_MIN_POSTS} or more previous posts suggests an established business; treat it as BAD unless the post \
announces a new premises, new branch or relocation."
    ));
    prompt.push_str(
        "4. RELOCATION: if an old address is given, judge whether the move is to genuinely new premises that will need setting up.\n",
    );
    prompt.push_str(
        "5. CONTACT QUALITY: a missing phone number or incomplete address is a red flag but not an automatic rejection.\n",
    );
    prompt.push_str(
        "6. If the evidence is thin or contradictory, answer UNCLEAR rather than guessing.\n",
    );

    prompt.push_str(
        "\nRespond with a json object in exactly this format:\n\
{\n  \"verdict\": \"GOOD\" | \"BAD\" | \"UNCLEAR\",\n  \"reasoning\": \"2-3 sentences explaining the decision\",\n  \"confidence\": 0-100,\n  \"key_factors\": [\"factor 1\", \"factor 2\"],\n  \"red_flags\": [\"concern 1\"],\n  \"opportunity_score\": 0-100,\n  \"recommended_action\": \"what the sales team should do next\"\n}\n",
    );

    prompt
}

fn push_line(prompt: &mut String, line: fmt::Arguments<'_>) {
    prompt.push_str(&line.to_string());
    prompt.push('\n');
}

fn quoted_list(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| format!("\"{w}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadsignal_common::{FetchResult, PostData};

    fn full_lead() -> Lead {
        Lead {
            company_name: Some("Acme Bakery".into()),
            industry_type: Some("Food & Drink".into()),
            phone_number: Some("01234 567890".into()),
            address_line_1: Some("1 High Street".into()),
            address_line_2: None,
            postcode: Some("AB1 2CD".into()),
            county: Some("Kent".into()),
            lead_statement: Some("Grand opening this Saturday".into()),
            proof_url: Some("https://www.linkedin.com/posts/acme_123".into()),
            old_address: None,
            fetch_results: None,
        }
    }

    #[test]
    fn substitutes_fields_and_placeholders() {
        let prompt = build_prompt(&full_lead());
        assert!(prompt.contains("- Company Name: Acme Bakery"));
        assert!(prompt.contains("- Address Line 2: Not provided"));
        assert!(prompt.contains("- Old Address: Not provided"));
        assert!(prompt.contains("- Lead Statement: Grand opening this Saturday"));
        assert!(!prompt.contains("SCRAPED POST EVIDENCE"));
    }

    #[test]
    fn one_field_per_line() {
        let prompt = build_prompt(&full_lead());
        assert!(prompt.contains(
            "LEAD DETAILS:\n- Company Name: Acme Bakery\n- Industry Type: Food & Drink\n- Phone Number: 01234 567890\n"
        ));
        assert!(prompt.contains("- Lead Statement: Grand opening this Saturday\n\nEVALUATION CRITERIA:\n1. NEW BUSINESS SIGNALS"));
    }

    #[test]
    fn missing_phone_says_missing() {
        let prompt = build_prompt(&Lead::default());
        assert!(prompt.contains("- Phone Number: Missing"));
        assert!(prompt.contains("- Company Name: Not provided"));
    }

    #[test]
    fn embeds_post_evidence_and_caps_previous_posts() {
        let mut lead = full_lead();
        lead.fetch_results = Some(FetchResult {
            url: None,
            raw_data: PostData {
                posted_at_iso: Some("2024-01-01T09:00:00Z".into()),
                post_text: Some("We are now open!".into()),
                author_name: None,
                previous_posts: (1..=12).map(|i| format!("post number {i}")).collect(),
            },
        });

        let prompt = build_prompt(&lead);
        assert!(prompt.contains("- Post Date: 2024-01-01T09:00:00Z"));
        assert!(prompt.contains("- Post Text: We are now open!"));
        assert!(prompt.contains("  1. post number 1\n"));
        assert!(prompt.contains("  10. post number 10\n"));
        assert!(!prompt.contains("post number 11"));
        assert!(!prompt.contains("post number 12"));
    }

    #[test]
    fn no_previous_posts_is_stated() {
        let mut lead = full_lead();
        lead.fetch_results = Some(FetchResult::default());
        let prompt = build_prompt(&lead);
        assert!(prompt.contains("- Post Date: Not provided"));
        assert!(prompt.contains("- Previous Posts: None found"));
    }

    #[test]
    fn heuristics_are_embedded_verbatim() {
        let prompt = build_prompt(&full_lead());
        for word in NEW_BUSINESS_KEYWORDS.iter().chain(COSMETIC_UPDATE_KEYWORDS) {
            assert!(prompt.contains(&format!("\"{word}\"")), "missing keyword {word}");
        }
        assert!(prompt.contains("3 or fewer previous posts"));
        assert!(prompt.contains("10 or more previous posts"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt(&full_lead()), build_prompt(&full_lead()));
    }

    #[test]
    fn json_trigger_word_present() {
        assert!(SYSTEM_INSTRUCTION.contains("json"));
        assert!(build_prompt(&Lead::default()).contains("json object"));
    }
}
