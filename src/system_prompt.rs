//! Fixed stylist instruction and follow-up prompts

/// Instruction establishing the assistant's role
pub const STYLIST_INSTRUCTION: &str = "You're a fashion assistant. When someone asks what to wear, first ask 2–3 follow-up questions to clarify the event type, style, weather, time of day, or budget. Only use search_tool after clarification. After recommending outfits, suggest next steps like accessories, outerwear, or shoes.";

/// Prompt sent when the user asks for accessories after a product search
pub fn accessory_prompt(last_search_query: &str) -> String {
    format!(
        "Now that you've shown outfit options for '{last_search_query}', can you suggest matching accessories like jewelry, bags, or shoes? Only show accessories, not clothes."
    )
}
