//! The fixed instruction prompt sent to the model.

use linkenrich_shared::Category;

/// Build the classification prompt for `url`.
pub fn build_prompt(url: &str) -> String {
    format!(
        "Analyze the following URL and answer in JSON.\n\
         Output ONLY the JSON object. Never wrap it in markdown code blocks (```) \
         and never add any explanation before or after it.\n\
         \n\
         URL: {url}\n\
         \n\
         Response format (output exactly this JSON shape and nothing else):\n\
         {{\"title\": \"a fitting title for the content (at most 50 characters)\", \
         \"category\": \"exactly one of {choices}\", \
         \"notes\": \"a summary of the key points (2-3 sentences, at most 150 characters)\"}}",
        choices = Category::prompt_choices(),
    )
}
