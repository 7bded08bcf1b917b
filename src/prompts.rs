//! Prompt construction for every generation call.
//!
//! Each builder returns a complete [`GenerationRequest`]; the output contract
//! lives in the request schema, so prompt text never spells out the JSON.

use crate::feed::display_name;
use crate::generation::{GenerationRequest, OutputSchema};
use crate::models::{
    Campaign, AdGroup, DESCRIPTION_MAX_LEN, DESCRIPTION_SLOTS, HEADLINE_MAX_LEN, HEADLINE_SLOTS,
    PATH_MAX_LEN,
};

/// Placeholder for an attribute the product row does not carry
pub const MISSING_ATTRIBUTE: &str = "N/A";

const AD_COPY_SYSTEM: &str = "You are a senior Google Ads copywriter who writes high-converting \
Responsive Search Ad copy.

Headlines 1 to 4 must name the product. Across them, cover at least one concrete feature, \
one core benefit and the price when one is given.
Headlines 5 to 15 can range wider: calls to action, differentiators, offers and guarantees, \
urgency.
Every description pairs features with benefits, mentions pricing when available and ends \
on a call to action.

Write specific, persuasive copy based only on the product details supplied. Avoid vague or \
generic claims.";

const KEYWORD_SYSTEM: &str = "You are a Google Ads keyword specialist. Produce two lists of \
keyword strings: \"positive\" keywords to target and \"negative\" keywords to exclude.";

const TITLE_SYSTEM: &str = "You are a Google Merchant Center feed specialist. Product titles in \
this feed are raw product names and must be rewritten into optimised titles.

Rules:
1. Start with the brand.
2. Add the product type when the current title lacks it.
3. Follow with key attributes in this order: gender or age group, colour, size, material, \
style or fit, special features.
4. Use natural language with \" - \" between attributes; no keyword stuffing and no | or /.
5. Aim for under 70 characters and never exceed 150.
6. Every variant gets its own title.
7. Leave out filler words such as \"item\" or \"sale\".";

const DESCRIPTION_SYSTEM: &str = "You are a Google Merchant Center feed specialist. Product \
descriptions in this feed are missing, too short or repeat the product name, and must be \
rewritten into optimised descriptions.

Rules:
1. Between 500 and 1,000 characters, never more than 5,000.
2. Unique to the product.
3. State the product type, adding it when missing.
4. Cover the key attributes: gender or age group, colour, size, material, style or fit, \
special features, use case.
5. Explain benefits such as comfort, durability, versatility or performance.
6. Natural sentences, not bullet lists or keyword stuffing.
7. No promotional phrases like \"best price\" or \"discount\".";

/// Ad copy for one ad group: 15 headlines, 4 descriptions, 2 display paths
pub fn ad_copy_request(campaign: &Campaign, ad_group: &AdGroup) -> GenerationRequest {
    let campaign_name = if campaign.name.trim().is_empty() {
        "Product Campaign"
    } else {
        campaign.name.as_str()
    };
    let landing_page = if ad_group.has_final_url() {
        ad_group.final_url.trim()
    } else {
        "Not specified"
    };

    let system = format!(
        "{}\n\nCharacter limits: headlines {} max, descriptions {} max, paths {} max.",
        AD_COPY_SYSTEM, HEADLINE_MAX_LEN, DESCRIPTION_MAX_LEN, PATH_MAX_LEN
    );
    let user = format!(
        "PRODUCT DETAILS:\n{}\n\nCAMPAIGN: {}\nAD GROUP: {}\nLANDING PAGE: {}\n\n\
         Write {} headlines, {} descriptions and 2 display paths.",
        ad_group.product_info.trim(),
        campaign_name,
        ad_group.name,
        landing_page,
        HEADLINE_SLOTS,
        DESCRIPTION_SLOTS
    );

    let schema = OutputSchema::new()
        .array("headlines", Some(HEADLINE_SLOTS))
        .array("descriptions", Some(DESCRIPTION_SLOTS))
        .array("paths", Some(2));

    GenerationRequest::new(system, user, schema)
}

/// Keyword ideas; negatives are only requested when a negative match type is wanted
pub fn keyword_request(prompt: &str, count: usize, wants_negative: bool) -> GenerationRequest {
    let negatives = if wants_negative {
        "Include relevant negative keywords."
    } else {
        "Do not include negative keywords."
    };
    let user = format!(
        "Suggest up to {} keywords in total for: \"{}\". {}",
        count,
        prompt.trim(),
        negatives
    );
    let schema = OutputSchema::new().array("positive", None).array("negative", None);
    GenerationRequest::new(KEYWORD_SYSTEM, user, schema)
}

/// "Display Name: value" lines for the selected attributes, in selection order
pub fn attribute_lines<'a, F>(attributes: &[String], lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    attributes
        .iter()
        .map(|key| {
            let value = lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(MISSING_ATTRIBUTE);
            format!("{}: {}", display_name(key), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn title_request(current_title: &str, attributes: &str) -> GenerationRequest {
    let user = format!(
        "CURRENT TITLE: {}\n\nAVAILABLE PRODUCT ATTRIBUTES:\n{}\n\n\
         Rewrite this title following the rules, using the attributes above.",
        current_title, attributes
    );
    GenerationRequest::new(TITLE_SYSTEM, user, OutputSchema::new().string("title")).with_max_tokens(1024)
}

pub fn description_request(current_description: &str, attributes: &str) -> GenerationRequest {
    let user = format!(
        "CURRENT DESCRIPTION: {}\n\nAVAILABLE PRODUCT ATTRIBUTES:\n{}\n\n\
         Rewrite this description following the rules, using the attributes above.",
        current_description, attributes
    );
    GenerationRequest::new(
        DESCRIPTION_SYSTEM,
        user,
        OutputSchema::new().string("description"),
    )
}
