use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of headline slots on a responsive search ad
pub const HEADLINE_SLOTS: usize = 15;

/// Number of description slots on a responsive search ad
pub const DESCRIPTION_SLOTS: usize = 4;

/// Maximum headline length in characters
pub const HEADLINE_MAX_LEN: usize = 30;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_LEN: usize = 90;

/// Maximum display path length in characters
pub const PATH_MAX_LEN: usize = 15;

/// Highest pin rank a headline can take
pub const HEADLINE_MAX_PIN: u8 = 3;

/// Highest pin rank a description can take
pub const DESCRIPTION_MAX_PIN: u8 = 2;

/// Truncate a string to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Represents a campaign or ad group status as chosen in the builder
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum Status {
    #[default]
    Active,
    Paused,
}

impl Status {
    /// The value written to the bulk-upload status columns.
    ///
    /// Paused maps to the literal "Paused", not a "Disabled" token.
    pub fn bulk_value(self) -> &'static str {
        match self {
            Status::Active => "Enabled",
            Status::Paused => "Paused",
        }
    }
}

/// Broad match keywords setting
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum BroadMatch {
    On,
    #[default]
    Off,
}

impl BroadMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            BroadMatch::On => "On",
            BroadMatch::Off => "Off",
        }
    }
}

/// AI Max setting
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum AiMax {
    Enabled,
    #[default]
    Disabled,
}

impl AiMax {
    pub fn as_str(self) -> &'static str {
        match self {
            AiMax::Enabled => "Enabled",
            AiMax::Disabled => "Disabled",
        }
    }
}

/// Whether the campaign is created by the upload or already exists in the account
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    #[default]
    New,
    Existing,
}

/// Keyword matching mode, including the negative and campaign-scoped variants
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum MatchType {
    Exact,
    Phrase,
    #[default]
    Broad,
    #[serde(rename = "Negative Exact")]
    NegativeExact,
    #[serde(rename = "Negative Phrase")]
    NegativePhrase,
    #[serde(rename = "Campaign Negative Exact")]
    CampaignNegativeExact,
    #[serde(rename = "Campaign Negative Phrase")]
    CampaignNegativePhrase,
}

impl MatchType {
    pub const ALL: [MatchType; 7] = [
        MatchType::Exact,
        MatchType::Phrase,
        MatchType::Broad,
        MatchType::NegativeExact,
        MatchType::NegativePhrase,
        MatchType::CampaignNegativeExact,
        MatchType::CampaignNegativePhrase,
    ];

    /// The Criterion Type value used by the bulk-upload format
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "Exact",
            MatchType::Phrase => "Phrase",
            MatchType::Broad => "Broad",
            MatchType::NegativeExact => "Negative Exact",
            MatchType::NegativePhrase => "Negative Phrase",
            MatchType::CampaignNegativeExact => "Campaign Negative Exact",
            MatchType::CampaignNegativePhrase => "Campaign Negative Phrase",
        }
    }

    /// Campaign negatives attach to the campaign rather than the ad group
    pub fn is_campaign_scoped(self) -> bool {
        self.as_str().starts_with("Campaign Negative")
    }

    pub fn is_negative(self) -> bool {
        !matches!(self, MatchType::Exact | MatchType::Phrase | MatchType::Broad)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = ModelError;

    /// Accepts the display names as well as snake/kebab case shorthands
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        MatchType::ALL
            .into_iter()
            .find(|m| m.as_str().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| ModelError::UnknownMatchType(s.to_string()))
    }
}

/// A headline or description slot
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct AdAsset {
    /// The asset text
    pub text: String,

    /// Pin rank, if the asset is pinned
    pub position: Option<u8>,
}

impl AdAsset {
    /// Build an asset, truncating the text and validating the pin
    pub fn new(text: &str, position: Option<u8>, max_len: usize, max_pin: u8) -> Result<Self, ModelError> {
        Ok(AdAsset {
            text: truncate_chars(text, max_len),
            position: check_pin(position, max_pin)?,
        })
    }

    /// The pin rank as written to a position column; unpinned is empty
    pub fn position_cell(&self) -> String {
        self.position.map(|p| p.to_string()).unwrap_or_default()
    }
}

fn check_pin(position: Option<u8>, max: u8) -> Result<Option<u8>, ModelError> {
    match position {
        None | Some(0) => Ok(None),
        Some(p) if p <= max => Ok(Some(p)),
        Some(p) => Err(ModelError::InvalidPin { position: p, max }),
    }
}

/// Which slot array an edit targets
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssetKind {
    Headline,
    Description,
}

impl AssetKind {
    pub fn slots(self) -> usize {
        match self {
            AssetKind::Headline => HEADLINE_SLOTS,
            AssetKind::Description => DESCRIPTION_SLOTS,
        }
    }

    pub fn max_len(self) -> usize {
        match self {
            AssetKind::Headline => HEADLINE_MAX_LEN,
            AssetKind::Description => DESCRIPTION_MAX_LEN,
        }
    }

    pub fn max_pin(self) -> u8 {
        match self {
            AssetKind::Headline => HEADLINE_MAX_PIN,
            AssetKind::Description => DESCRIPTION_MAX_PIN,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            AssetKind::Headline => "headlines",
            AssetKind::Description => "descriptions",
        }
    }
}

fn deserialize_assets<'de, D, const N: usize>(
    deserializer: D,
    kind: AssetKind,
) -> Result<[AdAsset; N], D::Error>
where
    D: Deserializer<'de>,
    [AdAsset; N]: Deserialize<'de>,
{
    let assets = <[AdAsset; N]>::deserialize(deserializer)?;
    let mut checked: [AdAsset; N] = std::array::from_fn(|_| AdAsset::default());
    for (slot, asset) in checked.iter_mut().zip(assets) {
        *slot = AdAsset::new(&asset.text, asset.position, kind.max_len(), kind.max_pin())
            .map_err(serde::de::Error::custom)?;
    }
    Ok(checked)
}

fn deserialize_headlines<'de, D>(deserializer: D) -> Result<[AdAsset; HEADLINE_SLOTS], D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_assets(deserializer, AssetKind::Headline)
}

fn deserialize_descriptions<'de, D>(deserializer: D) -> Result<[AdAsset; DESCRIPTION_SLOTS], D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_assets(deserializer, AssetKind::Description)
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let path = String::deserialize(deserializer)?;
    Ok(truncate_chars(&path, PATH_MAX_LEN))
}

/// Represents a keyword attached to an ad group
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    /// Stable id used for edits and removal
    pub id: Uuid,

    /// The keyword text, exported as is
    pub text: String,

    /// Match mode, including the negative and campaign-scoped variants
    pub match_type: MatchType,
}

impl Keyword {
    pub fn new(text: &str, match_type: MatchType) -> Self {
        Keyword {
            id: Uuid::new_v4(),
            text: text.to_string(),
            match_type,
        }
    }
}

/// Represents an ad group with its responsive search ad and keywords
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct AdGroup {
    /// Stable id used to address the ad group
    pub id: Uuid,

    /// The ad group name, e.g. "Ad Group 1"
    pub name: String,

    /// Landing page; required for every ad group before export
    pub final_url: String,

    /// Free-text product details used as the generation prompt
    pub product_info: String,

    /// The 15 headline slots
    #[serde(deserialize_with = "deserialize_headlines")]
    headlines: [AdAsset; HEADLINE_SLOTS],

    /// The 4 description slots
    #[serde(deserialize_with = "deserialize_descriptions")]
    descriptions: [AdAsset; DESCRIPTION_SLOTS],

    /// First display path segment
    #[serde(deserialize_with = "deserialize_path")]
    path1: String,

    /// Second display path segment
    #[serde(deserialize_with = "deserialize_path")]
    path2: String,

    /// Max CPC bid as entered
    #[serde(rename = "maxCPC")]
    pub max_cpc: String,

    /// Max CPM bid as entered
    #[serde(rename = "maxCPM")]
    pub max_cpm: String,

    /// Target CPV bid as entered
    #[serde(rename = "targetCPV")]
    pub target_cpv: String,

    /// Target CPM bid as entered
    #[serde(rename = "targetCPM")]
    pub target_cpm: String,

    /// Campaign status written on this ad group's rows
    pub campaign_status: Status,

    /// The ad group's own status
    pub ad_group_status: Status,

    /// Keywords in the order they were added
    pub keywords: Vec<Keyword>,
}

impl Default for AdGroup {
    fn default() -> Self {
        AdGroup::new("Ad Group 1")
    }
}

impl AdGroup {
    /// Create an ad group with every slot empty and the default bids
    pub fn new(name: &str) -> Self {
        AdGroup {
            id: Uuid::new_v4(),
            name: name.to_string(),
            final_url: String::new(),
            product_info: String::new(),
            headlines: Default::default(),
            descriptions: Default::default(),
            path1: String::new(),
            path2: String::new(),
            max_cpc: "0.01".to_string(),
            max_cpm: "0.01".to_string(),
            target_cpv: "0.01".to_string(),
            target_cpm: "0.01".to_string(),
            campaign_status: Status::Active,
            ad_group_status: Status::Active,
            keywords: Vec::new(),
        }
    }

    pub fn headlines(&self) -> &[AdAsset; HEADLINE_SLOTS] {
        &self.headlines
    }

    pub fn descriptions(&self) -> &[AdAsset; DESCRIPTION_SLOTS] {
        &self.descriptions
    }

    pub fn assets(&self, kind: AssetKind) -> &[AdAsset] {
        match kind {
            AssetKind::Headline => &self.headlines,
            AssetKind::Description => &self.descriptions,
        }
    }

    /// Overwrite one slot, truncating the text to the slot's limit
    pub fn set_asset(
        &mut self,
        kind: AssetKind,
        index: usize,
        text: &str,
        position: Option<u8>,
    ) -> Result<(), ModelError> {
        let asset = AdAsset::new(text, position, kind.max_len(), kind.max_pin())?;
        let slots = match kind {
            AssetKind::Headline => &mut self.headlines[..],
            AssetKind::Description => &mut self.descriptions[..],
        };
        let len = slots.len();
        let slot = slots
            .get_mut(index)
            .ok_or(ModelError::InvalidSlot { index, len })?;
        *slot = asset;
        Ok(())
    }

    pub fn set_headline(&mut self, index: usize, text: &str, position: Option<u8>) -> Result<(), ModelError> {
        self.set_asset(AssetKind::Headline, index, text, position)
    }

    pub fn set_description(&mut self, index: usize, text: &str, position: Option<u8>) -> Result<(), ModelError> {
        self.set_asset(AssetKind::Description, index, text, position)
    }

    /// Write lines into consecutive slots from the first one.
    ///
    /// Pins are reset on written slots; lines past the last slot are discarded
    /// and slots past the last line keep their value. Returns the number written.
    pub fn fill_assets<S: AsRef<str>>(&mut self, kind: AssetKind, lines: &[S]) -> usize {
        let mut written = 0;
        for (index, line) in lines.iter().take(kind.slots()).enumerate() {
            // unpinned writes cannot fail and index is within slots()
            if self.set_asset(kind, index, line.as_ref(), None).is_ok() {
                written += 1;
            }
        }
        written
    }

    pub fn path1(&self) -> &str {
        &self.path1
    }

    pub fn path2(&self) -> &str {
        &self.path2
    }

    pub fn set_paths(&mut self, path1: &str, path2: &str) {
        self.path1 = truncate_chars(path1, PATH_MAX_LEN);
        self.path2 = truncate_chars(path2, PATH_MAX_LEN);
    }

    /// Reset the ad content, keeping name, bids, statuses and keywords
    pub fn clear_content(&mut self) {
        self.final_url.clear();
        self.product_info.clear();
        self.headlines = Default::default();
        self.descriptions = Default::default();
        self.path1.clear();
        self.path2.clear();
    }

    pub fn has_final_url(&self) -> bool {
        !self.final_url.trim().is_empty()
    }

    pub fn keyword_mut(&mut self, id: Uuid) -> Result<&mut Keyword, ModelError> {
        self.keywords
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| ModelError::KeywordNotFound(id.to_string()))
    }
}

/// Represents a search campaign and the ad groups it owns
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct Campaign {
    /// Stable id used to address the campaign
    pub id: Uuid,

    /// The campaign name, e.g. "Campaign 1"
    pub name: String,

    /// Campaign status for the settings row
    pub status: Status,

    /// Budget as entered, e.g. "50 Daily"
    pub budget: String,

    /// Networks setting, e.g. "Google search"
    pub networks: String,

    /// Bid strategy type, e.g. "Manual CPC"
    pub bid_strategy_type: String,

    /// Broad match keywords setting
    pub broad_match: BroadMatch,

    /// AI Max setting
    pub ai_max: AiMax,

    /// Language targeting, e.g. "All"
    pub languages: String,

    /// Ad rotation setting
    pub ad_rotation: String,

    /// Location targeting method
    pub targeting_method: String,

    /// Location exclusion method
    pub exclusion_method: String,

    /// Whether the campaign is created by the upload or already exists
    pub campaign_type: CampaignType,

    /// The campaign's ad groups
    pub ad_groups: Vec<AdGroup>,
}

impl Default for Campaign {
    fn default() -> Self {
        Campaign::new("Campaign 1")
    }
}

impl Campaign {
    /// Create a campaign with the default settings and one empty ad group
    pub fn new(name: &str) -> Self {
        Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: Status::Active,
            budget: "50 Daily".to_string(),
            networks: "Google search".to_string(),
            bid_strategy_type: "Manual CPC".to_string(),
            broad_match: BroadMatch::Off,
            ai_max: AiMax::Disabled,
            languages: "All".to_string(),
            ad_rotation: "Optimize for clicks".to_string(),
            targeting_method: "Location of presence".to_string(),
            exclusion_method: "Location of presence".to_string(),
            campaign_type: CampaignType::New,
            ad_groups: vec![AdGroup::new("Ad Group 1")],
        }
    }

    pub fn ad_group(&self, id: Uuid) -> Result<&AdGroup, ModelError> {
        self.ad_groups
            .iter()
            .find(|ag| ag.id == id)
            .ok_or_else(|| ModelError::AdGroupNotFound(id.to_string()))
    }

    pub fn ad_group_mut(&mut self, id: Uuid) -> Result<&mut AdGroup, ModelError> {
        self.ad_groups
            .iter_mut()
            .find(|ag| ag.id == id)
            .ok_or_else(|| ModelError::AdGroupNotFound(id.to_string()))
    }

    pub fn find_ad_group(&self, name: &str) -> Option<&AdGroup> {
        self.ad_groups.iter().find(|ag| ag.name == name)
    }

    /// The budget amount with the " Daily" suffix stripped
    pub fn budget_amount(&self) -> String {
        self.budget.replacen(" Daily", "", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ad_group_has_every_slot_empty() {
        let ag = AdGroup::new("Shoes");
        assert_eq!(ag.headlines().len(), HEADLINE_SLOTS);
        assert_eq!(ag.descriptions().len(), DESCRIPTION_SLOTS);
        assert!(ag.headlines().iter().all(|h| h.text.is_empty() && h.position.is_none()));
        assert_eq!(ag.max_cpc, "0.01");
    }

    #[test]
    fn new_campaign_starts_with_one_ad_group() {
        let campaign = Campaign::new("Campaign 1");
        assert_eq!(campaign.ad_groups.len(), 1);
        assert_eq!(campaign.ad_groups[0].name, "Ad Group 1");
        assert_eq!(campaign.budget_amount(), "50");
    }

    #[test]
    fn headline_writes_are_truncated() {
        let mut ag = AdGroup::new("Shoes");
        ag.set_headline(0, &"x".repeat(45), Some(1)).unwrap();
        assert_eq!(ag.headlines()[0].text.chars().count(), HEADLINE_MAX_LEN);
        assert_eq!(ag.headlines()[0].position, Some(1));

        ag.set_description(3, &"é".repeat(120), None).unwrap();
        assert_eq!(ag.descriptions()[3].text.chars().count(), DESCRIPTION_MAX_LEN);

        ag.set_paths("a-very-long-display-path", "ok");
        assert_eq!(ag.path1(), "a-very-long-dis");
        assert_eq!(ag.path2(), "ok");
    }

    #[test]
    fn pins_are_range_checked() {
        let mut ag = AdGroup::new("Shoes");
        assert_eq!(
            ag.set_headline(0, "Buy", Some(4)),
            Err(ModelError::InvalidPin { position: 4, max: 3 })
        );
        assert!(ag.set_description(0, "Buy", Some(3)).is_err());
        ag.set_headline(1, "Buy", Some(0)).unwrap();
        assert_eq!(ag.headlines()[1].position, None);
        assert_eq!(ag.headlines()[1].position_cell(), "");
        assert_eq!(
            ag.set_headline(15, "Buy", None),
            Err(ModelError::InvalidSlot { index: 15, len: 15 })
        );
    }

    #[test]
    fn fill_assets_keeps_slot_count() {
        let mut ag = AdGroup::new("Shoes");
        ag.set_description(3, "Keep me", Some(2)).unwrap();
        let lines: Vec<String> = (0..6).map(|i| format!("Description {}", i)).collect();

        // only two lines: slots 2 and 3 keep their previous value
        assert_eq!(ag.fill_assets(AssetKind::Description, &lines[..2]), 2);
        assert_eq!(ag.descriptions()[3].text, "Keep me");

        assert_eq!(ag.fill_assets(AssetKind::Description, &lines), 4);
        assert_eq!(ag.descriptions().len(), 4);
        assert_eq!(ag.descriptions()[3].text, "Description 3");
        assert_eq!(ag.descriptions()[3].position, None);
    }

    #[test]
    fn match_type_scope_and_parsing() {
        assert!(MatchType::CampaignNegativeExact.is_campaign_scoped());
        assert!(MatchType::CampaignNegativePhrase.is_campaign_scoped());
        assert!(!MatchType::NegativeExact.is_campaign_scoped());
        assert_eq!("campaign-negative-phrase".parse::<MatchType>().unwrap(), MatchType::CampaignNegativePhrase);
        assert_eq!("Negative Exact".parse::<MatchType>().unwrap(), MatchType::NegativeExact);
        assert!("fuzzy".parse::<MatchType>().is_err());
    }

    #[test]
    fn deserialization_clamps_text_and_rejects_wrong_slot_counts() {
        let mut value = serde_json::to_value(AdGroup::new("Shoes")).unwrap();
        value["headlines"][0]["text"] = serde_json::json!("y".repeat(40));
        value["path1"] = serde_json::json!("z".repeat(20));
        let ag: AdGroup = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(ag.headlines()[0].text.len(), HEADLINE_MAX_LEN);
        assert_eq!(ag.path1().len(), PATH_MAX_LEN);

        value["descriptions"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<AdGroup>(value).is_err());
    }

    #[test]
    fn status_uses_literal_paused() {
        assert_eq!(Status::Active.bulk_value(), "Enabled");
        assert_eq!(Status::Paused.bulk_value(), "Paused");
    }
}
