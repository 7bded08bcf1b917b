use crate::error::{BuilderError, ModelError, Result};
use crate::export::{self, ExportDocument};
use crate::generation::{slot, GenerationService};
use crate::models::{
    AdGroup, AssetKind, Campaign, Keyword, MatchType, DESCRIPTION_MAX_LEN, DESCRIPTION_SLOTS,
    HEADLINE_MAX_LEN, HEADLINE_SLOTS, PATH_MAX_LEN,
};
use crate::prompts;
use crate::status::{DebugLog, Status};
use chrono::NaiveDate;
use log::debug;
use uuid::Uuid;

/// Options for a keyword generation call
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordOptions {
    pub prompt: String,
    /// Upper bound on the number of keyword ideas requested
    pub count: usize,
    pub match_types: Vec<MatchType>,
}

impl Default for KeywordOptions {
    fn default() -> Self {
        KeywordOptions {
            prompt: String::new(),
            count: 10,
            match_types: vec![MatchType::Exact, MatchType::Phrase],
        }
    }
}

impl KeywordOptions {
    pub fn wants_negative(&self) -> bool {
        self.match_types.iter().any(|m| m.is_negative())
    }
}

/// Fan keyword ideas out to the selected match types.
///
/// Positive ideas get every selected positive type, negative ideas every
/// selected negative type. Blank ideas are skipped.
pub fn expand_keywords(positive: &[String], negative: &[String], match_types: &[MatchType]) -> Vec<Keyword> {
    let selected = |negative: bool| -> Vec<MatchType> {
        MatchType::ALL
            .into_iter()
            .filter(|m| m.is_negative() == negative && match_types.contains(m))
            .collect()
    };
    let positive_types = selected(false);
    let negative_types = selected(true);

    let mut keywords = Vec::new();
    for (ideas, types) in [(positive, &positive_types), (negative, &negative_types)] {
        for idea in ideas.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            keywords.extend(types.iter().map(|&m| Keyword::new(idea, m)));
        }
    }
    keywords
}

/// Non-blank trimmed lines of a pasted block
fn import_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// Result of one ad group in a batch generation
#[derive(Debug)]
pub struct AdGroupOutcome {
    pub campaign_id: Uuid,
    pub ad_group_id: Uuid,
    pub ad_group_name: String,
    pub result: Result<()>,
}

/// An editing session over a set of campaigns
#[derive(Debug)]
pub struct AdBuilder {
    campaigns: Vec<Campaign>,
    pub status: Status,
    pub debug_log: DebugLog,
}

impl Default for AdBuilder {
    fn default() -> Self {
        AdBuilder::new()
    }
}

impl AdBuilder {
    /// A session holding one default campaign
    pub fn new() -> Self {
        AdBuilder::from_campaigns(vec![Campaign::new("Campaign 1")])
    }

    pub fn from_campaigns(campaigns: Vec<Campaign>) -> Self {
        AdBuilder {
            campaigns,
            status: Status::default(),
            debug_log: DebugLog::new(),
        }
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn into_campaigns(self) -> Vec<Campaign> {
        self.campaigns
    }

    pub fn campaign(&self, id: Uuid) -> Result<&Campaign> {
        self.campaigns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ModelError::CampaignNotFound(id.to_string()).into())
    }

    pub fn campaign_mut(&mut self, id: Uuid) -> Result<&mut Campaign> {
        self.campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ModelError::CampaignNotFound(id.to_string()).into())
    }

    pub fn ad_group(&self, campaign_id: Uuid, ad_group_id: Uuid) -> Result<&AdGroup> {
        Ok(self.campaign(campaign_id)?.ad_group(ad_group_id)?)
    }

    pub fn ad_group_mut(&mut self, campaign_id: Uuid, ad_group_id: Uuid) -> Result<&mut AdGroup> {
        Ok(self.campaign_mut(campaign_id)?.ad_group_mut(ad_group_id)?)
    }

    /// Look up a campaign and ad group by name
    pub fn find_ad_group(&self, ad_group_name: &str) -> Option<(Uuid, Uuid)> {
        self.campaigns.iter().find_map(|c| {
            c.find_ad_group(ad_group_name).map(|ag| (c.id, ag.id))
        })
    }

    fn succeed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.debug_log.push(&message);
        self.status.succeed(message);
    }

    /// Record a failed operation and hand the error back
    fn fail(&mut self, message: String, error: BuilderError) -> BuilderError {
        self.debug_log.push(&message);
        self.status.fail(message);
        error
    }

    fn failed<T>(&mut self, error: impl Into<BuilderError>) -> Result<T> {
        let error = error.into();
        Err(self.fail(error.to_string(), error))
    }

    pub fn add_campaign(&mut self) -> Uuid {
        let campaign = Campaign::new(&format!("Campaign {}", self.campaigns.len() + 1));
        let id = campaign.id;
        self.campaigns.push(campaign);
        self.succeed("New Campaign added!");
        id
    }

    pub fn remove_campaign(&mut self, id: Uuid) -> Result<()> {
        let before = self.campaigns.len();
        self.campaigns.retain(|c| c.id != id);
        if self.campaigns.len() == before {
            return self.failed(ModelError::CampaignNotFound(id.to_string()));
        }
        self.succeed("Campaign removed!");
        Ok(())
    }

    pub fn add_ad_group(&mut self, campaign_id: Uuid) -> Result<Uuid> {
        let campaign = match self.campaign_mut(campaign_id) {
            Ok(campaign) => campaign,
            Err(e) => return self.failed(e),
        };
        let ad_group = AdGroup::new(&format!("Ad Group {}", campaign.ad_groups.len() + 1));
        let id = ad_group.id;
        campaign.ad_groups.push(ad_group);
        self.succeed("New Ad Group added!");
        Ok(id)
    }

    pub fn remove_ad_group(&mut self, campaign_id: Uuid, ad_group_id: Uuid) -> Result<()> {
        let removed = self.campaign_mut(campaign_id).and_then(|campaign| {
            let before = campaign.ad_groups.len();
            campaign.ad_groups.retain(|ag| ag.id != ad_group_id);
            if campaign.ad_groups.len() == before {
                Err(ModelError::AdGroupNotFound(ad_group_id.to_string()).into())
            } else {
                Ok(())
            }
        });
        match removed {
            Ok(()) => {
                self.succeed("Ad Group removed!");
                Ok(())
            }
            Err(e) => self.failed(e),
        }
    }

    /// Reset final URL, product info, every slot and both paths
    pub fn clear_ad_group(&mut self, campaign_id: Uuid, ad_group_id: Uuid) -> Result<()> {
        match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group.clear_content(),
            Err(e) => return self.failed(e),
        }
        self.succeed("Ad Group content cleared!");
        Ok(())
    }

    /// Back to a single default campaign with an empty log
    pub fn clear_all(&mut self) {
        self.campaigns = vec![Campaign::new("Campaign 1")];
        self.debug_log.clear();
        self.status.succeed("All campaigns and fields cleared!");
    }

    /// Paste lines into consecutive headline or description slots.
    ///
    /// Returns the number of slots written.
    pub fn bulk_import_assets(
        &mut self,
        campaign_id: Uuid,
        ad_group_id: Uuid,
        kind: AssetKind,
        text: &str,
    ) -> Result<usize> {
        let lines = import_lines(text);
        if lines.is_empty() {
            return self.failed(ModelError::MissingInput(format!("No {} to import.", kind.plural())));
        }
        let written = match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group.fill_assets(kind, &lines),
            Err(e) => return self.failed(e),
        };
        if lines.len() > written {
            debug!("Discarded {} {} past the last slot", lines.len() - written, kind.plural());
        }
        self.succeed(format!("Successfully imported {} {}!", written, kind.plural()));
        Ok(written)
    }

    /// Append one keyword per non-blank line, all with the same match type
    pub fn bulk_import_keywords(
        &mut self,
        campaign_id: Uuid,
        ad_group_id: Uuid,
        text: &str,
        match_type: MatchType,
    ) -> Result<usize> {
        let lines = import_lines(text);
        if lines.is_empty() {
            return self.failed(ModelError::MissingInput("No keywords to import.".to_string()));
        }
        match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group
                .keywords
                .extend(lines.iter().map(|line| Keyword::new(line, match_type))),
            Err(e) => return self.failed(e),
        }
        self.succeed(format!("Successfully imported {} keywords!", lines.len()));
        Ok(lines.len())
    }

    /// Append an empty broad keyword
    pub fn add_keyword(&mut self, campaign_id: Uuid, ad_group_id: Uuid) -> Result<Uuid> {
        let keyword = Keyword::new("", MatchType::Broad);
        let id = keyword.id;
        match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group.keywords.push(keyword),
            Err(e) => return self.failed(e),
        }
        Ok(id)
    }

    /// Replace the keyword carrying `keyword.id`
    pub fn update_keyword(&mut self, campaign_id: Uuid, ad_group_id: Uuid, keyword: Keyword) -> Result<()> {
        let updated = self
            .ad_group_mut(campaign_id, ad_group_id)
            .and_then(|ag| Ok(ag.keyword_mut(keyword.id)?))
            .map(|existing| *existing = keyword);
        updated.or_else(|e| self.failed(e))
    }

    pub fn remove_keyword(&mut self, campaign_id: Uuid, ad_group_id: Uuid, keyword_id: Uuid) -> Result<()> {
        let removed = self.ad_group_mut(campaign_id, ad_group_id).and_then(|ag| {
            let before = ag.keywords.len();
            ag.keywords.retain(|k| k.id != keyword_id);
            if ag.keywords.len() == before {
                Err(ModelError::KeywordNotFound(keyword_id.to_string()).into())
            } else {
                Ok(())
            }
        });
        removed.or_else(|e| self.failed(e))
    }

    /// Generate and apply ad copy for one ad group.
    ///
    /// All 15 headlines, 4 descriptions and both paths are overwritten; slots
    /// the model left out become empty and pins are cleared.
    pub async fn generate_ad_copy(
        &mut self,
        service: &dyn GenerationService,
        campaign_id: Uuid,
        ad_group_id: Uuid,
    ) -> Result<()> {
        let (label, request) = {
            let campaign = match self.campaign(campaign_id) {
                Ok(campaign) => campaign,
                Err(e) => return self.failed(e),
            };
            let ad_group = match campaign.ad_group(ad_group_id) {
                Ok(ad_group) => ad_group,
                Err(e) => return self.failed(e),
            };
            if ad_group.product_info.trim().is_empty() {
                let message = format!("Product information is required for {}.", ad_group.name);
                return self.failed(ModelError::MissingInput(message));
            }
            (
                format!("{}/{}", campaign.name, ad_group.name),
                prompts::ad_copy_request(campaign, ad_group),
            )
        };

        self.debug_log.push(format!(
            "[{}] Starting ad copy generation with {}...",
            label,
            service.provider()
        ));

        let content = match service.generate(&request).await {
            Ok(content) => content,
            Err(e) => {
                let message = format!("Error for {}: {}", label, e);
                return Err(self.fail(message, e.into()));
            }
        };

        let generated_headlines = content.strings("headlines");
        let generated_descriptions = content.strings("descriptions");
        let paths = content.strings("paths");

        // the ad group may have changed while the call was in flight
        let ad_group = match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group,
            Err(e) => return self.failed(e),
        };
        let headlines: Vec<String> = (0..HEADLINE_SLOTS)
            .map(|i| slot(&generated_headlines, i, HEADLINE_MAX_LEN))
            .collect();
        let descriptions: Vec<String> = (0..DESCRIPTION_SLOTS)
            .map(|i| slot(&generated_descriptions, i, DESCRIPTION_MAX_LEN))
            .collect();
        ad_group.fill_assets(AssetKind::Headline, &headlines);
        ad_group.fill_assets(AssetKind::Description, &descriptions);
        ad_group.set_paths(&slot(&paths, 0, PATH_MAX_LEN), &slot(&paths, 1, PATH_MAX_LEN));

        self.succeed(format!("Ad copy generated for {}!", label));
        Ok(())
    }

    /// Generate keyword ideas and append them to the ad group.
    ///
    /// Returns the number of keywords added.
    pub async fn generate_keywords(
        &mut self,
        service: &dyn GenerationService,
        campaign_id: Uuid,
        ad_group_id: Uuid,
        options: &KeywordOptions,
    ) -> Result<usize> {
        let name = match self.ad_group(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group.name.clone(),
            Err(e) => return self.failed(e),
        };
        if options.prompt.trim().is_empty() {
            return self.failed(ModelError::MissingInput(
                "A prompt is required to generate keywords.".to_string(),
            ));
        }

        self.debug_log
            .push(format!("[{}] Starting keyword generation...", name));
        let request = prompts::keyword_request(&options.prompt, options.count, options.wants_negative());

        let content = match service.generate(&request).await {
            Ok(content) => content,
            Err(e) => {
                let message = format!("Keyword generation error for {}: {}", name, e);
                return Err(self.fail(message, e.into()));
            }
        };

        let keywords = expand_keywords(
            &content.strings("positive"),
            &content.strings("negative"),
            &options.match_types,
        );
        let added = keywords.len();
        match self.ad_group_mut(campaign_id, ad_group_id) {
            Ok(ad_group) => ad_group.keywords.extend(keywords),
            Err(e) => return self.failed(e),
        }

        self.succeed(format!("{} keywords generated for {}!", added, name));
        Ok(added)
    }

    /// Generate ad copy for every ad group that has product information.
    ///
    /// Ad groups are processed one after another; a failure is recorded in its
    /// outcome and the batch moves on.
    pub async fn generate_all_ad_copy(&mut self, service: &dyn GenerationService) -> Vec<AdGroupOutcome> {
        let targets: Vec<(Uuid, Uuid, String)> = self
            .campaigns
            .iter()
            .flat_map(|c| {
                c.ad_groups
                    .iter()
                    .filter(|ag| !ag.product_info.trim().is_empty())
                    .map(move |ag| (c.id, ag.id, ag.name.clone()))
            })
            .collect();

        if targets.is_empty() {
            let error = ModelError::MissingInput("No ad groups have product information.".to_string());
            let _ = self.failed::<()>(error);
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for (campaign_id, ad_group_id, ad_group_name) in targets {
            let result = self.generate_ad_copy(service, campaign_id, ad_group_id).await;
            outcomes.push(AdGroupOutcome {
                campaign_id,
                ad_group_id,
                ad_group_name,
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let total = outcomes.len();
        if failed == 0 {
            self.succeed(format!("Ad copy generated for {} ad groups!", total));
        } else {
            let message = format!("Generation failed for {} of {} ad groups", failed, total);
            self.debug_log.push(&message);
            self.status.fail(message);
        }
        outcomes
    }

    /// Validate and render the bulk-upload CSV
    pub fn export(&mut self, date: NaiveDate) -> Result<ExportDocument> {
        match export::export_document(&self.campaigns, date) {
            Ok(document) => {
                self.succeed(format!("Exported {} campaigns to {}", self.campaigns.len(), document.filename));
                Ok(document)
            }
            Err(e) => self.failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_ids(builder: &AdBuilder) -> (Uuid, Uuid) {
        let campaign = &builder.campaigns()[0];
        (campaign.id, campaign.ad_groups[0].id)
    }

    #[test]
    fn campaigns_and_ad_groups_are_numbered() {
        let mut builder = AdBuilder::new();
        let second = builder.add_campaign();
        assert_eq!(builder.campaign(second).unwrap().name, "Campaign 2");

        let group = builder.add_ad_group(second).unwrap();
        assert_eq!(builder.ad_group(second, group).unwrap().name, "Ad Group 2");
        assert_eq!(builder.status.success.as_deref(), Some("New Ad Group added!"));
    }

    #[test]
    fn unknown_ids_set_the_error_status() {
        let mut builder = AdBuilder::new();
        assert!(builder.remove_campaign(Uuid::new_v4()).is_err());
        assert!(builder.status.error.as_deref().unwrap().starts_with("Campaign not found"));
        assert_eq!(builder.campaigns().len(), 1);
    }

    #[test]
    fn bulk_import_fills_from_the_first_slot() {
        let mut builder = AdBuilder::new();
        let (c, a) = first_ids(&builder);
        builder
            .ad_group_mut(c, a)
            .unwrap()
            .set_headline(2, "Keep me", Some(1))
            .unwrap();

        let written = builder
            .bulk_import_assets(c, a, AssetKind::Headline, "  One \n\nTwo\n")
            .unwrap();
        assert_eq!(written, 2);

        let headlines = builder.ad_group(c, a).unwrap().headlines();
        assert_eq!(headlines[0].text, "One");
        assert_eq!(headlines[1].text, "Two");
        assert_eq!(headlines[2].text, "Keep me");
        assert_eq!(headlines[2].position, Some(1));
    }

    #[test]
    fn bulk_import_discards_extra_lines() {
        let mut builder = AdBuilder::new();
        let (c, a) = first_ids(&builder);
        let text = (1..=6).map(|i| format!("Description {}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(builder.bulk_import_assets(c, a, AssetKind::Description, &text).unwrap(), 4);
        assert_eq!(builder.ad_group(c, a).unwrap().descriptions()[3].text, "Description 4");
    }

    #[test]
    fn empty_keyword_import_is_rejected() {
        let mut builder = AdBuilder::new();
        let (c, a) = first_ids(&builder);
        assert!(builder.bulk_import_keywords(c, a, " \n ", MatchType::Exact).is_err());
        assert_eq!(builder.status.error.as_deref(), Some("No keywords to import."));

        assert_eq!(builder.bulk_import_keywords(c, a, "shoes\n boots ", MatchType::Exact).unwrap(), 2);
        assert_eq!(builder.ad_group(c, a).unwrap().keywords[1].text, "boots");
    }

    #[test]
    fn keyword_edits() {
        let mut builder = AdBuilder::new();
        let (c, a) = first_ids(&builder);
        let id = builder.add_keyword(c, a).unwrap();

        let mut keyword = builder.ad_group(c, a).unwrap().keywords[0].clone();
        assert_eq!(keyword.match_type, MatchType::Broad);
        keyword.text = "running shoes".to_string();
        keyword.match_type = MatchType::CampaignNegativePhrase;
        builder.update_keyword(c, a, keyword.clone()).unwrap();
        assert_eq!(builder.ad_group(c, a).unwrap().keywords[0], keyword);

        builder.remove_keyword(c, a, id).unwrap();
        assert!(builder.ad_group(c, a).unwrap().keywords.is_empty());
        assert!(builder.remove_keyword(c, a, id).is_err());
    }

    #[test]
    fn clear_all_resets_the_session() {
        let mut builder = AdBuilder::new();
        builder.add_campaign();
        builder.add_campaign();
        builder.clear_all();
        assert_eq!(builder.campaigns().len(), 1);
        assert_eq!(builder.campaigns()[0].name, "Campaign 1");
        assert!(builder.debug_log.is_empty());
    }

    #[test]
    fn keywords_fan_out_by_polarity() {
        let keywords = expand_keywords(
            &["shoes".to_string(), " ".to_string()],
            &["cheap".to_string()],
            &[MatchType::Phrase, MatchType::Exact, MatchType::CampaignNegativeExact],
        );
        let pairs: Vec<(&str, MatchType)> = keywords.iter().map(|k| (k.text.as_str(), k.match_type)).collect();
        assert_eq!(
            pairs,
            vec![
                ("shoes", MatchType::Exact),
                ("shoes", MatchType::Phrase),
                ("cheap", MatchType::CampaignNegativeExact),
            ]
        );
    }
}
