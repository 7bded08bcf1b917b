use crate::columns::{BulkRow, Column, Schema};
use crate::error::ExportError;
use crate::format;
use crate::models::{AdGroup, Campaign, CampaignType, Keyword};
use chrono::NaiveDate;
use log::{debug, info};

const RESPONSIVE_SEARCH_AD: &str = "Responsive search ad";
const ENABLED: &str = "Enabled";

/// A finished export, ready to be written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub filename: String,
    pub contents: String,
}

/// Filename for a campaign export made on `date`
pub fn export_filename(date: NaiveDate) -> String {
    format!("RSA_Campaign_Export_{}.csv", date.format("%Y-%m-%d"))
}

/// Check that every ad group in every campaign has a Final URL.
///
/// The error names each offending ad group as "Campaign / Ad Group".
pub fn validate_final_urls(campaigns: &[Campaign]) -> Result<(), ExportError> {
    let missing: Vec<String> = campaigns
        .iter()
        .flat_map(|c| {
            c.ad_groups
                .iter()
                .filter(|ag| !ag.has_final_url())
                .map(move |ag| format!("{} / {}", c.name, ag.name))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExportError::MissingFinalUrl(missing))
    }
}

/// The layout a document uses: the full layout if any campaign is new
pub fn document_schema(campaigns: &[Campaign]) -> Schema {
    if campaigns.iter().any(|c| c.campaign_type == CampaignType::New) {
        Schema::NewCampaign
    } else {
        Schema::ExistingCampaign
    }
}

/// Campaign settings row (full layout only)
fn campaign_settings_row(campaign: &Campaign) -> BulkRow {
    let mut row = BulkRow::new();
    row.set(Column::Campaign, campaign.name.as_str())
        .set(Column::CampaignType, "Search")
        .set(Column::Networks, campaign.networks.as_str())
        .set(Column::Budget, campaign.budget_amount())
        .set(Column::BudgetType, "Daily")
        .set(Column::Languages, campaign.languages.as_str())
        .set(Column::BidStrategyType, campaign.bid_strategy_type.as_str())
        .set(Column::BroadMatchKeywords, campaign.broad_match.as_str())
        .set(Column::AdRotation, campaign.ad_rotation.as_str())
        .set(Column::TargetingMethod, campaign.targeting_method.as_str())
        .set(Column::ExclusionMethod, campaign.exclusion_method.as_str())
        .set(Column::AiMax, campaign.ai_max.as_str())
        .set(Column::CampaignStatus, campaign.status.bulk_value());
    row
}

/// Ad group settings row (full layout only)
fn ad_group_settings_row(campaign: &Campaign, ad_group: &AdGroup) -> BulkRow {
    let mut row = BulkRow::new();
    row.set(Column::Campaign, campaign.name.as_str())
        .set(Column::AdGroup, ad_group.name.as_str())
        .set(Column::MaxCpc, ad_group.max_cpc.as_str())
        .set(Column::MaxCpm, ad_group.max_cpm.as_str())
        .set(Column::TargetCpv, ad_group.target_cpv.as_str())
        .set(Column::TargetCpm, ad_group.target_cpm.as_str())
        .set(Column::CampaignStatus, ad_group.campaign_status.bulk_value())
        .set(Column::AdGroupStatus, ad_group.ad_group_status.bulk_value());
    row
}

/// Responsive search ad row
fn ad_row(campaign: &Campaign, ad_group: &AdGroup, schema: Schema) -> BulkRow {
    let mut row = BulkRow::new();
    row.set(Column::Campaign, campaign.name.as_str())
        .set(Column::AdGroup, ad_group.name.as_str())
        .set(Column::FinalUrl, ad_group.final_url.as_str())
        .set(Column::AdType, RESPONSIVE_SEARCH_AD);

    for (i, headline) in ad_group.headlines().iter().enumerate() {
        row.set(Column::Headline(i), headline.text.as_str())
            .set(Column::HeadlinePosition(i), headline.position_cell());
    }
    for (i, description) in ad_group.descriptions().iter().enumerate() {
        row.set(Column::Description(i), description.text.as_str())
            .set(Column::DescriptionPosition(i), description.position_cell());
    }

    row.set(Column::Path1, ad_group.path1())
        .set(Column::Path2, ad_group.path2())
        .set(Column::Status, ENABLED);

    match schema {
        Schema::NewCampaign => {
            row.set(Column::CampaignStatus, ENABLED)
                .set(Column::AdGroupStatus, ENABLED);
        }
        Schema::ExistingCampaign => {
            row.set(Column::Labels, "")
                .set(Column::CampaignStatus, ad_group.campaign_status.bulk_value())
                .set(Column::AdGroupStatus, ad_group.ad_group_status.bulk_value());
        }
    }
    row
}

/// Keyword row; campaign negatives leave the Ad Group cell blank
fn keyword_row(campaign: &Campaign, ad_group: &AdGroup, keyword: &Keyword) -> BulkRow {
    let ad_group_name = if keyword.match_type.is_campaign_scoped() {
        ""
    } else {
        ad_group.name.as_str()
    };

    let mut row = BulkRow::new();
    row.set(Column::Campaign, campaign.name.as_str())
        .set(Column::AdGroup, ad_group_name)
        .set(Column::Keyword, keyword.text.as_str())
        .set(Column::CriterionType, keyword.match_type.as_str());
    row
}

/// All rows one campaign contributes to a document using `schema`
pub fn campaign_rows(campaign: &Campaign, schema: Schema) -> Vec<BulkRow> {
    let with_settings = schema == Schema::NewCampaign && campaign.campaign_type == CampaignType::New;

    let mut rows = Vec::new();
    if with_settings {
        rows.push(campaign_settings_row(campaign));
    }
    for ad_group in &campaign.ad_groups {
        if with_settings {
            rows.push(ad_group_settings_row(campaign, ad_group));
        }
        rows.push(ad_row(campaign, ad_group, schema));
        for keyword in &ad_group.keywords {
            rows.push(keyword_row(campaign, ad_group, keyword));
        }
    }
    rows
}

/// Header plus every data row, as positioned cells
pub fn export_table(campaigns: &[Campaign]) -> Result<Vec<Vec<String>>, ExportError> {
    if campaigns.is_empty() {
        return Err(ExportError::NoCampaigns);
    }
    validate_final_urls(campaigns)?;

    let schema = document_schema(campaigns);
    debug!("Exporting {} campaigns with the {} layout", campaigns.len(), schema.name());

    let mut table = vec![schema.headers().iter().map(|h| h.to_string()).collect()];
    for campaign in campaigns {
        for row in campaign_rows(campaign, schema) {
            table.push(row.render(schema)?);
        }
    }
    Ok(table)
}

/// Render the campaigns as a BOM-prefixed CSV document
pub fn export_csv(campaigns: &[Campaign]) -> Result<String, ExportError> {
    let table = export_table(campaigns)?;
    let lines: Vec<String> = table.iter().map(|cells| format::join_record(cells)).collect();
    info!("Exported {} data rows", lines.len() - 1);
    Ok(format::to_document(&lines))
}

/// Render the campaigns and name the file after `date`
pub fn export_document(campaigns: &[Campaign], date: NaiveDate) -> Result<ExportDocument, ExportError> {
    Ok(ExportDocument {
        filename: export_filename(date),
        contents: export_csv(campaigns)?,
    })
}
