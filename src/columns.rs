//! Google Ads bulk-upload column layouts.
//!
//! Rows are assembled as named [`Column`] values and positioned by one
//! declarative index table per [`Schema`]. The header tables below are the
//! exact header rows the bulk-upload tooling recognizes.

use crate::error::ExportError;
use std::fmt;

/// Header row of the full layout used when the upload creates campaigns
pub const NEW_CAMPAIGN_HEADERS: [&str; 134] = [
    "Campaign", "Labels", "Campaign Type", "Networks", "Budget", "Budget type",
    "Standard conversion goals", "Customer acquisition", "Languages", "Bid Strategy Type",
    "Bid Strategy Name", "Ad location", "Target impression share", "Maximum CPC bid limit",
    "Start Date", "End Date", "Broad match keywords", "Ad Schedule", "Ad rotation",
    "Content exclusions", "Targeting method", "Exclusion method", "Audience targeting",
    "Flexible Reach", "AI Max", "Text customization", "Final URL expansion",
    "Ad Group", "Max CPC", "Max CPM", "Target CPA", "Max CPV", "Target CPV",
    "Percent CPC", "Target CPM", "Target ROAS", "Target CPC", "Desktop Bid Modifier",
    "Mobile Bid Modifier", "Tablet Bid Modifier", "TV Screen Bid Modifier", "Display Network Custom Bid Type",
    "Optimized targeting", "Strict age and gender targeting", "Search term matching",
    "Ad Group Type", "Channels", "Audience name", "Age demographic", "Gender demographic",
    "Income demographic", "Parental status demographic", "Remarketing audience segments",
    "Interest categories", "Life events", "Custom audience segments", "Detailed demographics",
    "Remarketing audience exclusions", "Tracking template", "Final URL suffix",
    "Custom parameters", "ID", "Location", "Reach", "Location groups", "Radius",
    "Unit", "Bid Modifier", "Account keyword type", "Keyword", "Criterion Type",
    "Final URL", "Final mobile URL", "Link source", "Business name", "Ad type",
    "Headline 1", "Headline 1 position", "Headline 2", "Headline 2 position",
    "Headline 3", "Headline 3 position", "Headline 4", "Headline 4 position",
    "Headline 5", "Headline 5 position", "Headline 6", "Headline 6 position",
    "Headline 7", "Headline 7 position", "Headline 8", "Headline 8 position",
    "Headline 9", "Headline 9 position", "Headline 10", "Headline 10 position",
    "Headline 11", "Headline 11 position", "Headline 12", "Headline 12 position",
    "Headline 13", "Headline 13 position", "Headline 14", "Headline 14 position",
    "Headline 15", "Headline 15 position", "Description 1", "Description 1 position",
    "Description 2", "Description 2 position", "Description 3", "Description 3 position",
    "Description 4", "Description 4 position", "Path 1", "Path 2", "Shared set name",
    "Shared set type", "Keyword count", "Link Text", "Description Line 1", "Description Line 2",
    "Upgraded extension", "Source", "Callout text", "Phone Number", "Country of Phone",
    "Conversion Action", "Campaign Status", "Ad Group Status", "Status", "Approval Status",
    "Ad strength", "Comment",
];

/// Header row of the ad-level layout used for campaigns that already exist
pub const EXISTING_CAMPAIGN_HEADERS: [&str; 57] = [
    "Campaign", "Ad Group", "Ad type", "Labels", "Headline 1", "Headline 1 position",
    "Headline 2", "Headline 2 position", "Headline 3", "Headline 3 position",
    "Headline 4", "Headline 4 position", "Headline 5", "Headline 5 position",
    "Headline 6", "Headline 6 position", "Headline 7", "Headline 7 position",
    "Headline 8", "Headline 8 position", "Headline 9", "Headline 9 position",
    "Headline 10", "Headline 10 position", "Headline 11", "Headline 11 position",
    "Headline 12", "Headline 12 position", "Headline 13", "Headline 13 position",
    "Headline 14", "Headline 14 position", "Headline 15", "Headline 15 position",
    "Description 1", "Description 1 position", "Description 2", "Description 2 position",
    "Description 3", "Description 3 position", "Description 4", "Description 4 position",
    "Path 1", "Path 2", "Final URL", "Final mobile URL", "Tracking template",
    "Final URL suffix", "Custom parameters", "Campaign Status", "Ad Group Status",
    "Status", "Approval Status", "Ad strength", "Comment", "Keyword", "Criterion Type",
];

/// A named bulk-upload column
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Column {
    Campaign,
    Labels,
    CampaignType,
    Networks,
    Budget,
    BudgetType,
    Languages,
    BidStrategyType,
    BroadMatchKeywords,
    AdRotation,
    TargetingMethod,
    ExclusionMethod,
    AiMax,
    AdGroup,
    MaxCpc,
    MaxCpm,
    TargetCpv,
    TargetCpm,
    TrackingTemplate,
    FinalUrlSuffix,
    CustomParameters,
    Keyword,
    CriterionType,
    FinalUrl,
    FinalMobileUrl,
    AdType,
    /// Headline text, 0-indexed slot
    Headline(usize),
    HeadlinePosition(usize),
    /// Description text, 0-indexed slot
    Description(usize),
    DescriptionPosition(usize),
    Path1,
    Path2,
    CampaignStatus,
    AdGroupStatus,
    Status,
    ApprovalStatus,
    AdStrength,
    Comment,
}

impl Column {
    /// Every column, including each headline and description slot
    pub fn all() -> Vec<Column> {
        use Column::*;
        let mut columns = vec![
            Campaign, Labels, CampaignType, Networks, Budget, BudgetType, Languages,
            BidStrategyType, BroadMatchKeywords, AdRotation, TargetingMethod, ExclusionMethod,
            AiMax, AdGroup, MaxCpc, MaxCpm, TargetCpv, TargetCpm, TrackingTemplate,
            FinalUrlSuffix, CustomParameters, Keyword, CriterionType, FinalUrl, FinalMobileUrl,
            AdType, Path1, Path2, CampaignStatus, AdGroupStatus, Status, ApprovalStatus,
            AdStrength, Comment,
        ];
        for i in 0..crate::models::HEADLINE_SLOTS {
            columns.push(Headline(i));
            columns.push(HeadlinePosition(i));
        }
        for i in 0..crate::models::DESCRIPTION_SLOTS {
            columns.push(Description(i));
            columns.push(DescriptionPosition(i));
        }
        columns
    }

    /// The header cell this column sits under
    pub fn header_name(&self) -> String {
        let name = match self {
            Column::Headline(i) => return format!("Headline {}", i + 1),
            Column::HeadlinePosition(i) => return format!("Headline {} position", i + 1),
            Column::Description(i) => return format!("Description {}", i + 1),
            Column::DescriptionPosition(i) => return format!("Description {} position", i + 1),
            Column::Campaign => "Campaign",
            Column::Labels => "Labels",
            Column::CampaignType => "Campaign Type",
            Column::Networks => "Networks",
            Column::Budget => "Budget",
            Column::BudgetType => "Budget type",
            Column::Languages => "Languages",
            Column::BidStrategyType => "Bid Strategy Type",
            Column::BroadMatchKeywords => "Broad match keywords",
            Column::AdRotation => "Ad rotation",
            Column::TargetingMethod => "Targeting method",
            Column::ExclusionMethod => "Exclusion method",
            Column::AiMax => "AI Max",
            Column::AdGroup => "Ad Group",
            Column::MaxCpc => "Max CPC",
            Column::MaxCpm => "Max CPM",
            Column::TargetCpv => "Target CPV",
            Column::TargetCpm => "Target CPM",
            Column::TrackingTemplate => "Tracking template",
            Column::FinalUrlSuffix => "Final URL suffix",
            Column::CustomParameters => "Custom parameters",
            Column::Keyword => "Keyword",
            Column::CriterionType => "Criterion Type",
            Column::FinalUrl => "Final URL",
            Column::FinalMobileUrl => "Final mobile URL",
            Column::AdType => "Ad type",
            Column::Path1 => "Path 1",
            Column::Path2 => "Path 2",
            Column::CampaignStatus => "Campaign Status",
            Column::AdGroupStatus => "Ad Group Status",
            Column::Status => "Status",
            Column::ApprovalStatus => "Approval Status",
            Column::AdStrength => "Ad strength",
            Column::Comment => "Comment",
        };
        name.to_string()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_name())
    }
}

/// A bulk-upload layout
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Schema {
    /// 134 columns, campaign and ad group settings included
    NewCampaign,
    /// Ad-level columns only, for campaigns already in the account
    ExistingCampaign,
}

impl Schema {
    pub fn name(self) -> &'static str {
        match self {
            Schema::NewCampaign => "new-campaign",
            Schema::ExistingCampaign => "existing-campaign",
        }
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Schema::NewCampaign => &NEW_CAMPAIGN_HEADERS,
            Schema::ExistingCampaign => &EXISTING_CAMPAIGN_HEADERS,
        }
    }

    pub fn width(self) -> usize {
        self.headers().len()
    }

    /// Position of a column in this layout, if the layout carries it
    pub fn index(self, column: Column) -> Option<usize> {
        match self {
            Schema::NewCampaign => new_campaign_index(column),
            Schema::ExistingCampaign => existing_campaign_index(column),
        }
    }
}

fn new_campaign_index(column: Column) -> Option<usize> {
    use crate::models::{DESCRIPTION_SLOTS, HEADLINE_SLOTS};
    let index = match column {
        Column::Campaign => 0,
        Column::Labels => 1,
        Column::CampaignType => 2,
        Column::Networks => 3,
        Column::Budget => 4,
        Column::BudgetType => 5,
        Column::Languages => 8,
        Column::BidStrategyType => 9,
        Column::BroadMatchKeywords => 16,
        Column::AdRotation => 18,
        Column::TargetingMethod => 20,
        Column::ExclusionMethod => 21,
        Column::AiMax => 24,
        Column::AdGroup => 27,
        Column::MaxCpc => 28,
        Column::MaxCpm => 29,
        Column::TargetCpv => 32,
        Column::TargetCpm => 34,
        Column::TrackingTemplate => 58,
        Column::FinalUrlSuffix => 59,
        Column::CustomParameters => 60,
        Column::Keyword => 69,
        Column::CriterionType => 70,
        Column::FinalUrl => 71,
        Column::FinalMobileUrl => 72,
        Column::AdType => 75,
        Column::Headline(i) if i < HEADLINE_SLOTS => 76 + i * 2,
        Column::HeadlinePosition(i) if i < HEADLINE_SLOTS => 77 + i * 2,
        Column::Description(i) if i < DESCRIPTION_SLOTS => 106 + i * 2,
        Column::DescriptionPosition(i) if i < DESCRIPTION_SLOTS => 107 + i * 2,
        Column::Path1 => 114,
        Column::Path2 => 115,
        Column::CampaignStatus => 128,
        Column::AdGroupStatus => 129,
        Column::Status => 130,
        Column::ApprovalStatus => 131,
        Column::AdStrength => 132,
        Column::Comment => 133,
        _ => return None,
    };
    Some(index)
}

fn existing_campaign_index(column: Column) -> Option<usize> {
    use crate::models::{DESCRIPTION_SLOTS, HEADLINE_SLOTS};
    let index = match column {
        Column::Campaign => 0,
        Column::AdGroup => 1,
        Column::AdType => 2,
        Column::Labels => 3,
        Column::Headline(i) if i < HEADLINE_SLOTS => 4 + i * 2,
        Column::HeadlinePosition(i) if i < HEADLINE_SLOTS => 5 + i * 2,
        Column::Description(i) if i < DESCRIPTION_SLOTS => 34 + i * 2,
        Column::DescriptionPosition(i) if i < DESCRIPTION_SLOTS => 35 + i * 2,
        Column::Path1 => 42,
        Column::Path2 => 43,
        Column::FinalUrl => 44,
        Column::FinalMobileUrl => 45,
        Column::TrackingTemplate => 46,
        Column::FinalUrlSuffix => 47,
        Column::CustomParameters => 48,
        Column::CampaignStatus => 49,
        Column::AdGroupStatus => 50,
        Column::Status => 51,
        Column::ApprovalStatus => 52,
        Column::AdStrength => 53,
        Column::Comment => 54,
        Column::Keyword => 55,
        Column::CriterionType => 56,
        _ => return None,
    };
    Some(index)
}

/// One bulk-upload row as named cells; unset columns render empty
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkRow {
    cells: Vec<(Column, String)>,
}

impl BulkRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any earlier value for the same column
    pub fn set(&mut self, column: Column, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
        self
    }

    /// Place every cell at its index in a row as wide as the schema's header
    pub fn render(&self, schema: Schema) -> Result<Vec<String>, ExportError> {
        let mut row = vec![String::new(); schema.width()];
        for (column, value) in &self.cells {
            let index = schema.index(*column).ok_or_else(|| ExportError::UnmappedColumn {
                column: column.header_name(),
                schema: schema.name(),
            })?;
            row[index] = value.clone();
        }
        Ok(row)
    }
}
