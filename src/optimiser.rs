use crate::error::{BuilderError, FeedError, GenerationError, Result};
use crate::export::ExportDocument;
use crate::feed::Feed;
use crate::generation::{clamp, GenerationRequest, GenerationService};
use crate::prompts;
use crate::status::{DebugLog, Status};
use chrono::NaiveDate;
use uuid::Uuid;

/// Merchant Center limit for product titles
pub const TITLE_MAX_LEN: usize = 150;

/// Merchant Center limit for product descriptions
pub const DESCRIPTION_MAX_LEN: usize = 5000;

/// Attributes offered to the model when nothing else is chosen
pub const DEFAULT_ATTRIBUTES: [&str; 4] = ["brand", "color", "size", "material"];

/// Which feed attributes are listed in optimisation prompts
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationSettings {
    pub selected_attributes: Vec<String>,
    pub include_in_title: bool,
    pub include_in_description: bool,
}

impl Default for OptimisationSettings {
    fn default() -> Self {
        OptimisationSettings {
            selected_attributes: DEFAULT_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
            include_in_title: true,
            include_in_description: true,
        }
    }
}

/// The field an optimisation pass rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedField {
    Title,
    Description,
}

impl FeedField {
    pub fn key(self) -> &'static str {
        match self {
            FeedField::Title => "title",
            FeedField::Description => "description",
        }
    }

    fn max_len(self) -> usize {
        match self {
            FeedField::Title => TITLE_MAX_LEN,
            FeedField::Description => DESCRIPTION_MAX_LEN,
        }
    }
}

/// Result of one row in a batch optimisation
#[derive(Debug)]
pub struct RowOutcome {
    pub row_id: Uuid,
    pub result: Result<String>,
}

/// A feed editing session
#[derive(Debug, Default)]
pub struct FeedOptimiser {
    feed: Option<Feed>,
    /// selected row ids in the order they were picked
    selection: Vec<Uuid>,
    pub settings: OptimisationSettings,
    pub status: Status,
    pub debug_log: DebugLog,
}

impl FeedOptimiser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self) -> Option<&Feed> {
        self.feed.as_ref()
    }

    pub fn selection(&self) -> &[Uuid] {
        &self.selection
    }

    fn loaded(&self) -> Result<&Feed> {
        self.feed.as_ref().ok_or_else(|| FeedError::NotLoaded.into())
    }

    fn loaded_mut(&mut self) -> Result<&mut Feed> {
        self.feed.as_mut().ok_or_else(|| FeedError::NotLoaded.into())
    }

    fn failed<T>(&mut self, message: String, error: impl Into<BuilderError>) -> Result<T> {
        self.debug_log.push(&message);
        self.status.fail(message);
        Err(error.into())
    }

    /// Parse and install a feed, clearing the selection.
    ///
    /// On a parse failure the previous feed stays loaded.
    pub fn load(&mut self, content: &str) -> Result<usize> {
        match Feed::parse(content) {
            Ok(feed) => {
                let products = feed.len();
                self.feed = Some(feed);
                self.selection.clear();
                let message = format!("Successfully loaded {} products", products);
                self.debug_log.push(&message);
                self.status.succeed(message);
                Ok(products)
            }
            Err(e) => self.failed(
                format!("Failed to parse file. Please ensure it's a valid TSV file. ({})", e),
                e,
            ),
        }
    }

    pub fn update_row(&mut self, row_id: Uuid, key: &str, value: &str) -> Result<()> {
        let updated = self.loaded_mut().and_then(|feed| Ok(feed.set(row_id, key, value)?));
        updated.or_else(|e| self.failed(e.to_string(), e))
    }

    /// Flip a row's selection; returns whether it is now selected
    pub fn toggle_selection(&mut self, row_id: Uuid) -> bool {
        if let Some(pos) = self.selection.iter().position(|id| *id == row_id) {
            self.selection.remove(pos);
            false
        } else {
            self.selection.push(row_id);
            true
        }
    }

    /// Add a row to the selection unless it is already there
    pub fn select(&mut self, row_id: Uuid) -> bool {
        if self.selection.contains(&row_id) {
            return false;
        }
        self.selection.push(row_id);
        true
    }

    pub fn select_all(&mut self) {
        self.selection = self
            .feed
            .as_ref()
            .map(|feed| feed.rows().iter().map(|r| r.id).collect())
            .unwrap_or_default();
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    fn request(&self, row_id: Uuid, field: FeedField) -> Result<GenerationRequest> {
        let feed = self.loaded()?;
        let row = feed
            .row(row_id)
            .ok_or_else(|| FeedError::UnknownRow(row_id.to_string()))?;
        if !feed.has_key(field.key()) {
            return Err(FeedError::UnknownColumn(field.key().to_string()).into());
        }

        let include = match field {
            FeedField::Title => self.settings.include_in_title,
            FeedField::Description => self.settings.include_in_description,
        };
        let attributes = if include && !self.settings.selected_attributes.is_empty() {
            prompts::attribute_lines(&self.settings.selected_attributes, |key| feed.value(row, key))
        } else {
            "None provided".to_string()
        };

        let current = feed.value(row, field.key()).unwrap_or("");
        Ok(match field {
            FeedField::Title => prompts::title_request(current, &attributes),
            FeedField::Description => prompts::description_request(current, &attributes),
        })
    }

    /// Rewrite one field of one row and store the result
    pub async fn optimise(
        &mut self,
        service: &dyn GenerationService,
        row_id: Uuid,
        field: FeedField,
    ) -> Result<String> {
        let noun = field.key();
        let request = match self.request(row_id, field) {
            Ok(request) => request,
            Err(e) => return self.failed(format!("Failed to optimise {}: {}", noun, e), e),
        };

        self.debug_log
            .push(format!("Optimising {} for row {} with {}", noun, row_id, service.provider()));
        let content = match service.generate(&request).await {
            Ok(content) => content,
            Err(e) => return self.failed(format!("Failed to optimise {}: {}", noun, e), e),
        };

        let value = clamp(content.string(noun).trim(), field.max_len());
        if value.is_empty() {
            let error = GenerationError::MalformedOutput(format!("missing \"{}\" field", noun));
            return self.failed(format!("Failed to optimise {}: {}", noun, error), error);
        }

        // the row may have gone while the call was in flight
        if let Err(e) = self.loaded_mut().and_then(|feed| Ok(feed.set(row_id, noun, &value)?)) {
            return self.failed(format!("Failed to optimise {}: {}", noun, e), e);
        }

        let mut message = String::from(noun);
        if let Some(first) = message.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        message.push_str(" optimised successfully!");
        self.debug_log.push(&message);
        self.status.succeed(message);
        Ok(value)
    }

    pub async fn optimise_title(&mut self, service: &dyn GenerationService, row_id: Uuid) -> Result<String> {
        self.optimise(service, row_id, FeedField::Title).await
    }

    pub async fn optimise_description(&mut self, service: &dyn GenerationService, row_id: Uuid) -> Result<String> {
        self.optimise(service, row_id, FeedField::Description).await
    }

    /// Optimise every selected row in selection order.
    ///
    /// Each row is awaited before the next starts; failures are reported per
    /// row and never stop the batch.
    pub async fn optimise_selected(&mut self, service: &dyn GenerationService, field: FeedField) -> Vec<RowOutcome> {
        let rows = self.selection.clone();
        let mut outcomes = Vec::with_capacity(rows.len());
        for row_id in rows {
            let result = self.optimise(service, row_id, field).await;
            outcomes.push(RowOutcome { row_id, result });
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        if !outcomes.is_empty() {
            let message = format!(
                "Optimised {} of {} {}s",
                outcomes.len() - failed,
                outcomes.len(),
                field.key()
            );
            self.debug_log.push(&message);
            if failed == 0 {
                self.status.succeed(message);
            } else {
                self.status.fail(message);
            }
        }
        outcomes
    }

    pub async fn optimise_selected_titles(&mut self, service: &dyn GenerationService) -> Vec<RowOutcome> {
        self.optimise_selected(service, FeedField::Title).await
    }

    pub async fn optimise_selected_descriptions(&mut self, service: &dyn GenerationService) -> Vec<RowOutcome> {
        self.optimise_selected(service, FeedField::Description).await
    }

    pub fn export(&mut self, date: NaiveDate) -> Result<ExportDocument> {
        let document = match self.loaded() {
            Ok(feed) => feed.export_document(date),
            Err(e) => return self.failed(e.to_string(), e),
        };
        self.status.succeed("Feed exported successfully!");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "id\ttitle\tbrand\n1\tShoe\tAcme\n2\tBoot\tZed\n";

    #[test]
    fn failed_load_keeps_the_previous_feed() {
        let mut optimiser = FeedOptimiser::new();
        assert_eq!(optimiser.load(FEED).unwrap(), 2);
        assert!(optimiser.load("\n \n").is_err());
        assert_eq!(optimiser.feed().unwrap().len(), 2);
        assert!(optimiser.status.error.is_some());
    }

    #[test]
    fn selection_keeps_pick_order() {
        let mut optimiser = FeedOptimiser::new();
        optimiser.load(FEED).unwrap();
        let ids: Vec<Uuid> = optimiser.feed().unwrap().rows().iter().map(|r| r.id).collect();

        assert!(optimiser.toggle_selection(ids[1]));
        assert!(optimiser.toggle_selection(ids[0]));
        assert_eq!(optimiser.selection(), &[ids[1], ids[0]]);
        assert!(!optimiser.toggle_selection(ids[1]));
        assert_eq!(optimiser.selection(), &[ids[0]]);

        optimiser.select_all();
        assert_eq!(optimiser.selection(), &ids[..]);
        optimiser.deselect_all();
        assert!(optimiser.selection().is_empty());
    }

    #[test]
    fn reload_clears_the_selection() {
        let mut optimiser = FeedOptimiser::new();
        optimiser.load(FEED).unwrap();
        optimiser.select_all();
        optimiser.load(FEED).unwrap();
        assert!(optimiser.selection().is_empty());
    }

    #[test]
    fn prompt_lists_selected_attributes() {
        let mut optimiser = FeedOptimiser::new();
        optimiser.load(FEED).unwrap();
        let id = optimiser.feed().unwrap().rows()[0].id;
        let request = optimiser.request(id, FeedField::Title).unwrap();
        assert!(request.user.contains("CURRENT TITLE: Shoe"));
        assert!(request.user.contains("Brand: Acme\nColor: N/A\nSize: N/A\nMaterial: N/A"));

        optimiser.settings.include_in_title = false;
        let request = optimiser.request(id, FeedField::Title).unwrap();
        assert!(!request.user.contains("Brand: Acme"));
    }

    #[test]
    fn export_requires_a_feed() {
        let mut optimiser = FeedOptimiser::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(optimiser.export(date).is_err());
        assert_eq!(optimiser.status.error.as_deref(), Some("No feed loaded"));

        optimiser.load(FEED).unwrap();
        let document = optimiser.export(date).unwrap();
        assert_eq!(document.filename, "optimised_feed_2025-01-02.tsv");
    }
}
