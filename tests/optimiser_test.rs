mod common;

use common::{http_error, ScriptedService};
use rsa_builder::optimiser::TITLE_MAX_LEN;
use rsa_builder::FeedOptimiser;
use serde_json::json;
use uuid::Uuid;

const FEED: &str = "id\ttitle\tdescription\tbrand\tcolor\n\
                    1\tPegasus\tRunning shoe\tNike\tBlack\n\
                    2\tAir Max\t\tNike\t\n\
                    3\tSuperstar\tTrainer\tAdidas\tWhite\n";

fn loaded() -> (FeedOptimiser, Vec<Uuid>) {
    let mut optimiser = FeedOptimiser::new();
    optimiser.load(FEED).unwrap();
    let ids = optimiser.feed().unwrap().rows().iter().map(|r| r.id).collect();
    (optimiser, ids)
}

#[tokio::test]
async fn optimised_title_is_written_to_the_row() {
    let (mut optimiser, ids) = loaded();
    let service = ScriptedService::replying(json!({ "title": "Nike Pegasus Running Shoes - Black" }));

    let title = optimiser.optimise_title(&service, ids[0]).await.unwrap();
    assert_eq!(title, "Nike Pegasus Running Shoes - Black");
    let feed = optimiser.feed().unwrap();
    assert_eq!(feed.get(ids[0], "title"), Some("Nike Pegasus Running Shoes - Black"));
    assert_eq!(feed.get(ids[0], "description"), Some("Running shoe"));
    assert_eq!(optimiser.status.success.as_deref(), Some("Title optimised successfully!"));

    let request = &service.requests()[0];
    assert!(request.user.contains("CURRENT TITLE: Pegasus"));
    assert!(request.user.contains("Brand: Nike\nColor: Black\nSize: N/A\nMaterial: N/A"));
    assert_eq!(request.schema.fields[0].name, "title");
}

#[tokio::test]
async fn long_titles_are_clamped() {
    let (mut optimiser, ids) = loaded();
    let service = ScriptedService::replying(json!({ "title": "x".repeat(400) }));
    let title = optimiser.optimise_title(&service, ids[1]).await.unwrap();
    assert_eq!(title.chars().count(), TITLE_MAX_LEN);
}

#[tokio::test]
async fn missing_field_leaves_the_row_alone() {
    let (mut optimiser, ids) = loaded();
    let service = ScriptedService::replying(json!({ "headline": "wrong shape" }));
    assert!(optimiser.optimise_description(&service, ids[0]).await.is_err());
    assert_eq!(optimiser.feed().unwrap().get(ids[0], "description"), Some("Running shoe"));
    assert!(optimiser
        .status
        .error
        .as_deref()
        .unwrap()
        .starts_with("Failed to optimise description"));
}

#[tokio::test]
async fn batch_runs_in_selection_order_and_reports_each_row() {
    let (mut optimiser, ids) = loaded();
    optimiser.toggle_selection(ids[2]);
    optimiser.toggle_selection(ids[0]);

    let service = ScriptedService::new(vec![
        Err(http_error(503)),
        Ok(json!({ "description": "A lightweight running shoe with responsive cushioning." })),
    ]);
    let outcomes = optimiser.optimise_selected_descriptions(&service).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].row_id, ids[2]);
    assert!(outcomes[0].result.is_err());
    assert_eq!(outcomes[1].row_id, ids[0]);
    assert!(outcomes[1].result.is_ok());

    let feed = optimiser.feed().unwrap();
    assert_eq!(feed.get(ids[2], "description"), Some("Trainer"));
    assert_eq!(
        feed.get(ids[0], "description"),
        Some("A lightweight running shoe with responsive cushioning.")
    );
    assert_eq!(optimiser.status.error.as_deref(), Some("Optimised 1 of 2 descriptions"));

    let requests = service.requests();
    assert!(requests[0].user.contains("CURRENT DESCRIPTION: Trainer"));
    assert!(requests[1].user.contains("CURRENT DESCRIPTION: Running shoe"));
}

#[tokio::test]
async fn optimising_without_a_feed_fails() {
    let mut optimiser = FeedOptimiser::new();
    let service = ScriptedService::new(vec![]);
    assert!(optimiser.optimise_title(&service, Uuid::new_v4()).await.is_err());
    assert_eq!(service.call_count(), 0);
}

#[test]
fn manual_edits_and_export() {
    let (mut optimiser, ids) = loaded();
    optimiser.update_row(ids[1], "color", "Red").unwrap();
    assert!(optimiser.update_row(ids[1], "colour", "Red").is_err());

    let date = chrono::NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
    let document = optimiser.export(date).unwrap();
    assert!(document.contents.contains("2\tAir Max\t\tNike\tRed"));
    assert_eq!(optimiser.status.success.as_deref(), Some("Feed exported successfully!"));
}

#[tokio::test]
async fn feed_without_the_field_makes_no_calls() {
    let mut optimiser = FeedOptimiser::new();
    optimiser.load("id\tbrand\n1\tNike\n2\tAdidas\n").unwrap();
    optimiser.select_all();

    let service = ScriptedService::new(vec![]);
    let outcomes = optimiser.optimise_selected_titles(&service).await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.result.is_err()));
    assert_eq!(service.call_count(), 0);
}

#[test]
fn selecting_a_row_twice_keeps_it_selected() {
    let (mut optimiser, ids) = loaded();
    assert!(optimiser.select(ids[1]));
    assert!(!optimiser.select(ids[1]));
    assert_eq!(optimiser.selection(), &[ids[1]]);
}
