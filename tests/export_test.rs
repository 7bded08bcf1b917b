use rsa_builder::columns::{Schema, EXISTING_CAMPAIGN_HEADERS, NEW_CAMPAIGN_HEADERS};
use rsa_builder::error::ExportError;
use rsa_builder::export::{export_csv, export_table};
use rsa_builder::models::{Campaign, CampaignType, Keyword, MatchType, Status};

fn minimal_campaign() -> Campaign {
    let mut campaign = Campaign::new("Campaign 1");
    let ad_group = &mut campaign.ad_groups[0];
    ad_group.final_url = "https://example.com".to_string();
    ad_group.set_headline(0, "Buy Now", Some(1)).unwrap();
    campaign
}

#[test]
fn minimal_new_campaign_export() {
    let csv = export_csv(&[minimal_campaign()]).unwrap();
    let body = csv.strip_prefix('\u{feff}').expect("BOM prefix");
    let lines: Vec<&str> = body.split('\n').collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], NEW_CAMPAIGN_HEADERS.join(","));

    let table = export_table(&[minimal_campaign()]).unwrap();
    assert!(table.iter().all(|row| row.len() == Schema::NewCampaign.width()));
    let ad = &table[3];
    assert_eq!(ad[75], "Responsive search ad");
    assert_eq!(ad[76], "Buy Now");
    assert_eq!(ad[77], "1");
    assert_eq!(ad[78], "");
    assert_eq!(ad[79], "");
    assert_eq!(ad[71], "https://example.com");
    assert_eq!(ad[130], "Enabled");
}

#[test]
fn campaign_negatives_leave_the_ad_group_blank() {
    let mut campaign = minimal_campaign();
    campaign.ad_groups[0].keywords = vec![
        Keyword::new("trail shoes", MatchType::Exact),
        Keyword::new("free", MatchType::CampaignNegativePhrase),
        Keyword::new("used", MatchType::NegativeExact),
    ];

    let table = export_table(&[campaign]).unwrap();
    let keywords = &table[4..];
    assert_eq!(keywords.len(), 3);

    assert_eq!(keywords[0][27], "Ad Group 1");
    assert_eq!(keywords[0][69], "trail shoes");
    assert_eq!(keywords[0][70], "Exact");

    assert_eq!(keywords[1][0], "Campaign 1");
    assert_eq!(keywords[1][27], "");
    assert_eq!(keywords[1][70], "Campaign Negative Phrase");

    assert_eq!(keywords[2][27], "Ad Group 1");
    assert_eq!(keywords[2][70], "Negative Exact");
}

#[test]
fn missing_final_url_blocks_the_whole_export() {
    let mut second = Campaign::new("Brand");
    second.ad_groups[0].final_url = String::new();
    let err = export_csv(&[minimal_campaign(), second]).unwrap_err();
    assert_eq!(err, ExportError::MissingFinalUrl(vec!["Brand / Ad Group 1".to_string()]));
    assert!(err.to_string().contains("Brand / Ad Group 1"));
}

#[test]
fn cells_with_commas_and_quotes_are_escaped() {
    let mut campaign = minimal_campaign();
    campaign.ad_groups[0]
        .set_headline(1, "Widget, \"Pro\"", None)
        .unwrap();
    let csv = export_csv(&[campaign]).unwrap();
    assert!(csv.contains(",\"Widget, \"\"Pro\"\"\","));
}

#[test]
fn paused_status_is_written_literally() {
    let mut campaign = minimal_campaign();
    campaign.ad_groups[0].ad_group_status = Status::Paused;
    let table = export_table(&[campaign]).unwrap();
    assert_eq!(table[2][129], "Paused");

    let mut existing = minimal_campaign();
    existing.campaign_type = CampaignType::Existing;
    existing.ad_groups[0].campaign_status = Status::Paused;
    let table = export_table(&[existing]).unwrap();
    assert_eq!(table[0], EXISTING_CAMPAIGN_HEADERS.to_vec());
    assert_eq!(table[1][49], "Paused");
    assert_eq!(table[1][4], "Buy Now");
    assert_eq!(table[1][5], "1");
}

#[test]
fn campaigns_survive_a_json_round_trip() {
    let mut campaign = minimal_campaign();
    campaign.ad_groups[0].keywords.push(Keyword::new("boots", MatchType::CampaignNegativeExact));
    let json = serde_json::to_string(&[campaign.clone()]).unwrap();
    let back: Vec<Campaign> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, vec![campaign]);
    assert!(json.contains("\"Campaign Negative Exact\""));
}
