//! Search URL construction tests

use chrono::NaiveDate;
use doffin::crawler::query::{search_params, QueryBuilder};
use doffin::models::SearchFilter;
use proptest::prelude::*;
use url::Url;

fn builder() -> QueryBuilder {
    QueryBuilder::new("https://doffin.no").unwrap()
}

fn query_pairs(url: &str) -> Vec<(String, String)> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn test_search_url_scenario() {
    let filter = SearchFilter::new().query("API").county("Oslo").page(2);
    let url = builder().build_search_url(&filter).unwrap();

    assert_eq!(url, "https://doffin.no/search?q=API&county=Oslo&page=2");
}

#[test]
fn test_first_page_has_no_page_param() {
    let url = builder()
        .build_search_url(&SearchFilter::new().query("API"))
        .unwrap();
    assert!(!url.contains("page="));
}

#[test]
fn test_values_round_trip_through_encoding() {
    let filter = SearchFilter::new()
        .query("rådgivning & drift")
        .buyer("Bærum kommune")
        .published_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .cpv(["72000000", "79400000"]);

    let url = builder().build_search_url(&filter).unwrap();
    let pairs = query_pairs(&url);

    assert_eq!(
        pairs,
        vec![
            ("q".to_string(), "rådgivning & drift".to_string()),
            ("buyer".to_string(), "Bærum kommune".to_string()),
            ("publishedFrom".to_string(), "2024-01-01".to_string()),
            ("cpvCodesLabel".to_string(), "72000000,79400000".to_string()),
        ]
    );
}

#[test]
fn test_inverted_date_range_rejected() {
    let filter = SearchFilter::new()
        .published_from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        .published_to(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

    assert!(builder().build_search_url(&filter).is_err());
}

fn filter_strategy() -> impl Strategy<Value = SearchFilter> {
    (
        proptest::option::of("[a-zA-Z0-9æøåÆØÅ &/?=]{0,20}"),
        proptest::option::of("[a-zA-Z ]{0,12}"),
        proptest::collection::vec("[0-9]{8}", 0..4),
        1u32..50,
    )
        .prop_map(|(query, county, cpv, page)| SearchFilter {
            query,
            county,
            cpv_codes: cpv,
            page,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn prop_search_url_is_deterministic(filter in filter_strategy()) {
        let first = builder().build_search_url(&filter).unwrap();
        let second = builder().build_search_url(&filter.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_page_param_only_after_first_page(filter in filter_strategy()) {
        let url = builder().build_search_url(&filter).unwrap();
        let page = query_pairs(&url)
            .into_iter()
            .find(|(name, _)| name == "page")
            .map(|(_, value)| value);

        if filter.page > 1 {
            prop_assert_eq!(page, Some(filter.page.to_string()));
        } else {
            prop_assert_eq!(page, None);
        }
    }

    #[test]
    fn prop_no_empty_values(filter in filter_strategy()) {
        for (name, value) in search_params(&filter) {
            prop_assert!(!value.is_empty(), "{} is empty", name);
        }
    }
}
