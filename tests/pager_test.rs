mod common;

use common::{harness, logged_in};
use serde::Deserialize;
use serde_json::{Value, json};
use spotcli::{
    error::{Error, PagerBoundary},
    spotify::Pager,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: String,
}

fn page(offset: u32, count: u32, total: Option<u32>) -> Value {
    let items: Vec<Value> = (offset..offset + count)
        .map(|i| json!({"id": format!("item-{i}")}))
        .collect();
    match total {
        Some(total) => json!({"items": items, "total": total}),
        None => json!({"items": items}),
    }
}

async fn mount_page(server: &MockServer, limit: u32, offset: u32, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .and(query_param("limit", limit.to_string()))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_next_visits_every_offset_once() {
    let server = MockServer::start().await;
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 1).await;
    mount_page(&server, 10, 10, page(10, 10, Some(25)), 1).await;
    mount_page(&server, 10, 20, page(20, 5, Some(25)), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let mut pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    let mut visited = vec![pager.offset()];
    loop {
        match pager.next().await.unwrap() {
            Ok(items) => {
                assert!(!items.is_empty());
                visited.push(pager.offset());
            }
            Err(boundary) => {
                assert_eq!(boundary, PagerBoundary::LimitReached);
                break;
            }
        }
    }

    assert_eq!(visited, vec![0, 10, 20]);
    assert_eq!(pager.items().len(), 5);
    assert_eq!(pager.items()[0].id, "item-20");
    assert_eq!(pager.total(), Some(25));
}

#[tokio::test]
async fn test_previous_at_first_page_is_a_boundary() {
    let server = MockServer::start().await;
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let mut pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    let before = pager.items().to_vec();

    let step = pager.previous().await.unwrap();

    assert_eq!(step.unwrap_err(), PagerBoundary::PreviousUnavailable);
    assert_eq!(pager.offset(), 0);
    assert_eq!(pager.items(), before.as_slice());
    assert!(!pager.has_previous());
}

#[tokio::test]
async fn test_previous_moves_back_one_page() {
    let server = MockServer::start().await;
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 2).await;
    mount_page(&server, 10, 10, page(10, 10, Some(25)), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let mut pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    pager.next().await.unwrap().unwrap();
    assert_eq!(pager.offset(), 10);

    let items = pager.previous().await.unwrap().unwrap().to_vec();

    assert_eq!(items[0].id, "item-0");
    assert_eq!(pager.offset(), 0);
}

#[tokio::test]
async fn test_failed_fetch_does_not_move_cursor() {
    let server = MockServer::start().await;
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("token")));

    let mut pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    let before = pager.items().to_vec();

    let err = pager.next().await.unwrap_err();

    assert!(matches!(err, Error::Api { .. }));
    assert_eq!(pager.offset(), 0);
    assert_eq!(pager.items(), before.as_slice());
    assert!(pager.has_next());
}

#[tokio::test]
async fn test_without_total_a_short_page_is_the_last() {
    let server = MockServer::start().await;
    mount_page(&server, 2, 0, page(0, 2, None), 1).await;
    mount_page(&server, 2, 2, page(2, 1, None), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let mut pager = Pager::<Item>::new(&h.client, "me/playlists", 2).await.unwrap();
    assert!(pager.has_next());
    pager.next().await.unwrap().unwrap();

    let step = pager.next().await.unwrap();

    assert_eq!(step.unwrap_err(), PagerBoundary::LimitReached);
    assert_eq!(pager.offset(), 2);
    assert_eq!(pager.total(), None);
}

#[tokio::test]
async fn test_content_concatenates_all_pages_without_moving() {
    let server = MockServer::start().await;
    // the first page is only fetched once, by `new`
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 1).await;
    mount_page(&server, 10, 10, page(10, 10, Some(25)), 1).await;
    mount_page(&server, 10, 20, page(20, 5, Some(25)), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    let content = pager.content().await.unwrap();

    assert_eq!(content.len(), 25);
    assert_eq!(content[0].id, "item-0");
    assert_eq!(content[24].id, "item-24");
    assert_eq!(pager.offset(), 0);
}

#[tokio::test]
async fn test_content_stops_at_short_page_before_total() {
    let server = MockServer::start().await;
    mount_page(&server, 10, 0, page(0, 10, Some(25)), 1).await;
    mount_page(&server, 10, 10, page(10, 3, Some(25)), 1).await;
    mount_page(&server, 10, 20, page(20, 5, Some(25)), 0).await;
    let h = harness(&server, Some(logged_in("token")));

    let pager = Pager::<Item>::new(&h.client, "me/playlists", 10).await.unwrap();
    let content = pager.content().await.unwrap();

    assert_eq!(content.len(), 13);
    assert_eq!(content[12].id, "item-12");
}

#[tokio::test]
async fn test_raw_pager_keeps_response() {
    let server = MockServer::start().await;
    mount_page(&server, 5, 0, page(0, 3, Some(3)), 1).await;
    let h = harness(&server, Some(logged_in("token")));

    let pager = Pager::<Value>::new(&h.client, "me/playlists", 5).await.unwrap();

    assert_eq!(pager.raw()["total"], 3);
    assert!(!pager.has_next());
    assert_eq!(pager.content().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_zero_limit_is_rejected() {
    let server = MockServer::start().await;
    let h = harness(&server, Some(logged_in("token")));

    let result = Pager::<Item>::new(&h.client, "me/playlists", 0).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
