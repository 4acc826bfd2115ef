mod common;

use auto24_api::{Auto24Client, Auto24Config, ClientSession, SearchQuery};
use mockito::{Matcher, Server};
use tempfile::TempDir;

use common::{listing_page, test_config, SAMPLE_STATE};

#[tokio::test]
async fn saved_session_is_reused_by_new_client() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();

    let first_visit = server
        .mock("GET", Matcher::Regex("^/fr/voitures/s".to_string()))
        .match_header("cookie", Matcher::Missing)
        .with_status(200)
        .with_header("set-cookie", "sid=abc123; Path=/; HttpOnly")
        .with_body(listing_page(SAMPLE_STATE))
        .expect(1)
        .create_async()
        .await;
    let return_visit = server
        .mock("GET", Matcher::Regex("^/fr/voitures/s".to_string()))
        .match_header("cookie", "sid=abc123")
        .with_status(200)
        .with_body(listing_page(SAMPLE_STATE))
        .expect(1)
        .create_async()
        .await;

    let mut first = Auto24Client::new(test_config(&server.url(), &tmp)).unwrap();
    first.search(&SearchQuery::new()).await.unwrap();
    first_visit.assert_async().await;

    let session_path = first.session_path().to_path_buf();
    assert!(session_path.is_file());
    let saved = ClientSession::load(&session_path).unwrap().unwrap();
    assert_eq!(saved.state(), first.session().state());
    assert_eq!(saved.cookies().len(), 1);
    assert_eq!(saved.cookies()[0].value, "abc123");

    let mut second = Auto24Client::new(test_config(&server.url(), &tmp)).unwrap();
    assert_eq!(second.session().headers(), first.session().headers());
    assert_eq!(second.session().cookies(), first.session().cookies());

    second.search(&SearchQuery::new()).await.unwrap();
    return_visit.assert_async().await;
}

#[tokio::test]
async fn session_not_written_when_disabled() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();

    let mock = server
        .mock("GET", Matcher::Any)
        .with_status(200)
        .with_header("set-cookie", "sid=abc123; Path=/")
        .with_body(listing_page(SAMPLE_STATE))
        .expect(1)
        .create_async()
        .await;

    let config = Auto24Config {
        use_session: false,
        ..test_config(&server.url(), &tmp)
    };
    let session_path = config.session_file_path();
    let mut client = Auto24Client::new(config).unwrap();
    client.search(&SearchQuery::new()).await.unwrap();

    mock.assert_async().await;
    assert!(!session_path.exists());
    // still kept in memory for the lifetime of the client
    assert_eq!(client.session().cookies().len(), 1);
}

#[tokio::test]
async fn corrupt_session_file_starts_fresh() {
    let tmp = TempDir::new().unwrap();
    let config = test_config("http://127.0.0.1:9", &tmp);
    let path = config.session_file_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ broken").unwrap();

    let client = Auto24Client::new(config).unwrap();
    assert!(client.session().cookies().is_empty());
    assert!(client.session().headers().contains_key("User-Agent"));
}
