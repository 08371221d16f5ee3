//! End-to-end pipeline tests: mock export endpoint in, JSON records out

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wikiglean::config::HttpConfig;
use wikiglean::crawler::{Pipeline, PipelineConfig, WikiFetcher};
use wikiglean::models::PageRef;
use wikiglean::storage::{ArticleWriter, RawExportWriter};

fn test_http_config() -> HttpConfig {
    HttpConfig {
        requests_per_second: 1000,
        timeout_secs: 5,
        max_retries: 1,
        cooldown_secs: 0,
        user_agent: "wikiglean-test".to_string(),
    }
}

fn small_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        fetch_workers: 2,
        extract_workers: 1,
        transform_workers: 1,
        raw_writers: 1,
        article_writers: 1,
        page_queue_size: 100,
        stage_queue_size: 100,
    }
}

fn export_xml(title: &str, text: &str) -> String {
    format!(
        "<mediawiki><page><title>{title}</title><ns>0</ns>\
         <revision><text>{text}</text></revision></page></mediawiki>"
    )
}

fn page_ref(name: &str) -> PageRef {
    PageRef {
        name: name.to_string(),
        link: format!("/wiki/{name}"),
    }
}

#[tokio::test]
async fn test_page_flows_through_to_json_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Export/Test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(export_xml("Test", "'''Hi''' [[Category:Demo]]")),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let text_dir = dir.path().join("text_files");
    let xml_dir = dir.path().join("xml_files");

    let fetcher = Arc::new(WikiFetcher::new(&server.uri(), &test_http_config()).unwrap());
    let pipeline = Pipeline::new(
        fetcher,
        small_pipeline_config(),
        ArticleWriter::new(&text_dir).unwrap(),
        Some(RawExportWriter::new(&xml_dir).unwrap()),
    );

    let (page_tx, page_rx) = pipeline.page_channel();
    page_tx.send(page_ref("Test")).await.unwrap();
    drop(page_tx);

    let stats = pipeline.run(page_rx).await.unwrap();
    assert_eq!(stats.pages_fetched, 1);
    assert!(stats.bytes_fetched > 0);
    assert_eq!(stats.pages_extracted, 1);
    assert_eq!(stats.articles_written, 1);
    assert_eq!(stats.raw_written, 1);

    let record = fs::read_to_string(text_dir.join("Test.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(record.trim()).unwrap();
    assert_eq!(parsed["page"], "Test");
    assert_eq!(parsed["sentences"], "Hi");
    assert_eq!(parsed["categories"][0], "Demo");

    let raw = fs::read_to_string(xml_dir.join("Test.xml")).unwrap();
    assert!(raw.contains("<mediawiki>"));
}

#[tokio::test]
async fn test_redirect_stub_produces_no_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Export/Stub"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(export_xml("Stub", "#REDIRECT [[Main topic]]")),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let text_dir = dir.path().join("text_files");

    let fetcher = Arc::new(WikiFetcher::new(&server.uri(), &test_http_config()).unwrap());
    let pipeline = Pipeline::new(
        fetcher,
        small_pipeline_config(),
        ArticleWriter::new(&text_dir).unwrap(),
        None,
    );

    let (page_tx, page_rx) = pipeline.page_channel();
    page_tx.send(page_ref("Stub")).await.unwrap();
    drop(page_tx);

    let stats = pipeline.run(page_rx).await.unwrap();
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.redirects_dropped, 1);
    assert_eq!(stats.articles_written, 0);
    assert!(!text_dir.join("Stub.json").exists());
}

#[tokio::test]
async fn test_existing_record_not_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Export/Test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(export_xml("Test", "fresh text")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let text_dir = dir.path().join("text_files");

    // A record from an earlier run is already on disk.
    fs::create_dir_all(&text_dir).unwrap();
    fs::write(
        text_dir.join("Test.json"),
        "{\"page\":\"Test\",\"sentences\":\"old\",\"categories\":[]}\n",
    )
    .unwrap();

    let fetcher = Arc::new(WikiFetcher::new(&server.uri(), &test_http_config()).unwrap());
    let pipeline = Pipeline::new(
        fetcher,
        small_pipeline_config(),
        ArticleWriter::new(&text_dir).unwrap(),
        None,
    );

    let (page_tx, page_rx) = pipeline.page_channel();
    page_tx.send(page_ref("Test")).await.unwrap();
    drop(page_tx);

    let stats = pipeline.run(page_rx).await.unwrap();
    assert_eq!(stats.articles_written, 0);
    assert_eq!(stats.skipped_existing, 1);

    let record = fs::read_to_string(text_dir.join("Test.json")).unwrap();
    assert!(record.contains("old"));
}

#[tokio::test]
async fn test_failed_fetch_does_not_stall_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Export/Good"))
        .respond_with(ResponseTemplate::new(200).set_body_string(export_xml("Good", "kept")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:Export/Bad"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let text_dir = dir.path().join("text_files");

    let fetcher = Arc::new(WikiFetcher::new(&server.uri(), &test_http_config()).unwrap());
    let pipeline = Pipeline::new(
        fetcher,
        small_pipeline_config(),
        ArticleWriter::new(&text_dir).unwrap(),
        None,
    );

    let (page_tx, page_rx) = pipeline.page_channel();
    page_tx.send(page_ref("Bad")).await.unwrap();
    page_tx.send(page_ref("Good")).await.unwrap();
    drop(page_tx);

    let stats = pipeline.run(page_rx).await.unwrap();
    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.articles_written, 1);
    assert!(text_dir.join("Good.json").exists());
}
