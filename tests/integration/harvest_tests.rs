//! Integration tests for the harvest pipeline
//!
//! These tests serve item pages from a wiremock server, replace the browser
//! with a renderer that returns a canned listing, and check what ends up in
//! a real SQLite database.

use async_trait::async_trait;
use reel_harvest::config::Config;
use reel_harvest::harvest::{HarvestOutcome, Harvester, PaginationPlan, RenderError, Renderer};
use reel_harvest::search::SearchFilter;
use reel_harvest::storage::{SqliteStorage, Storage, StorageError, StorageResult, StoredRecord};
use reel_harvest::{HarvestError, Record};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer double that returns a listing linking to the given hrefs
struct ListingRenderer {
    hrefs: Vec<String>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl ListingRenderer {
    fn new(hrefs: &[&str]) -> Self {
        Self {
            hrefs: hrefs.iter().map(|h| h.to_string()).collect(),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the listing URLs this renderer was asked for
    fn requested(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requested)
    }
}

#[async_trait]
impl Renderer for ListingRenderer {
    async fn render_listing(&self, url: &str, _plan: &PaginationPlan) -> Result<String, RenderError> {
        self.requested.lock().unwrap().push(url.to_string());

        let mut html = String::from("<html><body><ul>");
        for href in &self.hrefs {
            html.push_str(&format!(
                r#"<li class="ipc-metadata-list-summary-item"><div><a class="ipc-title-link-wrapper" href="{}"><h3>entry</h3></a></div></li>"#,
                href
            ));
        }
        html.push_str("</ul></body></html>");
        Ok(html)
    }
}

/// Store that rejects every write
struct BrokenStorage;

impl Storage for BrokenStorage {
    fn create_schema(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn upsert_record(&mut self, _record: &Record) -> StorageResult<bool> {
        Err(StorageError::Database("disk is full".to_string()))
    }

    fn get_record_by_name(&self, _name: &str) -> StorageResult<Option<StoredRecord>> {
        Ok(None)
    }

    fn list_records(&self) -> StorageResult<Vec<StoredRecord>> {
        Ok(Vec::new())
    }

    fn count_records(&self) -> StorageResult<u64> {
        Ok(0)
    }
}

fn movie_page(name: &str, year: &str, rating: &str, summary: &str, director: &str) -> String {
    format!(
        r#"<html><body><main>
            <section>
                <h1 data-testid="hero__pageTitle"><span>{name}</span></h1>
                <ul><li><a href="/releaseinfo">{year}</a></li><li>PG-13</li></ul>
            </section>
            <div data-testid="hero-rating-bar__aggregate-rating__score"><span>{rating}</span><span>/10</span></div>
            <p data-testid="plot"><span>{summary}</span></p>
            <div class="credits"><ul>
                <li data-testid="title-pc-principal-credit"><span>Director</span><div><ul><li><a href="/name/nm1">{director}</a></li></ul></div></li>
                <li data-testid="title-pc-principal-credit"><span>Writers</span><div><ul><li><a href="/name/nm2">Some Writer</a></li></ul></div></li>
                <li data-testid="title-pc-principal-credit"><span>Stars</span><div><ul><li><a href="/name/nm3">Lead Actor</a></li><li><a href="/name/nm4">Second Actor</a></li></ul></div></li>
            </ul></div>
        </main></body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer, dir: &TempDir, concurrency: usize) -> Config {
    let mut config = Config::default();
    config.catalog.base_url = server.uri();
    config.fetch.delay_ms = 0;
    config.fetch.concurrency = concurrency;
    config.fetch.request_timeout_secs = 5;
    config.output.database_path = dir.path().join("movies.db").to_string_lossy().to_string();
    config
}

fn open_storage(config: &Config) -> SqliteStorage {
    SqliteStorage::new(std::path::Path::new(&config.output.database_path))
        .expect("Failed to open database")
}

#[tokio::test]
async fn test_keyword_harvest_stores_every_item() {
    let server = MockServer::start().await;
    mount_page(&server, "/title/tt1/", 200, movie_page("Dune", "1984", "6.3", "Spice.", "David Lynch")).await;
    mount_page(&server, "/title/tt2/", 200, movie_page("Dune: Part One", "2021", "8.0", "Arrakis.", "Denis Villeneuve")).await;
    mount_page(&server, "/title/tt3/", 200, movie_page("Dune: Part Two", "2024", "8.5", "Fremen.", "Denis Villeneuve")).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 3);
    let renderer = ListingRenderer::new(&["/title/tt1/", "/title/tt2/", "/title/tt3/"]);
    let harvester = Harvester::from_config(&config, renderer, open_storage(&config)).unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("dune"), 10, 3)
        .await
        .unwrap();

    let stats = match outcome {
        HarvestOutcome::Completed(stats) => stats,
        other => panic!("Expected a completed harvest, got {:?}", other),
    };
    assert_eq!(stats.dispatched, 3);
    assert_eq!(stats.received, 3);
    assert_eq!(stats.stored, 3);

    drop(harvester);
    let storage = open_storage(&config);
    assert_eq!(storage.count_records().unwrap(), 3);

    let part_two = storage.get_record_by_name("Dune: Part Two").unwrap().unwrap();
    assert_eq!(part_two.record.released_year, "2024");
    assert_eq!(part_two.record.rating, "8.5");
    assert_eq!(part_two.record.summary, "Fremen.");
    assert_eq!(part_two.record.directors, vec!["Denis Villeneuve".to_string()]);
    assert_eq!(
        part_two.record.cast,
        vec!["Lead Actor".to_string(), "Second Actor".to_string()]
    );
    assert!(storage
        .list_records()
        .unwrap()
        .iter()
        .all(|s| !s.record.name.is_empty()));
}

#[tokio::test]
async fn test_listing_url_carries_filter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);

    let renderer = ListingRenderer::new(&[]);
    let requested = renderer.requested();
    let harvester = Harvester::from_config(&config, renderer, open_storage(&config)).unwrap();
    let genres = vec!["Sci-Fi".to_string()];
    let filter = SearchFilter::new("Sci-Fi", "desert planet", &genres).unwrap();

    let outcome = harvester.run(&filter, 5, 2).await.unwrap();
    assert_eq!(outcome, HarvestOutcome::NoMatches);

    let requested = requested.lock().unwrap();
    assert_eq!(requested.len(), 1);
    assert_eq!(
        requested[0],
        format!(
            "{}/search/title/?title_type=feature&genres=Sci-Fi&keywords=desert+planet",
            server.uri()
        )
    );
}

#[tokio::test]
async fn test_failed_fetch_is_absorbed() {
    let server = MockServer::start().await;
    mount_page(&server, "/title/tt1/", 200, movie_page("Arrival", "2016", "7.9", "Language.", "Denis Villeneuve")).await;
    mount_page(&server, "/title/tt2/", 500, "Internal Server Error".to_string()).await;
    mount_page(&server, "/title/tt3/", 200, movie_page("Sicario", "2015", "7.6", "Border.", "Denis Villeneuve")).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);
    let renderer = ListingRenderer::new(&["/title/tt1/", "/title/tt2/", "/title/tt3/"]);
    let harvester = Harvester::from_config(&config, renderer, open_storage(&config)).unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("villeneuve"), 10, 2)
        .await
        .unwrap();

    let HarvestOutcome::Completed(stats) = outcome else {
        panic!("Expected a completed harvest");
    };
    assert_eq!(stats.received, 3);
    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.stored, 2);

    let storage = harvester.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_records().unwrap(), 2);
    assert!(storage.get_record_by_name("Arrival").unwrap().is_some());
    assert!(storage.get_record_by_name("Sicario").unwrap().is_some());
}

#[tokio::test]
async fn test_unreachable_item_host_is_absorbed() {
    let server = MockServer::start().await;
    mount_page(&server, "/title/tt1/", 200, movie_page("Enemy", "2013", "6.9", "Doubles.", "Denis Villeneuve")).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);
    let renderer = ListingRenderer::new(&["/title/tt1/", "http://127.0.0.1:9/title/tt2/"]);
    let harvester = Harvester::from_config(&config, renderer, open_storage(&config)).unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("enemy"), 10, 2)
        .await
        .unwrap();

    let HarvestOutcome::Completed(stats) = outcome else {
        panic!("Expected a completed harvest");
    };
    assert_eq!(stats.received, 2);
    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.stored, 1);
}

#[tokio::test]
async fn test_empty_listing_is_no_matches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);

    let harvester =
        Harvester::from_config(&config, ListingRenderer::new(&[]), open_storage(&config)).unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("no-such-movie-anywhere"), 10, 2)
        .await
        .unwrap();

    assert_eq!(outcome, HarvestOutcome::NoMatches);
    assert_eq!(open_storage(&config).count_records().unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_name_keeps_first_values() {
    let server = MockServer::start().await;
    mount_page(&server, "/title/tt1/", 200, movie_page("Solaris", "1972", "8.0", "Original.", "Andrei Tarkovsky")).await;
    mount_page(&server, "/title/tt2/", 200, movie_page("Solaris", "2002", "6.2", "Remake.", "Steven Soderbergh")).await;

    let dir = TempDir::new().unwrap();
    // One fetch in flight at a time keeps delivery in listing order
    let config = test_config(&server, &dir, 1);
    let renderer = ListingRenderer::new(&["/title/tt1/", "/title/tt2/"]);
    let harvester = Harvester::from_config(&config, renderer, open_storage(&config)).unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("solaris"), 10, 1)
        .await
        .unwrap();

    let HarvestOutcome::Completed(stats) = outcome else {
        panic!("Expected a completed harvest");
    };
    assert_eq!(stats.stored, 1);
    assert_eq!(stats.duplicates, 1);

    let storage = harvester.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_records().unwrap(), 1);
    let solaris = storage.get_record_by_name("Solaris").unwrap().unwrap();
    assert_eq!(solaris.record.released_year, "1972");
    assert_eq!(solaris.record.summary, "Original.");
    assert_eq!(solaris.record.directors, vec!["Andrei Tarkovsky".to_string()]);
}

#[tokio::test]
async fn test_result_cap_limits_fetches() {
    let server = MockServer::start().await;
    for i in 1..=5 {
        mount_page(
            &server,
            &format!("/title/tt{}/", i),
            200,
            movie_page(&format!("Movie {}", i), "2000", "5.0", "Plot.", "Someone"),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);
    let hrefs: Vec<String> = (1..=5).map(|i| format!("/title/tt{}/", i)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    let harvester =
        Harvester::from_config(&config, ListingRenderer::new(&href_refs), open_storage(&config))
            .unwrap();

    let outcome = harvester
        .run(&SearchFilter::keyword_only("movie"), 2, 2)
        .await
        .unwrap();

    let HarvestOutcome::Completed(stats) = outcome else {
        panic!("Expected a completed harvest");
    };
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.stored, 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let storage = harvester.storage();
    let names: Vec<String> = storage
        .lock()
        .unwrap()
        .list_records()
        .unwrap()
        .into_iter()
        .map(|s| s.record.name)
        .collect();
    assert!(names.contains(&"Movie 1".to_string()));
    assert!(names.contains(&"Movie 2".to_string()));
}

#[tokio::test]
async fn test_store_failure_aborts_harvest() {
    let server = MockServer::start().await;
    let hrefs: Vec<String> = (1..=20).map(|i| format!("/title/tt{}/", i)).collect();
    for (i, href) in hrefs.iter().enumerate() {
        mount_page(
            &server,
            href,
            200,
            movie_page(&format!("Movie {}", i + 1), "2000", "5.0", "Plot.", "Someone"),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 1);
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    let harvester =
        Harvester::from_config(&config, ListingRenderer::new(&href_refs), BrokenStorage).unwrap();

    let result = harvester
        .run(&SearchFilter::keyword_only("movie"), 20, 1)
        .await;

    match result {
        Err(HarvestError::Storage(StorageError::Database(message))) => {
            assert_eq!(message, "disk is full");
        }
        other => panic!("Expected a storage error, got {:?}", other),
    }

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.len() < 20,
        "fetching continued after the store failed ({} requests)",
        requests.len()
    );
}
