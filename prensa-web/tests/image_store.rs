use prensa_web::ImageStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_stores_the_image_under_its_url_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/portada.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    let url = format!("{}/media/portada.jpg?w=1200", server.uri());
    let stored = store.fetch(&url).await.expect("download succeeds");

    assert_eq!(stored, dir.path().join("portada.jpg"));
    assert_eq!(std::fs::read(&stored).unwrap(), b"jpeg-bytes");
}

#[tokio::test]
async fn fetch_failures_return_none_instead_of_erroring() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    let url = format!("{}/media/missing.jpg", server.uri());
    assert!(store.fetch(&url).await.is_none());
}
