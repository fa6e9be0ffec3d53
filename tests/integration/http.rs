use recur::http::HttpRetryOptions;
use recur::{MaxAttemptsPolicy, RetryPolicyExt, RetryTemplate};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}

#[tokio::test]
async fn server_errors_are_retried() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;
    let url = format!("{}/hello", server.uri());

    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("world"))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let template = RetryTemplate::new(
        MaxAttemptsPolicy::default().retry_if(HttpRetryOptions::default().predicate()),
    );
    let body = template
        .execute_async(|| fetch(&client, &url))
        .await
        .unwrap();
    assert_eq!(body, "world");
}

#[tokio::test]
async fn client_errors_are_not_retried_by_default() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;
    let url = format!("{}/hello", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let template = RetryTemplate::new(
        MaxAttemptsPolicy::default().retry_if(HttpRetryOptions::default().predicate()),
    );
    let err = template
        .execute_async(|| fetch(&client, &url))
        .await
        .unwrap_err();
    assert_eq!(err.attempts, 1);
    assert_eq!(err.last.status(), Some(reqwest::StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn client_errors_retried_when_enabled() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;
    let url = format!("{}/hello", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(409))
        .expect(3)
        .mount(&server)
        .await;

    let options = HttpRetryOptions {
        retry_on_client_error: true,
        ..Default::default()
    };
    let client = reqwest::Client::new();
    let template =
        RetryTemplate::new(MaxAttemptsPolicy::new(2).unwrap().retry_if(options.predicate()));
    let err = template
        .execute_async(|| fetch(&client, &url))
        .await
        .unwrap_err();
    assert_eq!(err.attempts, 3);
}

#[tokio::test]
async fn too_many_requests_is_always_retried() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;
    let url = format!("{}/hello", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let template = RetryTemplate::new(
        MaxAttemptsPolicy::default().retry_if(HttpRetryOptions::default().predicate()),
    );
    let body = template
        .execute_async(|| fetch(&client, &url))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

async fn fetch_with(options: HttpRetryOptions, client: &reqwest::Client, url: &str) -> u32 {
    let template =
        RetryTemplate::new(MaxAttemptsPolicy::new(2).unwrap().retry_if(options.predicate()));
    let err = template
        .execute_async(|| fetch(client, url))
        .await
        .unwrap_err();
    err.attempts
}

#[tokio::test]
async fn timeouts_follow_the_timeout_switch() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;
    let url = format!("{}/slow", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let attempts = fetch_with(HttpRetryOptions::default(), &client, &url).await;
    assert_eq!(attempts, 3);

    let options = HttpRetryOptions {
        retry_on_timeout: false,
        ..Default::default()
    };
    let attempts = fetch_with(options, &client, &url).await;
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn connect_failures_follow_the_connect_switch() {
    let _ = env_logger::try_init();
    let url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}/hello", listener.local_addr().unwrap())
    };
    let client = reqwest::Client::new();

    let attempts = fetch_with(HttpRetryOptions::default(), &client, &url).await;
    assert_eq!(attempts, 3);

    let options = HttpRetryOptions {
        retry_on_connect: false,
        ..Default::default()
    };
    let attempts = fetch_with(options, &client, &url).await;
    assert_eq!(attempts, 1);
}
