use brokerdesk::application::forms::{DistrictForm, LoginForm};
use brokerdesk::application::media::MediaEdit;
use brokerdesk::application::store::clients;
use brokerdesk::domain::accounting::AccountingFilter;
use brokerdesk::domain::entities::Media;
use brokerdesk::infrastructure::token_store::MemoryTokenStore;
use brokerdesk::{
    connect_with, ApiConfig, ApiError, AppConfig, Backend, Detail, OutputConfig, PageRequest,
    SessionConfig, TokenStore,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_config(server: &MockServer) -> AppConfig {
    AppConfig {
        api: ApiConfig {
            base_url: format!("{}/api/", server.uri()),
            media_url: None,
            timeout_secs: 5,
            page_size: 10,
        },
        session: SessionConfig::default(),
        output: OutputConfig::default(),
    }
}

fn make_backend(server: &MockServer, token: Option<&str>) -> (Backend, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(match token {
        Some(t) => MemoryTokenStore::with_token(t),
        None => MemoryTokenStore::default(),
    });
    let backend = connect_with(&make_config(server), tokens.clone()).unwrap();
    (backend, tokens)
}

#[tokio::test]
async fn test_fetch_sends_bearer_token_and_page_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/clients/"))
        .and(header("authorization", "Bearer tok-1"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 7, "full_name": "Bek", "budget": "150000.00"}],
            "count": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, _) = make_backend(&server, Some("tok-1"));
    let mut store = clients(backend.transport.clone());
    let items = store.fetch(&PageRequest::new(2, 10)).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].budget, Some(150000.0));
    assert_eq!(store.state().count, 11);
    assert_eq!(backend.perf().requests(), 1);
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Authentication credentials were not provided."
        })))
        .mount(&server)
        .await;

    let (backend, tokens) = make_backend(&server, Some("expired"));
    let mut store = brokerdesk::application::store::deals(backend.transport.clone());
    let err = store.fetch(&PageRequest::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.login_redirect(), Some("/login"));
    assert!(tokens.load().is_none());
    assert!(store.state().error.is_some());
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn test_forbidden_is_permission_denied() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/clients/3/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (backend, tokens) = make_backend(&server, Some("tok"));
    let err = clients(backend.transport.clone())
        .delete(3)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::PermissionDenied));
    assert_eq!(
        err.user_message(),
        "У вас нет прав для выполнения этого действия"
    );
    // 403 keeps the session
    assert_eq!(tokens.load().as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_field_errors_from_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/clients/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "phone": ["A user with that phone already exists."]
        })))
        .mount(&server)
        .await;

    let (backend, _) = make_backend(&server, Some("tok"));
    let mut store = clients(backend.transport.clone());
    let err = store
        .create(&json!({"full_name": "Bek", "phone": "+998901234567"}))
        .await
        .unwrap_err();

    match &err {
        ApiError::Backend { status, .. } => assert_eq!(*status, 400),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        err.field_errors().unwrap().get("phone").unwrap()[0],
        "Пользователь с таким телефоном уже существует"
    );
}

#[tokio::test]
async fn test_non_json_error_uses_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/land/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>upstream</html>"))
        .mount(&server)
        .await;

    let (backend, _) = make_backend(&server, Some("tok"));
    let err = brokerdesk::application::store::lands(backend.transport.clone())
        .fetch(&PageRequest::default())
        .await
        .unwrap_err();

    match err {
        ApiError::Backend { status, detail } => {
            assert_eq!(status, 502);
            assert_eq!(detail, Detail::Message("Bad Gateway".into()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Reserve a free port, then release it so nothing answers there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let cfg = AppConfig {
        api: ApiConfig {
            base_url: format!("http://{addr}/api/"),
            media_url: None,
            timeout_secs: 5,
            page_size: 10,
        },
        session: SessionConfig::default(),
        output: OutputConfig::default(),
    };

    let backend = connect_with(&cfg, Arc::new(MemoryTokenStore::default())).unwrap();
    let err = backend
        .accounting()
        .load(&AccountingFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.user_message(), "Ошибка сети. Проверьте подключение");
}

#[tokio::test]
async fn test_login_posts_form_and_stores_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_string_contains("phone=%2B998901234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, tokens) = make_backend(&server, None);
    let form = LoginForm {
        phone: "+998901234567".into(),
        password: "secret".into(),
    };
    backend.session().login(&form).await.unwrap();
    assert_eq!(tokens.load().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_wrong_password_shows_backend_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, tokens) = make_backend(&server, None);
    let form = LoginForm {
        phone: "+998901234567".into(),
        password: "wrong".into(),
    };
    let err = backend.session().login(&form).await.unwrap_err();

    match &err {
        ApiError::Unauthorized { detail } => assert_eq!(
            detail.as_deref(),
            Some("No active account found with the given credentials")
        ),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.user_message(), "Неверный телефон или пароль");
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_accounting_fails_when_stats_fail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/accounting/records/"))
        .and(query_param("date_from", "2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 1, "kind": "income", "amount": 100.0, "date": "2024-01-05"}],
            "count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounting/stats/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "stats unavailable"})),
        )
        .mount(&server)
        .await;

    let (backend, _) = make_backend(&server, Some("tok"));
    let filter = AccountingFilter {
        date_from: Some("2024-01-01".parse().unwrap()),
        date_to: None,
    };
    let err = backend.accounting().load(&filter).await.unwrap_err();
    assert_eq!(err.user_message(), "stats unavailable");
}

#[tokio::test]
async fn test_media_edit_deletes_then_uploads_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/district/media/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/district/9/"))
        .and(body_string_contains("filename=\"plan.png\""))
        .and(body_string_contains("Chilonzor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "Chilonzor"})))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, _) = make_backend(&server, Some("tok"));
    let mut edit = MediaEdit::new(vec![Media {
        id: 4,
        file: "/media/old.png".into(),
    }]);
    edit.mark_for_deletion(4);
    edit.attach_bytes("plan.png", b"PNG-plan".to_vec());

    let form = DistrictForm {
        name: "Chilonzor".into(),
    };
    let updated = backend
        .media_editor()
        .submit("district", 9, &form, &edit)
        .await
        .unwrap();
    assert_eq!(updated["name"], "Chilonzor");
    assert_eq!(backend.perf().requests(), 2);
}
