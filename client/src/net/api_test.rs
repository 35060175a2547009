use super::*;
use crate::render::{RenderSink, Renderer, ViewNode};
use crate::view::ChatView;

#[test]
fn messages_endpoint_appends_api_path() {
    assert_eq!(messages_endpoint("https://obsidian.example"), "https://obsidian.example/chat/api/messages/");
}

#[test]
fn vote_endpoint_formats_poll_and_option() {
    assert_eq!(vote_endpoint("http://h", 4, 11), "http://h/chat/poll/4/vote/11/");
}

#[test]
fn cookie_header_joins_known_credentials() {
    let session = Session { session_id: Some("abc".into()), csrf_token: Some("tok".into()) };
    assert_eq!(cookie_header(&session).as_deref(), Some("sessionid=abc; csrftoken=tok"));
    assert_eq!(cookie_header(&Session::default()), None);
}

#[test]
fn default_headers_mark_requests_as_ajax() {
    let session = Session { session_id: None, csrf_token: Some("tok".into()) };
    let headers = default_headers(&session).unwrap();
    assert_eq!(headers.get(AJAX_HEADER).unwrap(), "XMLHttpRequest");
    assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok");
    assert_eq!(headers.get(COOKIE).unwrap(), "csrftoken=tok");
}

#[test]
fn default_headers_reject_control_characters() {
    let session = Session { session_id: Some("bad\nvalue".into()), csrf_token: None };
    let err = default_headers(&session).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG_PARSE");
}

#[test]
fn poll_form_numbers_options_from_one() {
    let draft = PollDraft {
        question: "Куда идём?".into(),
        multiple_choice: true,
        options: vec!["Кино".into(), "Парк".into(), "Домой".into()],
    };
    let fields = poll_form(&draft);
    assert_eq!(
        fields,
        vec![
            ("question".to_owned(), "Куда идём?".to_owned()),
            ("multiple_choice".to_owned(), "on".to_owned()),
            ("option1".to_owned(), "Кино".to_owned()),
            ("option2".to_owned(), "Парк".to_owned()),
            ("option3".to_owned(), "Домой".to_owned()),
        ]
    );
}

#[test]
fn poll_form_omits_unchecked_multiple_choice() {
    let draft = PollDraft { question: "q".into(), multiple_choice: false, options: vec!["a".into(), "b".into()] };
    assert!(poll_form(&draft).iter().all(|(k, _)| k != "multiple_choice"));
}

#[test]
fn parse_messages_page_reads_cursor_and_flag() {
    let page = parse_messages_page(
        r#"{"messages":[{"type":"message","id":3,"author":"a","content":"x","created_at":"10:00","message_type":"text"}],"last_id":3,"has_more":true}"#,
    )
    .unwrap();
    assert_eq!(page.last_id, Some(3));
    assert!(page.has_more);
    assert_eq!(page.messages.len(), 1);
}

#[test]
fn parse_messages_page_rejects_non_json() {
    let err = parse_messages_page("<html>502</html>").unwrap_err();
    assert_eq!(err.error_code(), "E_PARSE");
}

#[test]
fn parse_submit_response_accepts_success() {
    let body = parse_submit_response(r#"{"success":true,"message":"ok","message_id":77}"#).unwrap();
    assert_eq!(body.message_id, Some(77));
}

#[test]
fn parse_submit_response_surfaces_server_error() {
    let err = parse_submit_response(r#"{"success":false,"error":"Ошибка в форме"}"#).unwrap_err();
    assert!(matches!(err, SyncError::Rejected(ref text) if text == "Ошибка в форме"));
}

#[test]
fn parse_submit_response_without_error_text() {
    let err = parse_submit_response(r#"{"success":false}"#).unwrap_err();
    assert_eq!(err.to_string(), "server rejected request: unknown error");
}

#[test]
fn http_chat_api_builds_from_default_config() {
    let api = HttpChatApi::new(&SyncConfig::default(), &Session::default()).unwrap();
    assert_eq!(api.base_url, "http://127.0.0.1:8000");
}

#[test]
fn portal_older_page_renders_chronologically_above_view() {
    let body = r#"{"messages":[
        {"type":"date_separator","date":"01.03.2026","date_readable":"1 марта 2026"},
        {"type":"message","id":3,"author":"a","content":"c","created_at":"09:00","message_type":"text"},
        {"type":"message","id":4,"author":"a","content":"d","created_at":"09:05","message_type":"text"},
        {"type":"message","id":5,"author":"a","content":"e","created_at":"09:10","message_type":"text"}
    ],"last_id":0,"has_more":true}"#;
    let page = parse_messages_page(body).unwrap().into_older();
    let mut view = ChatView::default();

    let inserted = Renderer::default().prepend_page(&mut view, &page.items);

    assert_eq!(inserted, 4);
    assert!(matches!(view.nodes()[0], ViewNode::DateSeparator(_)));
    assert_eq!(view.message_ids(), vec![3, 4, 5]);
    assert_eq!(view.first_message_id(), Some(3));
}
