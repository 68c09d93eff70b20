//! 텔레그램 전송 HTTP 테스트 (mockito 서버 사용).

use chartwatch_notification::{
    Notification, NotificationError, NotificationEvent, NotificationSender, TelegramConfig,
    TelegramSender,
};
use mockito::Matcher;

fn sender(server: &mockito::Server) -> TelegramSender {
    let config = TelegramConfig::new("TOKEN".to_string(), "42".to_string())
        .with_api_base(server.url());
    TelegramSender::new(config)
}

fn notification() -> Notification {
    Notification::new(NotificationEvent::Custom {
        title: "테스트".to_string(),
        message: "hello".to_string(),
    })
}

#[tokio::test]
async fn test_send_message_posts_chat_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/botTOKEN/sendMessage")
        .match_body(Matcher::PartialJsonString(
            r#"{"chat_id":"42","parse_mode":"HTML"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"ok":true,"result":{}}"#)
        .create_async()
        .await;

    sender(&server).send(&notification()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/botTOKEN/sendMessage")
        .with_status(429)
        .with_body(r#"{"ok":false,"error_code":429,"parameters":{"retry_after":7}}"#)
        .create_async()
        .await;

    let err = sender(&server).send(&notification()).await.unwrap_err();
    assert!(matches!(err, NotificationError::RateLimited(7)));
}

#[tokio::test]
async fn test_server_error_is_send_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/botTOKEN/sendMessage")
        .with_status(500)
        .with_body("oops")
        .create_async()
        .await;

    let err = sender(&server).send(&notification()).await.unwrap_err();
    assert!(matches!(err, NotificationError::SendFailed(_)));
}
