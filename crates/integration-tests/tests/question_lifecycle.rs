use domains::{
    CreateOutcome, DomainError, ErrorKind, PageQuery, QuestionFilter, QuestionPolicy, SortOrder,
};
use integration_tests::TestApp;

fn inbox() -> PageQuery {
    PageQuery::default()
}

fn filtered(filter: QuestionFilter) -> PageQuery {
    PageQuery {
        filter: Some(filter),
        ..Default::default()
    }
}

#[tokio::test]
async fn sent_question_lands_in_recipient_inbox() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});

    let outcome = app.send(a, b, "hello").await.unwrap();
    assert!(matches!(outcome, CreateOutcome::Created(_)));

    let page = app.service.get_all_questions(b, inbox()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].content, "hello");
    assert!(!page.items[0].is_replied);
    assert_eq!(page.items[0].sent_by.as_ref().unwrap().nick, "alice");
    assert_eq!(app.user(a).posts_limit, 29);
    assert_eq!(app.user(a).last_publish_at, Some(integration_tests::start_time()));

    let outbox = app
        .service
        .get_all_questions(a, filtered(QuestionFilter::Sent))
        .await
        .unwrap();
    assert_eq!(outbox.total, 1);
}

#[tokio::test]
async fn sending_to_self_is_rejected_without_side_effects() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});

    let err = app.send(a, a, "me?").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidTarget));
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    assert!(app.questions.is_empty());
    assert_eq!(app.user(a).posts_limit, 30);
}

#[tokio::test]
async fn shadow_banned_sender_gets_a_ghost_post() {
    let mut app = TestApp::new();
    let a = app.add_user("ghost", |u| u.is_shadow_banned = true);
    let b = app.add_user("bob", |u| u.enable_email_notifications = true);

    let outcome = app.send(a, b, "boo").await.unwrap();
    assert_eq!(outcome, CreateOutcome::Suppressed);
    assert!(app.questions.is_empty());
    assert_eq!(app.user(a).posts_limit, 29);

    for filter in [
        QuestionFilter::All,
        QuestionFilter::Sent,
        QuestionFilter::Replied,
    ] {
        for viewer in [a, b] {
            let page = app
                .service
                .get_all_questions(viewer, filtered(filter))
                .await
                .unwrap();
            assert!(page.items.is_empty());
        }
    }
    assert!(app.no_notice().await);
}

#[tokio::test]
async fn only_the_author_may_delete() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});
    let c = app.add_user("carol", |_| {});

    let id = app.send(c, b, "from carol").await.unwrap().question_id().unwrap();

    let err = app.service.delete_question(id, a).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
    let err = app.service.delete_question(id, b).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    app.service.delete_question(id, c).await.unwrap();
    assert!(app.questions.get(id).is_none());

    let err = app.service.delete_question(id, c).await.unwrap_err();
    assert!(matches!(err, DomainError::QuestionNotFound));
}

#[tokio::test]
async fn anonymous_author_is_hidden_but_still_authorized() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});

    let id = app
        .send_anonymous(a, b, "guess who")
        .await
        .unwrap()
        .question_id()
        .unwrap();

    for viewer in [a, b] {
        let view = app.service.find_question_by_id(id, viewer).await.unwrap();
        assert!(view.is_anonymous);
        assert!(view.sent_by.is_none());
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains(&a.to_string()));
        assert!(!json.contains("alice"));
    }

    let page = app.service.get_all_questions(b, inbox()).await.unwrap();
    assert!(page.items[0].sent_by.is_none());

    assert_eq!(app.questions.get(id).unwrap().sent_by, a);
    app.service.delete_question(id, a).await.unwrap();
}

#[tokio::test]
async fn named_question_lookup_carries_profiles_and_history() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});
    let id = app.send(a, b, "hey").await.unwrap().question_id().unwrap();
    app.service.reply_question(id, "yo".into(), b).await.unwrap();
    app.service
        .edit_question_reply(id, "hello!".into(), b)
        .await
        .unwrap();

    let view = app.service.find_question_by_id(id, a).await.unwrap();
    let author = view.sent_by.unwrap();
    assert_eq!(author.id, a);
    assert_eq!(author.nick, "alice");
    assert_eq!(view.send_to.unwrap().id, b);
    assert_eq!(view.replies_history.unwrap().len(), 2);

    let json = serde_json::to_string(&app.service.find_question_by_id(id, b).await.unwrap())
        .unwrap();
    assert!(!json.contains("alice@example.com"));
}

#[tokio::test]
async fn outsiders_cannot_view() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});
    let c = app.add_user("carol", |_| {});
    let id = app.send(a, b, "private").await.unwrap().question_id().unwrap();

    let err = app.service.find_question_by_id(id, c).await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn hiding_is_one_way() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});
    let id = app.send(a, b, "meh").await.unwrap().question_id().unwrap();

    let err = app.service.hide_question(id, a).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    app.service.hide_question(id, b).await.unwrap();
    let err = app.service.hide_question(id, b).await.unwrap_err();
    assert!(matches!(err, DomainError::AlreadyHidden));

    let page = app.service.get_all_questions(b, inbox()).await.unwrap();
    assert!(page.items.is_empty());
    assert!(app.questions.get(id).unwrap().is_hidden_by_receiver);
}

#[tokio::test]
async fn pagination_honours_sort_and_page_size() {
    let app = TestApp::with_policy(QuestionPolicy {
        page_size: 2,
        ..Default::default()
    });
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});
    for i in 0..5 {
        app.send(a, b, &format!("q{i}")).await.unwrap();
        app.clock.advance(chrono::Duration::minutes(1));
    }

    let first = app.service.get_all_questions(b, inbox()).await.unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.page, 1);
    let contents: Vec<_> = first.items.iter().map(|q| q.content.as_str()).collect();
    assert_eq!(contents, ["q0", "q1"]);

    let newest = app
        .service
        .get_all_questions(
            b,
            PageQuery {
                page: Some(1),
                sort: Some(SortOrder::Desc),
                filter: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(newest.items[0].content, "q4");

    let last = app
        .service
        .get_all_questions(
            b,
            PageQuery {
                page: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);

    let beyond = app
        .service
        .get_all_questions(
            b,
            PageQuery {
                page: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);
}

#[tokio::test]
async fn recipient_with_notifications_is_notified() {
    let mut app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |u| u.enable_email_notifications = true);

    app.send(a, b, "ping").await.unwrap();
    let notice = app.next_notice().await.expect("notice dispatched");
    assert_eq!(notice.recipient_id, b);
    assert_eq!(notice.recipient_email, "bob@example.com");
    assert_eq!(notice.sender.unwrap().id, a);
    assert_eq!(notice.content, "ping");

    app.send_anonymous(a, b, "psst").await.unwrap();
    let notice = app.next_notice().await.expect("notice dispatched");
    assert!(notice.is_anonymous);
    assert!(notice.sender.is_none());
}

#[tokio::test]
async fn recipient_without_notifications_is_not_notified() {
    let mut app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});

    app.send(a, b, "quiet").await.unwrap();
    assert!(app.no_notice().await);
}

#[tokio::test]
async fn notification_failure_does_not_fail_creation() {
    let app = TestApp::with_failing_notifier();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |u| u.enable_email_notifications = true);

    let outcome = app.send(a, b, "still here").await.unwrap();
    assert!(outcome.question_id().is_some());
    assert_eq!(app.questions.len(), 1);
}

#[tokio::test]
async fn unknown_recipient_is_not_found() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});

    let err = app
        .send(a, domains::UserId::new(), "anyone?")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UserNotFound));
    assert_eq!(app.user(a).posts_limit, 30);
}

#[tokio::test]
async fn overlong_content_is_a_validation_error() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});

    let err = app.send(a, b, &"x".repeat(251)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.reason_code(), "validation.invalid");
    app.send(a, b, &"x".repeat(250)).await.unwrap();
}

#[tokio::test]
async fn blank_but_non_empty_content_is_accepted() {
    let app = TestApp::new();
    let a = app.add_user("alice", |_| {});
    let b = app.add_user("bob", |_| {});

    let id = app.send(a, b, "   ").await.unwrap().question_id().unwrap();
    app.service.reply_question(id, " ".into(), b).await.unwrap();
    assert_eq!(app.questions.get(id).unwrap().reply.as_deref(), Some(" "));

    let err = app.send(a, b, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
