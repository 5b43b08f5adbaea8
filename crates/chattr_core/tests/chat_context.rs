use chattr_core::{
    AppContext, Attachment, ChatError, ContextError, CoreConfig, DecisionError, MessageKind,
};

fn open_context() -> (tempfile::TempDir, AppContext) {
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::open(CoreConfig::new(dir.path())).unwrap();
    (dir, context)
}

#[test]
fn context_opens_both_stores_under_data_dir() {
    let (dir, context) = open_context();

    context.decisions().propose("Keep stores separate", "claude", "").unwrap();
    context.chat().send("claude", "hello", Vec::new(), None).unwrap();

    assert!(dir.path().join("decisions.json").exists());
    assert!(dir.path().join("messages.json").exists());
    assert_eq!(context.decisions().len(), 1);
    assert_eq!(context.messages().len(), 1);
}

#[test]
fn context_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CoreConfig::new(dir.path());
    config.resync_limit = 0;

    let err = AppContext::open(config).err().unwrap();
    assert!(matches!(err, ContextError::Config(_)));
}

#[test]
fn reopened_context_sees_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    {
        let context = AppContext::open(CoreConfig::new(dir.path())).unwrap();
        let created = context.decisions().propose("Persist across runs", "ben", "").unwrap();
        context.decisions().approve(created.id).unwrap();
        context.chat().send("ben", "before restart", Vec::new(), None).unwrap();
    }

    let context = AppContext::open(CoreConfig::new(dir.path())).unwrap();
    assert_eq!(context.decisions().count_proposed(), 0);
    assert_eq!(context.messages().get_recent(1)[0].text, "before restart");
}

#[test]
fn send_trims_text_and_marks_sender_online() {
    let (_dir, context) = open_context();
    let chat = context.chat();

    let message = chat.send("  codex ", "  done with parser  ", Vec::new(), None).unwrap();

    assert_eq!(message.sender, "codex");
    assert_eq!(message.text, "done with parser");
    assert_eq!(message.kind, MessageKind::Chat);
    assert!(chat.is_online("codex"));
    assert_eq!(chat.who(), vec!["codex"]);
}

#[test]
fn send_rejects_blank_input() {
    let (_dir, context) = open_context();
    let chat = context.chat();

    assert!(matches!(
        chat.send("claude", "   ", Vec::new(), None),
        Err(ChatError::EmptyMessage)
    ));
    assert!(matches!(
        chat.send(" ", "hello", Vec::new(), None),
        Err(ChatError::MissingSender)
    ));
    assert!(context.messages().is_empty());
}

#[test]
fn send_allows_attachment_without_text() {
    let (_dir, context) = open_context();
    let attachment = Attachment {
        name: "screen.png".to_string(),
        url: "/uploads/1a2b3c4d.png".to_string(),
    };

    let message = context
        .chat()
        .send("ben", "", vec![attachment.clone()], None)
        .unwrap();
    assert_eq!(message.text, "");
    assert_eq!(message.attachments, vec![attachment]);
}

#[test]
fn send_validates_reply_target() {
    let (_dir, context) = open_context();
    let chat = context.chat();

    let err = chat.send("claude", "replying", Vec::new(), Some(9)).unwrap_err();
    assert!(matches!(err, ChatError::ReplyTargetNotFound(9)));
    assert_eq!(err.to_string(), "message #9 not found");

    let root = chat.send("ben", "question?", Vec::new(), None).unwrap();
    let reply = chat.send("claude", "answer", Vec::new(), Some(root.id)).unwrap();
    assert_eq!(reply.reply_to, Some(root.id));
}

#[test]
fn join_posts_announcement_and_lists_online() {
    let (_dir, context) = open_context();
    let chat = context.chat();

    chat.join("codex").unwrap();
    let online = chat.join("claude").unwrap();

    assert_eq!(online, vec!["claude", "codex"]);
    let feed = context.messages().list_all();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[1].kind, MessageKind::Join);
    assert_eq!(feed[1].text, "claude connected");
    assert!(matches!(chat.join("  "), Err(ChatError::MissingSender)));
}

#[test]
fn chat_read_uses_shared_cursor_tracker() {
    let (_dir, context) = open_context();
    let chat = context.chat();
    for index in 0..3 {
        chat.send("ben", &format!("note {index}"), Vec::new(), None).unwrap();
    }

    assert_eq!(context.read_default("codex").len(), 3);
    assert_eq!(context.cursors().cursor("codex"), 3);
    assert!(chat.read("codex", 0, 20).is_empty());

    let resynced = context.resync_default("codex").unwrap();
    assert_eq!(resynced.len(), 3);
    assert!(matches!(chat.resync("", 5), Err(ChatError::MissingSender)));
}

#[test]
fn decision_errors_render_user_messages() {
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::open(CoreConfig::new(dir.path())).unwrap();

    let err = context.decisions().propose("", "claude", "").unwrap_err();
    assert!(matches!(err, DecisionError::Validation(_)));
    assert_eq!(err.to_string(), "decision text is required");
}
