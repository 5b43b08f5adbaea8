use chattr_core::{ChangeAction, CursorTracker, Message, MessageStore, RecordId};
use std::sync::{Arc, Mutex};

fn open_feed(count: usize) -> (tempfile::TempDir, MessageStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = MessageStore::open(dir.path().join("messages.json")).unwrap();
    for index in 1..=count {
        store
            .add("ben", &format!("message {index}"), Vec::new(), None)
            .unwrap();
    }
    (dir, store)
}

fn ids(messages: &[Message]) -> Vec<RecordId> {
    messages.iter().map(|message| message.id).collect()
}

#[test]
fn first_read_bootstraps_then_only_new_messages_arrive() {
    let (_dir, feed) = open_feed(25);
    let cursors = CursorTracker::new();

    let first = cursors.read(&feed, "claude", 0, 20);
    assert_eq!(ids(&first), (6..=25).collect::<Vec<_>>());
    assert_eq!(cursors.cursor("claude"), 25);

    let nothing_new = cursors.read(&feed, "claude", 0, 20);
    assert!(nothing_new.is_empty());
    assert_eq!(cursors.cursor("claude"), 25);

    let added = feed.add("codex", "fresh", Vec::new(), None).unwrap();
    let next = cursors.read(&feed, "claude", 0, 20);
    assert_eq!(ids(&next), vec![added.id]);
    assert_eq!(next[0].text, "fresh");
    assert_eq!(cursors.cursor("claude"), 26);
}

#[test]
fn consumers_have_independent_cursors() {
    let (_dir, feed) = open_feed(3);
    let cursors = CursorTracker::new();

    cursors.read(&feed, "claude", 0, 20);
    feed.add("ben", "for everyone", Vec::new(), None).unwrap();

    assert_eq!(ids(&cursors.read(&feed, "claude", 0, 20)), vec![4]);
    assert_eq!(ids(&cursors.read(&feed, "codex", 0, 20)), vec![1, 2, 3, 4]);
    assert_eq!(cursors.cursor("gemini"), 0);
}

#[test]
fn backlog_larger_than_limit_keeps_newest() {
    let (_dir, feed) = open_feed(2);
    let cursors = CursorTracker::new();
    cursors.read(&feed, "codex", 0, 20);

    for index in 0..10 {
        feed.add("ben", &format!("burst {index}"), Vec::new(), None).unwrap();
    }

    let page = cursors.read(&feed, "codex", 0, 4);
    assert_eq!(ids(&page), vec![9, 10, 11, 12]);
    assert_eq!(cursors.cursor("codex"), 12);
}

#[test]
fn resync_returns_latest_and_overrides_cursor() {
    let (_dir, feed) = open_feed(12);
    let cursors = CursorTracker::new();

    let page = cursors.resync(&feed, "gemini", 5).unwrap();
    assert_eq!(ids(&page), vec![8, 9, 10, 11, 12]);
    assert_eq!(cursors.cursor("gemini"), 12);

    // Cursor ahead of anything in the feed is still reset.
    let stale = [Message {
        id: 500,
        ..feed.get_by_id(1).unwrap()
    }];
    assert!(cursors.advance("gemini", &stale));
    assert_eq!(cursors.cursor("gemini"), 500);

    let page = cursors.resync(&feed, "gemini", 5).unwrap();
    assert_eq!(ids(&page), vec![8, 9, 10, 11, 12]);
    assert_eq!(cursors.cursor("gemini"), 12);
}

#[test]
fn advance_ignores_empty_reads() {
    let cursors = CursorTracker::new();
    let (_dir, feed) = open_feed(1);
    cursors.read(&feed, "claude", 0, 20);

    assert!(!cursors.advance::<Message>("claude", &[]));
    assert_eq!(cursors.cursor("claude"), 1);
}

#[test]
fn since_id_zero_means_not_supplied() {
    let (_dir, feed) = open_feed(5);
    let cursors = CursorTracker::new();

    cursors.read(&feed, "codex", 3, 20);
    assert_eq!(cursors.cursor("codex"), 5);

    feed.add("ben", "six", Vec::new(), None).unwrap();
    assert_eq!(ids(&cursors.read(&feed, "codex", 0, 20)), vec![6]);
}

#[test]
fn get_since_and_get_recent_follow_id_order() {
    let (_dir, feed) = open_feed(6);

    assert_eq!(ids(&feed.get_since(4)), vec![5, 6]);
    assert!(feed.get_since(6).is_empty());
    assert_eq!(ids(&feed.get_recent(3)), vec![4, 5, 6]);
    assert_eq!(ids(&feed.get_recent(100)), (1..=6).collect::<Vec<_>>());
    assert_eq!(feed.get_by_id(3).unwrap().text, "message 3");
    assert!(feed.get_by_id(0).is_none());
}

#[test]
fn add_and_reaction_toggle_notify_observers() {
    let (_dir, feed) = open_feed(0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    feed.on_change(move |action, message| {
        sink.lock().unwrap().push((action, message.id));
    });

    let message = feed.add("claude", "react to me", Vec::new(), None).unwrap();
    let reactions = feed.toggle_reaction(message.id, "👍", "alice").unwrap().unwrap();
    assert_eq!(reactions["👍"], vec!["alice"]);
    let reactions = feed.toggle_reaction(message.id, "👍", "alice").unwrap().unwrap();
    assert!(reactions.is_empty());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (ChangeAction::Add, 1),
            (ChangeAction::Edit, 1),
            (ChangeAction::Edit, 1),
        ]
    );
}

#[test]
fn message_ids_increase_under_concurrent_appends() {
    let (_dir, feed) = open_feed(0);
    let feed = Arc::new(feed);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let feed = Arc::clone(&feed);
            std::thread::spawn(move || {
                let mut last = 0;
                for index in 0..15 {
                    let message = feed
                        .add(&format!("agent{worker}"), &format!("{index}"), Vec::new(), None)
                        .unwrap();
                    assert!(message.id > last);
                    last = message.id;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = feed.list_all();
    assert_eq!(ids(&all), (1..=60).collect::<Vec<_>>());
}
