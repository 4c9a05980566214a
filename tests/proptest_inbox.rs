use chrono::{DateTime, TimeZone, Utc};
use idea_portal::{
    Aggregate, Inbox, InboxCommand, NewNotification, NotificationId, NotificationKind,
    NotificationStatus, Projection, UnreadCount, UserId,
};
use proptest::prelude::*;
use proptest::test_runner::Config;

#[derive(Debug, Clone)]
enum Op {
    /// One entry per record; `true` means already read.
    Load(Vec<bool>),
    /// Index into the current set; past the end is an unknown id.
    MarkRead(usize),
    MarkAllRead,
    Add(bool),
    Clear,
    Discard,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(any::<bool>(), 0..6).prop_map(Op::Load),
        (0_usize..8).prop_map(Op::MarkRead),
        Just(Op::MarkAllRead),
        any::<bool>().prop_map(Op::Add),
        Just(Op::Clear),
        Just(Op::Discard),
    ]
}

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn record(read: bool) -> NewNotification {
    let n = NewNotification::new(UserId(1), NotificationKind::Other, "generated", created_at());
    if read { n.read() } else { n }
}

fn command(inbox: &Inbox, op: &Op) -> InboxCommand {
    match op {
        Op::Load(flags) => InboxCommand::Load {
            user_id: UserId(1),
            notifications: flags.iter().map(|&read| record(read)).collect(),
        },
        Op::MarkRead(index) => InboxCommand::MarkRead {
            id: inbox
                .notifications
                .get(*index)
                .map_or(NotificationId(u64::MAX), |n| n.id),
        },
        Op::MarkAllRead => InboxCommand::MarkAllRead,
        Op::Add(read) => InboxCommand::Add {
            notification: record(*read),
        },
        Op::Clear => InboxCommand::Clear,
        Op::Discard => InboxCommand::Discard,
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn unread_count_tracks_every_command_sequence(
        ops in prop::collection::vec(op(), 0..40)
    ) {
        let mut inbox = Inbox::default();
        for op in &ops {
            let before = inbox.clone();
            match inbox.handle(command(&inbox, op)) {
                Ok(events) => inbox = events.iter().fold(inbox, |state, e| state.apply(e)),
                Err(_) => prop_assert!(matches!(op, Op::MarkRead(i) if *i >= before.len())),
            }

            let unread = inbox
                .notifications
                .iter()
                .filter(|n| n.status == NotificationStatus::Unread)
                .count();
            prop_assert_eq!(inbox.unread_count(), unread);
            prop_assert_eq!(UnreadCount::project(&inbox), UnreadCount(unread));

            let mut ids: Vec<_> = inbox.notifications.iter().map(|n| n.id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), inbox.len());

            match op {
                Op::Add(_) => {
                    prop_assert_eq!(inbox.len(), before.len() + 1);
                    prop_assert!(inbox.notifications[0].id.0 > before.last_id);
                }
                Op::MarkAllRead | Op::Clear | Op::Discard => {
                    prop_assert_eq!(inbox.unread_count(), 0);
                }
                Op::MarkRead(_) => prop_assert_eq!(inbox.len(), before.len()),
                Op::Load(flags) => prop_assert_eq!(inbox.len(), flags.len()),
            }
        }
    }
}
