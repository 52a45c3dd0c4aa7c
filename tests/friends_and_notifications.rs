//! End-to-end flows for friend requests, friendships, the notification log,
//! and the profile directory

use std::sync::Arc;

use matchboard::db::friends::CreateFriendRequestInput;
use matchboard::db::notifications::EmitNotificationInput;
use matchboard::db::profiles::{ProfileQuery, UpsertProfileInput};
use matchboard::db::Db;
use matchboard::services::FriendStatus;
use matchboard::{Config, MatchError, Services};

fn setup() -> (Arc<Db>, Services) {
    let db = Arc::new(Db::open_in_memory().expect("open in-memory db"));
    let services = Services::new(db.clone(), &Config::default());
    (db, services)
}

fn friend_request(
    services: &Services,
    from: &str,
    to: &str,
) -> Result<matchboard::db::FriendRequest, MatchError> {
    services.friend.send_request(CreateFriendRequestInput {
        from_user_id: from.to_string(),
        to_user_id: to.to_string(),
        message: Some("Let's connect".to_string()),
    })
}

// ============================================================================
// Friend Requests
// ============================================================================

#[test]
fn friend_request_roundtrip_produces_one_friendship() {
    let (_db, services) = setup();

    let request = friend_request(&services, "xavier", "yara").expect("send");
    assert_eq!(request.status, "pending");
    assert_eq!(
        services.friend.friend_status("xavier", "yara").expect("status"),
        FriendStatus::Pending
    );

    let inbox = services
        .friend
        .pending_requests_for("yara")
        .expect("pending requests");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].from_user_id, "xavier");

    let resolution = services
        .friend
        .respond(&request.id, "yara", "accepted")
        .expect("accept");
    assert_eq!(resolution.status, "accepted");

    assert_eq!(
        services.friend.friend_status("xavier", "yara").expect("status"),
        FriendStatus::Friends
    );
    let friendships = services.friend.friendships_of("xavier").expect("list");
    assert_eq!(friendships.len(), 1);
    assert_eq!(friendships[0].other("xavier"), "yara");

    // A fresh request between the now-friends pair is a conflict, from
    // either side
    assert!(matches!(
        friend_request(&services, "xavier", "yara"),
        Err(MatchError::AlreadyFriends)
    ));
    assert!(matches!(
        friend_request(&services, "yara", "xavier"),
        Err(MatchError::AlreadyFriends)
    ));
}

#[test]
fn pending_request_dedup_is_bidirectional() {
    let (_db, services) = setup();

    friend_request(&services, "yara", "xavier").expect("send");

    // The reverse direction counts as the same pending pair
    assert!(matches!(
        friend_request(&services, "xavier", "yara"),
        Err(MatchError::DuplicatePending(_))
    ));
    assert!(matches!(
        friend_request(&services, "yara", "xavier"),
        Err(MatchError::DuplicatePending(_))
    ));
}

#[test]
fn self_friend_request_is_invalid() {
    let (_db, services) = setup();
    assert!(matches!(
        friend_request(&services, "xavier", "xavier"),
        Err(MatchError::SelfReference)
    ));
}

#[test]
fn only_the_addressed_user_may_respond() {
    let (_db, services) = setup();
    let request = friend_request(&services, "xavier", "yara").expect("send");

    // Not even the sender
    assert!(matches!(
        services.friend.respond(&request.id, "xavier", "accepted"),
        Err(MatchError::Forbidden(_))
    ));
    assert!(matches!(
        services.friend.respond(&request.id, "zed", "declined"),
        Err(MatchError::Forbidden(_))
    ));
}

#[test]
fn second_response_is_a_conflict() {
    let (_db, services) = setup();
    let request = friend_request(&services, "xavier", "yara").expect("send");

    services
        .friend
        .respond(&request.id, "yara", "declined")
        .expect("decline");

    assert!(matches!(
        services.friend.respond(&request.id, "yara", "accepted"),
        Err(MatchError::AlreadyResolved(_))
    ));
    assert_eq!(
        services.friend.friend_status("xavier", "yara").expect("status"),
        FriendStatus::None
    );

    // Declined settles the pair; a new request may start over
    friend_request(&services, "yara", "xavier").expect("fresh request after decline");
}

#[test]
fn unfriend_removes_the_edge_for_either_member() {
    let (_db, services) = setup();
    let request = friend_request(&services, "xavier", "yara").expect("send");
    services
        .friend
        .respond(&request.id, "yara", "accepted")
        .expect("accept");

    services
        .friend
        .remove_friendship("yara", "xavier")
        .expect("unfriend");
    assert_eq!(
        services.friend.friend_status("xavier", "yara").expect("status"),
        FriendStatus::None
    );

    assert!(matches!(
        services.friend.remove_friendship("xavier", "yara"),
        Err(MatchError::NotFound(_))
    ));

    // The pair can start over
    friend_request(&services, "xavier", "yara").expect("new request after unfriend");
}

// ============================================================================
// Notification Correlation
// ============================================================================

#[test]
fn request_creation_notifies_the_responder() {
    let (_db, services) = setup();
    let request = friend_request(&services, "xavier", "yara").expect("send");

    let notifications = services.notification.list_for("yara").expect("list");
    assert_eq!(notifications.len(), 1);
    let entry = &notifications[0];
    assert_eq!(entry.notif_type, "request");
    assert_eq!(entry.related_kind.as_deref(), Some("request"));
    assert_eq!(entry.related_id.as_deref(), Some(request.id.as_str()));
    assert_eq!(entry.is_read, 0);

    // The sender gets nothing
    assert!(services
        .notification
        .list_for("xavier")
        .expect("list")
        .is_empty());
}

#[test]
fn responding_marks_the_correlated_notification_read() {
    let (_db, services) = setup();
    let request = friend_request(&services, "xavier", "yara").expect("send");

    services
        .friend
        .respond(&request.id, "yara", "accepted")
        .expect("accept");

    let notifications = services.notification.list_for("yara").expect("list");
    let entry = notifications
        .iter()
        .find(|n| n.related_id.as_deref() == Some(request.id.as_str()))
        .expect("correlated entry");
    assert_eq!(entry.is_read, 1);

    assert_eq!(services.notification.unread_count("yara").expect("count"), 0);
}

#[test]
fn mark_read_is_idempotent_and_recipient_only() {
    let (_db, services) = setup();

    let notification = services
        .notification
        .emit(EmitNotificationInput {
            recipient_id: "yara".to_string(),
            notif_type: "request".to_string(),
            title: "Friend Request".to_string(),
            message: "xavier sent you a friend request.".to_string(),
            link: None,
            related_kind: None,
            related_id: None,
        })
        .expect("emit");
    assert_eq!(notification.is_read, 0);

    // Someone else cannot flip it
    assert!(matches!(
        services.notification.mark_read(&notification.id, "xavier"),
        Err(MatchError::Forbidden(_))
    ));

    let first = services
        .notification
        .mark_read(&notification.id, "yara")
        .expect("first read");
    assert_eq!(first.is_read, 1);

    // Second flip is a quiet no-op, same final state
    let second = services
        .notification
        .mark_read(&notification.id, "yara")
        .expect("second read");
    assert_eq!(second.is_read, 1);

    assert!(matches!(
        services.notification.mark_read("missing", "yara"),
        Err(MatchError::NotFound(_))
    ));
}

#[test]
fn notifications_list_newest_first() {
    let (_db, services) = setup();

    for other in ["a", "b", "c"] {
        friend_request(&services, other, "yara").expect("send");
    }

    let notifications = services.notification.list_for("yara").expect("list");
    assert_eq!(notifications.len(), 3);
    let timestamps: Vec<&String> = notifications.iter().map(|n| &n.timestamp).collect();
    let sorted = {
        let mut t = timestamps.clone();
        t.sort_by(|a, b| b.cmp(a));
        t
    };
    assert_eq!(timestamps, sorted);

    assert_eq!(services.notification.unread_count("yara").expect("count"), 3);
}

// ============================================================================
// Profiles
// ============================================================================

#[test]
fn profile_upsert_and_directory_filters() {
    let (_db, services) = setup();

    services
        .profile
        .upsert(
            "alice",
            UpsertProfileInput {
                display_name: Some("Alice Kim".to_string()),
                college: Some("Engineering".to_string()),
                major: Some("Computer Science".to_string()),
                primary_role: Some("frontend".to_string()),
                ..Default::default()
            },
        )
        .expect("create profile");

    services
        .profile
        .upsert(
            "bob",
            UpsertProfileInput {
                display_name: Some("Bob Lee".to_string()),
                college: Some("Design".to_string()),
                major: Some("Visual Design".to_string()),
                primary_role: Some("designer".to_string()),
                ..Default::default()
            },
        )
        .expect("create profile");

    // Partial update keeps the other fields
    let updated = services
        .profile
        .upsert(
            "alice",
            UpsertProfileInput {
                bio: Some("Rustacean".to_string()),
                ..Default::default()
            },
        )
        .expect("update profile");
    assert_eq!(updated.display_name.as_deref(), Some("Alice Kim"));
    assert_eq!(updated.bio.as_deref(), Some("Rustacean"));

    let engineers = services
        .profile
        .list(&ProfileQuery {
            college: Some("Engineering".to_string()),
            ..Default::default()
        })
        .expect("filter by college");
    assert_eq!(engineers.len(), 1);
    assert_eq!(engineers[0].user_id, "alice");

    let cs = services
        .profile
        .list(&ProfileQuery {
            major: Some("Science".to_string()),
            ..Default::default()
        })
        .expect("substring major filter");
    assert_eq!(cs.len(), 1);

    assert!(matches!(
        services.profile.get("nobody"),
        Err(MatchError::NotFound(_))
    ));
}

#[test]
fn notification_text_uses_display_names() {
    let (_db, services) = setup();

    services
        .profile
        .upsert(
            "xavier",
            UpsertProfileInput {
                display_name: Some("Xavier Chen".to_string()),
                ..Default::default()
            },
        )
        .expect("create profile");

    friend_request(&services, "xavier", "yara").expect("send");

    let notifications = services.notification.list_for("yara").expect("list");
    assert!(notifications[0].message.contains("Xavier Chen"));

    // Without a profile the raw id is used
    friend_request(&services, "zed", "yara").expect("send");
    let notifications = services.notification.list_for("yara").expect("list");
    assert!(notifications.iter().any(|n| n.message.contains("zed")));
}
