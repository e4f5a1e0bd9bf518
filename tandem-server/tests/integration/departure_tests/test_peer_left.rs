use tandem_core::{ClientSignal, ParticipantId, ServerSignal};

use crate::integration::{create_relay, init_tracing, join};

#[tokio::test]
async fn explicit_leave_notifies_remaining_peer() {
    init_tracing();

    let (relay, mock, directory) = create_relay();
    let a = ParticipantId::new();
    let b = ParticipantId::new();
    join(&relay, &a, "42").await;
    join(&relay, &b, "42").await;
    mock.clear().await;

    relay.handle(b.clone(), ClientSignal::Leave {}).await;

    assert_eq!(
        mock.signals_for(&a).await,
        vec![ServerSignal::PeerLeft { id: b.clone() }]
    );
    assert_eq!(directory.member_count("42"), 1);
}

#[tokio::test]
async fn disconnect_behaves_like_leave() {
    init_tracing();

    let (relay, mock, directory) = create_relay();
    let a = ParticipantId::new();
    let b = ParticipantId::new();
    join(&relay, &a, "42").await;
    join(&relay, &b, "42").await;
    mock.clear().await;

    relay.disconnect(a.clone()).await;

    assert_eq!(
        mock.signals_for(&b).await,
        vec![ServerSignal::PeerLeft { id: a.clone() }]
    );

    relay.disconnect(b).await;
    assert_eq!(directory.room_count(), 0);
}

#[tokio::test]
async fn disconnect_without_room_is_silent() {
    init_tracing();

    let (relay, mock, _) = create_relay();
    relay.disconnect(ParticipantId::new()).await;
    assert_eq!(mock.total_delivered().await, 0);
}
