use crate::integration::{connect_call, paired_peers};
use crate::utils::pump;
use tandem_client::{CallEvent, Phase, TransportEvent};

#[tokio::test]
async fn hang_up_closes_endpoint_and_discards_session() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let endpoint = a.endpoint();
    a.client.hang_up().await;

    assert!(endpoint.is_closed());
    assert_eq!(a.client.phase_of(&b.id), None);
    assert_eq!(a.client.remote_id(), None);

    let events = a.drain_events();
    assert!(
        events.iter().any(|e| matches!(e, CallEvent::CallClosed { id } if id == &b.id))
    );
}

#[tokio::test]
async fn hang_up_is_idempotent_from_any_state() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;

    // From idle (no call at all).
    a.client.hang_up().await;
    a.client.hang_up().await;

    // From mid-negotiation.
    connect_call(&mut a, &mut b).await;
    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;
    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Renegotiating));

    a.client.hang_up().await;
    a.drain_events();
    a.client.hang_up().await;

    assert_eq!(a.client.phase_of(&b.id), None);
    // The second hang-up produced no further events.
    assert!(a.drain_events().is_empty());
}

#[tokio::test]
async fn transport_callback_after_close_is_a_noop() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let endpoint = a.endpoint();
    let offers_before = endpoint.offers_created();

    a.client.hang_up().await;

    // A renegotiation trigger still in flight must not resurrect anything.
    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;

    assert_eq!(endpoint.offers_created(), offers_before);
    assert_eq!(a.client.phase_of(&b.id), None);
}

#[tokio::test]
async fn signals_for_a_hung_up_session_are_dropped() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    a.client.hang_up().await;

    // b, unaware, renegotiates; a must drop the offer without effect.
    b.client
        .handle_transport_event(a.id.clone(), TransportEvent::NegotiationNeeded)
        .await;
    pump(&mut a, &mut b).await;

    assert_eq!(a.client.phase_of(&b.id), None);
    assert!(a.drain_events().iter().all(|e| !matches!(e, CallEvent::RemoteStream { .. })));
}

#[tokio::test]
async fn peer_departure_tears_the_session_down() {
    let (loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let b_endpoint = b.endpoint();

    // a's socket drops; the relay notifies b.
    loopback.relay.disconnect(a.id.clone()).await;
    pump(&mut a, &mut b).await;

    assert!(b_endpoint.is_closed());
    assert_eq!(b.client.phase_of(&a.id), None);
    assert_eq!(b.client.remote_id(), None);

    let events = b.drain_events();
    assert!(
        events.iter().any(|e| matches!(e, CallEvent::PeerLeft { id } if id == &a.id)),
        "expected peer-left, got {events:?}"
    );
}
